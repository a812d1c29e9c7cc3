//! Minimal element tree over quick-xml.
//!
//! Package documents are small, so they are read into a tree of
//! [`Element`]s and queried by local name. Namespace prefixes are dropped
//! from element names; attribute keys are kept as written.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::error::{CartridgeError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Concatenated, unescaped character data directly inside this element
    pub text: String,
}

impl Element {
    /// Parse a document and return its root element
    pub fn parse(source: &str, context: &str) -> Result<Element> {
        let mut reader = Reader::from_str(source);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| CartridgeError::parse(context, e))?;

            match event {
                Event::Start(start) => stack.push(open(&start, context)?),
                Event::Empty(start) => {
                    let element = open(&start, context)?;
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        CartridgeError::parse(context, "closing tag without opening tag")
                    })?;
                    attach(&mut stack, &mut root, element);
                }
                Event::Text(text) => {
                    if let Some(top) = stack.last_mut() {
                        let value = text
                            .unescape()
                            .map_err(|e| CartridgeError::parse(context, e))?;
                        top.text.push_str(&value);
                    }
                }
                Event::CData(data) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }

            if root.is_some() && stack.is_empty() {
                break;
            }
        }

        root.ok_or_else(|| CartridgeError::parse(context, "document has no root element"))
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of a direct child
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim())
    }

    /// Follow a chain of child names
    pub fn path(&self, names: &[&str]) -> Option<&Element> {
        names.iter().try_fold(self, |element, name| element.child(name))
    }

    /// Depth-first search for elements with a given name (self excluded)
    pub fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        collect(self, name, &mut found);
        found
    }

    /// First descendant with a given name
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|c| {
            if c.name == name {
                Some(c)
            } else {
                c.find(name)
            }
        })
    }
}

fn collect<'a>(element: &'a Element, name: &str, found: &mut Vec<&'a Element>) {
    for child in &element.children {
        if child.name == name {
            found.push(child);
        }
        collect(child, name, found);
    }
}

fn open(start: &BytesStart<'_>, context: &str) -> Result<Element> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attrs = Vec::new();

    for attr in start.attributes() {
        let attr = attr.map_err(|e| CartridgeError::parse(context, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| CartridgeError::parse(context, e))?
            .into_owned();
        attrs.push((key, value));
    }

    Ok(Element {
        name,
        attrs,
        children: Vec::new(),
        text: String::new(),
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Local name of the document's root element, if it parses that far
pub fn root_name(source: &str) -> Option<String> {
    let mut reader = Reader::from_str(source);
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) | Ok(Event::Empty(start)) => {
                return Some(String::from_utf8_lossy(start.local_name().as_ref()).into_owned())
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Escape text for element content and attribute values
pub fn escape(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest identifier="m1" xmlns="http://www.imsglobal.org/xsd/imsccv1p1/imscp_v1p1">
  <organizations>
    <organization identifier="org_1">
      <item identifier="LearningModules">
        <item identifier="mod1"><title>Unit &amp; One</title></item>
      </item>
    </organization>
  </organizations>
  <resources>
    <resource identifier="r1" type="webcontent" href="wiki_content/a.html">
      <file href="wiki_content/a.html"/>
    </resource>
  </resources>
</manifest>"#;

    #[test]
    fn test_parse_tree_and_query() {
        let root = Element::parse(SAMPLE, "manifest").unwrap();

        assert_eq!(root.name, "manifest");
        assert_eq!(root.attr("identifier"), Some("m1"));

        let module = root
            .path(&["organizations", "organization", "item", "item"])
            .unwrap();
        assert_eq!(module.attr("identifier"), Some("mod1"));
        assert_eq!(module.child_text("title"), Some("Unit & One"));

        let resources = root.descendants("resource");
        assert_eq!(resources.len(), 1);
        assert_eq!(
            resources[0].find("file").and_then(|f| f.attr("href")),
            Some("wiki_content/a.html")
        );
    }

    #[test]
    fn test_text_keeps_inner_whitespace() {
        let root = Element::parse("<text>  a\n b  </text>", "text").unwrap();
        assert_eq!(root.text, "  a\n b  ");
    }

    #[test]
    fn test_malformed_document_is_parse_failure() {
        let err = Element::parse("<a><b></a>", "broken.xml").unwrap_err();
        assert!(matches!(err, CartridgeError::ParseFailure { .. }));

        let err = Element::parse("just text", "empty.xml").unwrap_err();
        assert!(matches!(err, CartridgeError::ParseFailure { .. }));
    }

    #[test]
    fn test_root_name() {
        assert_eq!(root_name(SAMPLE).as_deref(), Some("manifest"));
        assert_eq!(
            root_name("<dt:topic xmlns:dt=\"x\"/>").as_deref(),
            Some("topic")
        );
        assert_eq!(root_name("not xml at all"), None);
    }

    #[test]
    fn test_escape_round_trips_through_parse() {
        let raw = "<p>Fish & \"chips\"</p>";
        let doc = format!("<text>{}</text>", escape(raw));
        let root = Element::parse(&doc, "text").unwrap();
        assert_eq!(root.text, raw);
    }
}
