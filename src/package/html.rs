//! Regex readers for the HTML documents in a package.
//!
//! Wiki pages and assignment bodies are HTML rather than XML, so they are
//! read with a few anchored patterns instead of the XML reader.

use std::sync::OnceLock;

use regex::Regex;

const TITLE_PATTERN: &str = r"(?is)<title>(.*?)</title>";
const META_PATTERN: &str = r#"(?i)<meta\s+name="([^"]*)"\s+content="([^"]*)"\s*/?>"#;
const BODY_PATTERN: &str = r"(?is)<body[^>]*>\n?(.*?)\n?</body>";

fn unescape(raw: &str) -> String {
    quick_xml::escape::unescape(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Unescaped `<title>` text
pub fn title(html: &str) -> Option<String> {
    static TITLE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = TITLE_REGEX.get_or_init(|| Regex::new(TITLE_PATTERN).expect("valid title regex"));

    regex
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| unescape(m.as_str().trim()))
}

/// Unescaped `content` of the first `<meta name=...>` with a given name
pub fn meta(html: &str, name: &str) -> Option<String> {
    static META_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = META_REGEX.get_or_init(|| Regex::new(META_PATTERN).expect("valid meta regex"));

    regex
        .captures_iter(html)
        .find(|c| c.get(1).map(|m| m.as_str()) == Some(name))
        .and_then(|c| c.get(2))
        .map(|m| unescape(m.as_str()))
}

/// Raw markup between `<body>` and `</body>`, minus the framing newlines
pub fn body(html: &str) -> Option<String> {
    static BODY_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = BODY_REGEX.get_or_init(|| Regex::new(BODY_PATTERN).expect("valid body regex"));

    regex
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html>
<head>
<meta http-equiv="Content-Type" content="text/html; charset=utf-8"/>
<title>Fish &amp; Chips</title>
<meta name="identifier" content="gres"/>
<meta name="workflow_state" content="unpublished"/>
</head>
<body>
<p>hi</p>
<p>there</p>
</body>
</html>
"#;

    #[test]
    fn test_title_is_unescaped() {
        assert_eq!(title(PAGE).as_deref(), Some("Fish & Chips"));
        assert_eq!(title("<html></html>"), None);
    }

    #[test]
    fn test_meta_by_name() {
        assert_eq!(meta(PAGE, "identifier").as_deref(), Some("gres"));
        assert_eq!(meta(PAGE, "workflow_state").as_deref(), Some("unpublished"));
        assert_eq!(meta(PAGE, "page_identifier"), None);
    }

    #[test]
    fn test_body_strips_framing_newlines_only() {
        assert_eq!(body(PAGE).as_deref(), Some("<p>hi</p>\n<p>there</p>"));
        assert_eq!(body("<body>\n\n</body>").as_deref(), Some(""));
        assert_eq!(body("<body>\nx\n\n</body>").as_deref(), Some("x\n"));
    }
}
