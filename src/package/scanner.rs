//! Walk a package directory and classify every file.
//!
//! Classification goes by top-level directory first, then file name, then
//! (for XML) the root element. A document that fails to parse is still
//! indexed under a generic kind with its file stem as title, so one broken
//! file never aborts a scan.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use crate::config::paths;
use crate::core::error::{CartridgeError, Result};

use super::html;
use super::index::{Component, ComponentIndex, ComponentKind};
use super::templates::LEARNING_MODULES;
use super::xml::Element;

/// Top-level directories whose files get a per-directory kind
const CONTENT_DIRS: [(&str, ComponentKind); 6] = [
    (paths::WEB_RESOURCES_DIR, ComponentKind::WebResourceFile),
    (paths::ASSIGNMENTS_DIR, ComponentKind::AssignmentsDirFile),
    (paths::QUIZZES_DIR, ComponentKind::QuizzesDirFile),
    (paths::FILES_DIR, ComponentKind::FilesDirFile),
    (paths::MEDIA_DIR, ComponentKind::MediaFile),
    (paths::EXTERNAL_TOOLS_DIR, ComponentKind::ExternalToolFile),
];

/// A file read from the package
struct SourceFile {
    relative: String,
    digest: String,
    text: Option<String>,
}

impl SourceFile {
    fn file_name(&self) -> &str {
        self.relative.rsplit('/').next().unwrap_or(&self.relative)
    }

    fn stem(&self) -> &str {
        let name = self.file_name();
        name.split('.').next().filter(|s| !s.is_empty()).unwrap_or(name)
    }

    fn extension(&self) -> Option<&str> {
        self.file_name().rsplit_once('.').map(|(_, ext)| ext)
    }

    fn row(&self, kind: ComponentKind) -> Component {
        let mut component = Component::new(kind, self.relative.clone(), self.digest.clone());
        if self.is_markup() {
            component.markup = self.text.clone();
        }
        component
    }

    /// Row titled after the file stem
    fn plain_row(&self, kind: ComponentKind) -> Component {
        Component {
            title: Some(self.stem().to_string()),
            ..self.row(kind)
        }
    }

    fn is_markup(&self) -> bool {
        matches!(self.extension(), Some("xml" | "html" | "htm" | "qti"))
    }

    /// Parse the file as XML, logging and returning `None` on failure
    fn parse(&self) -> Option<Element> {
        let text = self.text.as_deref()?;
        match Element::parse(text, &self.relative) {
            Ok(root) => Some(root),
            Err(e) => {
                warn!(path = %self.relative, error = %e, "Unparsable XML, indexing as generic file");
                None
            }
        }
    }
}

/// Scan a package directory into a component index
#[instrument(skip_all, fields(root = %root.display()))]
pub fn scan(root: &Path) -> Result<ComponentIndex> {
    if !root.join(paths::MANIFEST_FILE).is_file() {
        return Err(CartridgeError::InvalidPackage {
            path: root.to_path_buf(),
            reason: format!("missing {}", paths::MANIFEST_FILE),
        });
    }

    let mut components = Vec::new();
    for file in walk(root)? {
        classify(&file, &mut components);
    }

    debug!(rows = components.len(), "Scanned package");
    Ok(ComponentIndex::new(root.to_path_buf(), components))
}

/// Every regular file under `root`, sorted by relative path
fn walk(root: &Path) -> Result<Vec<SourceFile>> {
    let pattern = format!(
        "{}/**/*",
        glob::Pattern::escape(&root.to_string_lossy())
    );
    let entries = glob::glob(&pattern).map_err(|e| CartridgeError::InvalidPackage {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut found: Vec<PathBuf> = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => found.push(path),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Skipping unreadable path"),
        }
    }
    found.sort();

    let mut files = Vec::with_capacity(found.len());
    for path in found {
        let Ok(stripped) = path.strip_prefix(root) else {
            continue;
        };
        let relative = stripped
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let bytes = std::fs::read(&path).map_err(CartridgeError::io(&path))?;
        let digest = hex::encode(Sha256::digest(&bytes));
        let text = String::from_utf8(bytes).ok();
        files.push(SourceFile {
            relative,
            digest,
            text,
        });
    }

    Ok(files)
}

fn classify(file: &SourceFile, out: &mut Vec<Component>) {
    if file.relative == paths::MANIFEST_FILE {
        classify_manifest(file, out);
        return;
    }

    let Some(top) = paths::top_dir(&file.relative) else {
        classify_root_file(file, out);
        return;
    };

    match top {
        paths::COURSE_SETTINGS_DIR => classify_course_settings(file, out),
        paths::WIKI_CONTENT_DIR => out.push(classify_wiki(file)),
        paths::DISCUSSIONS_DIR => {
            if file.extension() == Some("xml") {
                out.push(classify_discussion_xml(file));
            } else {
                out.push(file.plain_row(ComponentKind::DiscussionsFile));
            }
        }
        paths::NON_CC_ASSESSMENTS_DIR => out.push(classify_qti(file)),
        _ => {
            if let Some((_, kind)) = CONTENT_DIRS.iter().find(|(dir, _)| *dir == top) {
                let mut row = file.row(*kind);
                row.title = Some(file.file_name().to_string());
                out.push(row);
            } else {
                out.push(classify_identifier_dir(file, top));
            }
        }
    }
}

fn classify_root_file(file: &SourceFile, out: &mut Vec<Component>) {
    if file.extension() == Some("xml") {
        out.push(classify_discussion_xml(file));
    } else {
        out.push(file.plain_row(ComponentKind::OtherFile));
    }
}

fn classify_manifest(file: &SourceFile, out: &mut Vec<Component>) {
    let mut manifest = file.row(ComponentKind::Manifest);
    let Some(root) = file.parse() else {
        manifest.title = Some(file.stem().to_string());
        out.push(manifest);
        return;
    };

    manifest.identifier = root.attr("identifier").map(str::to_string);
    manifest.title = root
        .find("general")
        .and_then(|g| g.find("string"))
        .map(|s| s.text.trim().to_string());
    out.push(manifest);

    // Organization tree: modules under LearningModules, items under modules
    let learning_modules = root
        .descendants("item")
        .into_iter()
        .find(|i| i.attr("identifier") == Some(LEARNING_MODULES));
    if let Some(learning_modules) = learning_modules {
        for (m, module) in learning_modules.children_named("item").enumerate() {
            let module_id = module.attr("identifier").map(str::to_string);
            out.push(Component {
                identifier: module_id.clone(),
                title: module.child_text("title").map(str::to_string),
                position: Some(m + 1),
                ..Component::new(ComponentKind::ModuleOrg, file.relative.clone(), file.digest.clone())
            });

            for (i, item) in module.children_named("item").enumerate() {
                out.push(Component {
                    identifier: item.attr("identifier").map(str::to_string),
                    title: item.child_text("title").map(str::to_string),
                    identifierref: item.attr("identifierref").map(str::to_string),
                    position: Some(i + 1),
                    parent: module_id.clone(),
                    ..Component::new(
                        ComponentKind::ModuleItemOrg,
                        file.relative.clone(),
                        file.digest.clone(),
                    )
                });
            }
        }
    }

    for resource in root.descendants("resource") {
        out.push(Component {
            identifier: resource.attr("identifier").map(str::to_string),
            href: resource.attr("href").map(str::to_string),
            resource_type: resource.attr("type").map(str::to_string),
            dependency: resource
                .child("dependency")
                .and_then(|d| d.attr("identifierref"))
                .map(str::to_string),
            ..Component::new(ComponentKind::Resource, file.relative.clone(), file.digest.clone())
        });
    }
}

fn classify_course_settings(file: &SourceFile, out: &mut Vec<Component>) {
    let kind = ComponentKind::for_course_settings(file.file_name());
    let mut row = file.row(kind);

    if file.extension() != Some("xml") {
        row.title = Some(file.stem().to_string());
        out.push(row);
        return;
    }

    let Some(root) = file.parse() else {
        out.push(file.plain_row(ComponentKind::CourseSettingsFile));
        return;
    };

    row.identifier = root.attr("identifier").map(str::to_string);
    row.title = root
        .child_text("title")
        .map(str::to_string)
        .or_else(|| Some(file.stem().to_string()));
    out.push(row);

    if kind == ComponentKind::AssignmentGroups {
        for group in root.children_named("assignmentGroup") {
            out.push(Component {
                identifier: group.attr("identifier").map(str::to_string),
                title: group.child_text("title").map(str::to_string),
                ..file.row(ComponentKind::AssignmentGroups)
            });
        }
    }

    if kind == ComponentKind::ModuleMeta {
        for module in root.children_named("module") {
            let module_id = module.attr("identifier").map(str::to_string);
            out.push(Component {
                identifier: module_id.clone(),
                title: module.child_text("title").map(str::to_string),
                workflow_state: module.child_text("workflow_state").map(str::to_string),
                position: module.child_text("position").and_then(|p| p.parse().ok()),
                markup: None,
                ..file.row(ComponentKind::Module)
            });

            let items = module.child("items").map(|i| i.children_named("item"));
            for item in items.into_iter().flatten() {
                out.push(Component {
                    identifier: item.attr("identifier").map(str::to_string),
                    title: item.child_text("title").map(str::to_string),
                    workflow_state: item.child_text("workflow_state").map(str::to_string),
                    position: item.child_text("position").and_then(|p| p.parse().ok()),
                    content_type: item.child_text("content_type").map(str::to_string),
                    identifierref: item.child_text("identifierref").map(str::to_string),
                    parent: module_id.clone(),
                    markup: None,
                    ..file.row(ComponentKind::ModuleItem)
                });
            }
        }
    }
}

fn classify_wiki(file: &SourceFile) -> Component {
    if !matches!(file.extension(), Some("html" | "htm")) {
        return file.plain_row(ComponentKind::WikiContentFile);
    }

    let text = file.text.as_deref().unwrap_or_default();
    Component {
        identifier: html::meta(text, "identifier"),
        title: html::title(text).or_else(|| Some(file.stem().to_string())),
        workflow_state: html::meta(text, "workflow_state"),
        href: Some(file.relative.clone()),
        ..file.row(ComponentKind::WikiPage)
    }
}

/// Discussion topic, topic meta or unknown XML, by root element
fn classify_discussion_xml(file: &SourceFile) -> Component {
    let Some(root) = file.parse() else {
        return file.plain_row(ComponentKind::UnknownXml);
    };

    match root.name.as_str() {
        "topic" => Component {
            identifier: Some(file.stem().to_string()),
            title: root.child_text("title").map(str::to_string),
            href: Some(file.relative.clone()),
            ..file.row(ComponentKind::DiscussionTopic)
        },
        "topicMeta" => Component {
            identifier: root.attr("identifier").map(str::to_string),
            title: root.child_text("title").map(str::to_string),
            workflow_state: root.child_text("workflow_state").map(str::to_string),
            identifierref: root.child_text("topic_id").map(str::to_string),
            href: Some(file.relative.clone()),
            ..file.row(ComponentKind::DiscussionTopicMeta)
        },
        _ => Component {
            identifier: root.attr("identifier").map(str::to_string),
            title: Some(file.stem().to_string()),
            ..file.row(ComponentKind::UnknownXml)
        },
    }
}

fn classify_qti(file: &SourceFile) -> Component {
    let assessment = file.parse().and_then(|root| root.find("assessment").cloned());
    match assessment {
        Some(assessment) => Component {
            identifier: assessment.attr("ident").map(str::to_string),
            title: assessment.attr("title").map(str::to_string),
            ..file.row(ComponentKind::QtiAssessment)
        },
        None => file.plain_row(ComponentKind::QtiAssessment),
    }
}

/// Files under a directory named after a record identifier
fn classify_identifier_dir(file: &SourceFile, dir: &str) -> Component {
    let name = file.file_name();
    let generic = || Component {
        identifier: Some(dir.to_string()),
        ..file.plain_row(ComponentKind::IdentifierDirFile)
    };

    match name {
        paths::ASSIGNMENT_SETTINGS_NAME => match file.parse() {
            Some(root) => Component {
                identifier: root.attr("identifier").map(str::to_string),
                title: root.child_text("title").map(str::to_string),
                workflow_state: root.child_text("workflow_state").map(str::to_string),
                ..file.row(ComponentKind::AssignmentSettings)
            },
            None => generic(),
        },
        paths::ASSESSMENT_META_NAME => match file.parse() {
            Some(root) => Component {
                identifier: root.attr("identifier").map(str::to_string),
                title: root.child_text("title").map(str::to_string),
                workflow_state: root
                    .child("assignment")
                    .and_then(|a| a.child_text("workflow_state"))
                    .map(str::to_string),
                href: Some(file.relative.clone()),
                ..file.row(ComponentKind::AssessmentMeta)
            },
            None => generic(),
        },
        paths::ASSESSMENT_QTI_NAME => match file.parse().and_then(|r| r.find("assessment").cloned()) {
            Some(assessment) => Component {
                identifier: assessment.attr("ident").map(str::to_string),
                title: assessment.attr("title").map(str::to_string),
                href: Some(file.relative.clone()),
                ..file.row(ComponentKind::AssessmentQti)
            },
            None => generic(),
        },
        _ if matches!(file.extension(), Some("html" | "htm")) => {
            let text = file.text.as_deref().unwrap_or_default();
            Component {
                identifier: Some(dir.to_string()),
                title: html::title(text).or_else(|| Some(file.stem().to_string())),
                href: Some(file.relative.clone()),
                ..file.row(ComponentKind::AssignmentContent)
            }
        }
        _ => generic(),
    }
}

/// Markup of the first row at a path, for callers holding only an href
pub fn markup_at<'a>(index: &'a ComponentIndex, path: &str) -> Option<&'a str> {
    index
        .by_path(path)
        .into_iter()
        .find_map(|c| c.markup.as_deref())
}
