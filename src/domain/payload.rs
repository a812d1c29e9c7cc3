//! Typed payload records, one collection per content family.

use serde::{Deserialize, Serialize};

use super::content::{ContentKind, WorkflowState};
use super::ids::Identifier;
use crate::config::paths;

/// Marker appended to the title of cloned records
pub const COPY_MARKER: &str = "(Copy)";

/// Wiki page rendered as a standalone HTML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiPage {
    pub id: Identifier,
    pub resource_id: Identifier,
    pub title: String,
    pub body: String,
    pub state: WorkflowState,
    /// Package-relative path, derived from the title
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Doubles as the assignment's resource id and directory name
    pub id: Identifier,
    pub title: String,
    pub body: String,
    pub points: f64,
    pub state: WorkflowState,
    pub grading_group_id: Identifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    /// Doubles as the primary (assessment) resource id and directory name
    pub id: Identifier,
    pub title: String,
    pub description: String,
    pub points: f64,
    pub state: WorkflowState,
    pub grading_group_id: Identifier,
    pub assignment_id: Identifier,
    pub question_id: Identifier,
    pub assessment_question_id: Identifier,
    /// Dependency resource holding the quiz settings
    pub meta_resource_id: Identifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discussion {
    /// Primary resource id
    pub topic_id: Identifier,
    /// Dependency resource id (topic meta)
    pub meta_id: Identifier,
    pub title: String,
    pub body: String,
    pub state: WorkflowState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAsset {
    pub id: Identifier,
    pub filename: String,
    pub content: Vec<u8>,
    /// Package-relative storage path
    pub path: String,
}

impl FileAsset {
    pub fn storage_path(filename: &str) -> String {
        format!("{}/{}", paths::WEB_RESOURCES_DIR, filename)
    }
}

/// Content to create, before identifiers are allocated
#[derive(Debug, Clone, PartialEq)]
pub enum ContentDraft {
    WikiPage {
        title: String,
        body: String,
        published: bool,
    },
    Assignment {
        title: String,
        body: String,
        points: f64,
        published: bool,
    },
    Quiz {
        title: String,
        description: String,
        points: f64,
        published: bool,
    },
    Discussion {
        title: String,
        body: String,
        published: bool,
    },
    File {
        filename: String,
        content: Vec<u8>,
    },
}

impl ContentDraft {
    pub fn wiki_page(title: impl Into<String>, body: impl Into<String>) -> Self {
        ContentDraft::WikiPage {
            title: title.into(),
            body: body.into(),
            published: true,
        }
    }

    pub fn assignment(title: impl Into<String>, body: impl Into<String>, points: f64) -> Self {
        ContentDraft::Assignment {
            title: title.into(),
            body: body.into(),
            points,
            published: true,
        }
    }

    pub fn quiz(title: impl Into<String>, description: impl Into<String>, points: f64) -> Self {
        ContentDraft::Quiz {
            title: title.into(),
            description: description.into(),
            points,
            published: true,
        }
    }

    pub fn discussion(title: impl Into<String>, body: impl Into<String>) -> Self {
        ContentDraft::Discussion {
            title: title.into(),
            body: body.into(),
            published: true,
        }
    }

    pub fn file(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        ContentDraft::File {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Mark the draft unpublished (files have no publication state)
    pub fn unpublished(mut self) -> Self {
        match &mut self {
            ContentDraft::WikiPage { published, .. }
            | ContentDraft::Assignment { published, .. }
            | ContentDraft::Quiz { published, .. }
            | ContentDraft::Discussion { published, .. } => *published = false,
            ContentDraft::File { .. } => {}
        }
        self
    }

    /// Strip surrounding whitespace from the title (the name, for files)
    pub fn normalized(mut self) -> Self {
        match &mut self {
            ContentDraft::WikiPage { title, .. }
            | ContentDraft::Assignment { title, .. }
            | ContentDraft::Quiz { title, .. }
            | ContentDraft::Discussion { title, .. }
            | ContentDraft::File {
                filename: title, ..
            } => *title = title.trim().to_string(),
        }
        self
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ContentDraft::WikiPage { .. } => ContentKind::WikiPage,
            ContentDraft::Assignment { .. } => ContentKind::Assignment,
            ContentDraft::Quiz { .. } => ContentKind::Quiz,
            ContentDraft::Discussion { .. } => ContentKind::Discussion,
            ContentDraft::File { .. } => ContentKind::File,
        }
    }

    /// Title shown on the module item
    pub fn title(&self) -> &str {
        match self {
            ContentDraft::WikiPage { title, .. }
            | ContentDraft::Assignment { title, .. }
            | ContentDraft::Quiz { title, .. }
            | ContentDraft::Discussion { title, .. } => title,
            ContentDraft::File { filename, .. } => filename,
        }
    }

    pub fn state(&self) -> WorkflowState {
        match self {
            ContentDraft::WikiPage { published, .. }
            | ContentDraft::Assignment { published, .. }
            | ContentDraft::Quiz { published, .. }
            | ContentDraft::Discussion { published, .. } => {
                WorkflowState::from_published(*published)
            }
            ContentDraft::File { .. } => WorkflowState::Published,
        }
    }
}

/// Lowercase slug: alphanumeric runs joined by single hyphens
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        "page".to_string()
    } else {
        slug
    }
}

/// Package-relative wiki filename for a slug, with an optional dedupe suffix
pub fn wiki_filename(slug: &str, suffix: usize) -> String {
    if suffix <= 1 {
        format!("{}/{}.html", paths::WIKI_CONTENT_DIR, slug)
    } else {
        format!("{}/{}-{}.html", paths::WIKI_CONTENT_DIR, slug, suffix)
    }
}

pub fn copy_title(title: &str) -> String {
    format!("{} {}", title, COPY_MARKER)
}

/// `notes.txt` -> `notes (Copy).txt`
pub fn copy_filename(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} {}.{}", stem, COPY_MARKER, ext),
        _ => copy_title(filename),
    }
}

/// Points are written with at least one decimal place (`25.0`)
pub fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{:.1}", points)
    } else {
        points.to_string()
    }
}
