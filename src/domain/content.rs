//! Content-type tags, publication states and resource types.

use serde::{Deserialize, Serialize};

/// Family of a payload record, as tagged on module items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Standalone HTML page
    WikiPage,

    /// Graded assignment
    Assignment,

    /// Quiz with QTI assessment and settings meta
    Quiz,

    /// Discussion topic with topic meta
    Discussion,

    /// Uploaded file under web resources
    File,
}

impl ContentKind {
    pub const ALL: [ContentKind; 5] = [
        ContentKind::WikiPage,
        ContentKind::Assignment,
        ContentKind::Quiz,
        ContentKind::Discussion,
        ContentKind::File,
    ];

    /// Tag written to `<content_type>` in module metadata
    pub fn item_content_type(self) -> &'static str {
        match self {
            ContentKind::WikiPage => "WikiPage",
            ContentKind::Assignment => "Assignment",
            ContentKind::Quiz => "Quizzes::Quiz",
            ContentKind::Discussion => "DiscussionTopic",
            ContentKind::File => "Attachment",
        }
    }

    /// Parse a module item `<content_type>` tag
    pub fn from_item_content_type(tag: &str) -> Option<Self> {
        match tag {
            "WikiPage" => Some(ContentKind::WikiPage),
            "Assignment" => Some(ContentKind::Assignment),
            "Quizzes::Quiz" | "Quiz" => Some(ContentKind::Quiz),
            "DiscussionTopic" => Some(ContentKind::Discussion),
            "Attachment" => Some(ContentKind::File),
            _ => None,
        }
    }

    /// Whether records of this family own a dependency resource
    pub fn has_dependency(self) -> bool {
        matches!(self, ContentKind::Quiz | ContentKind::Discussion)
    }

    /// Number of resources a record of this family owns
    pub fn owned_resources(self) -> usize {
        if self.has_dependency() {
            2
        } else {
            1
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::WikiPage => write!(f, "wiki page"),
            ContentKind::Assignment => write!(f, "assignment"),
            ContentKind::Quiz => write!(f, "quiz"),
            ContentKind::Discussion => write!(f, "discussion"),
            ContentKind::File => write!(f, "file"),
        }
    }
}

impl std::str::FromStr for ContentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "wiki" | "wiki_page" | "wikipage" | "page" => Ok(ContentKind::WikiPage),
            "assignment" => Ok(ContentKind::Assignment),
            "quiz" => Ok(ContentKind::Quiz),
            "discussion" | "topic" => Ok(ContentKind::Discussion),
            "file" | "attachment" => Ok(ContentKind::File),
            _ => anyhow::bail!("Unknown content kind: {}", s),
        }
    }
}

/// Publication state of a module, item or record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Published,
    Unpublished,
}

impl WorkflowState {
    pub fn from_published(published: bool) -> Self {
        if published {
            WorkflowState::Published
        } else {
            WorkflowState::Unpublished
        }
    }

    pub fn is_published(self) -> bool {
        self == WorkflowState::Published
    }

    /// Value used by modules, items, pages, assignments and quizzes
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowState::Published => "published",
            WorkflowState::Unpublished => "unpublished",
        }
    }

    /// Discussions spell the published state `active`
    pub fn as_discussion_str(self) -> &'static str {
        match self {
            WorkflowState::Published => "active",
            WorkflowState::Unpublished => "unpublished",
        }
    }

    /// Parse a `workflow_state` value; anything unrecognised is unpublished
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "published" | "active" | "available" => WorkflowState::Published,
            _ => WorkflowState::Unpublished,
        }
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::Published
    }
}

/// Manifest-level resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Plain web content (wiki pages, files)
    WebContent,

    /// Settings/meta documents and assignments
    LearningApplication,

    /// QTI assessment (quiz primary)
    QtiAssessment,

    /// Discussion topic (discussion primary)
    DiscussionTopic,

    /// Any type this system does not model
    Other(String),
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::WebContent => "webcontent",
            ResourceType::LearningApplication => {
                "associatedcontent/imscc_xmlv1p1/learning-application-resource"
            }
            ResourceType::QtiAssessment => "imsqti_xmlv1p2/imscc_xmlv1p1/assessment",
            ResourceType::DiscussionTopic => "imsdt_xmlv1p1",
            ResourceType::Other(raw) => raw,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "webcontent" => ResourceType::WebContent,
            "associatedcontent/imscc_xmlv1p1/learning-application-resource" => {
                ResourceType::LearningApplication
            }
            "imsqti_xmlv1p2/imscc_xmlv1p1/assessment" => ResourceType::QtiAssessment,
            "imsdt_xmlv1p1" => ResourceType::DiscussionTopic,
            other => ResourceType::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
