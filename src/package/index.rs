//! Flat component index produced by the scanner.
//!
//! One row per classified file, plus the rows the manifest and module
//! metadata contribute (resources, organization entries, modules, items).
//! Lookups here are the read-only contract other tools rely on.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Classification of a package component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    // Manifest
    Manifest,
    Resource,
    ModuleOrg,
    ModuleItemOrg,

    // Course settings descriptors
    CanvasExport,
    CourseSettings,
    Context,
    AssignmentGroups,
    FilesMeta,
    LatePolicy,
    MediaTracks,
    ModuleMeta,
    Syllabus,
    Rubrics,
    LearningOutcomes,
    GradingStandards,
    Events,
    ExternalFeeds,
    ToolProfiles,
    BlueprintSettings,
    CoursePaces,
    ConditionalRelease,
    CourseSettingsFile,

    // Module metadata rows
    Module,
    ModuleItem,

    // Content directories
    WikiPage,
    WikiContentFile,
    DiscussionTopic,
    DiscussionTopicMeta,
    DiscussionsFile,
    WebResourceFile,
    AssignmentsDirFile,
    QuizzesDirFile,
    FilesDirFile,
    MediaFile,
    ExternalToolFile,
    QtiAssessment,
    UnknownXml,

    // Identifier-named directories
    AssignmentSettings,
    AssessmentMeta,
    AssessmentQti,
    AssignmentContent,
    IdentifierDirFile,

    OtherFile,
}

impl ComponentKind {
    /// Descriptor kind for a file name under `course_settings/`
    pub fn for_course_settings(file_name: &str) -> Self {
        match file_name {
            "canvas_export.txt" => Self::CanvasExport,
            "course_settings.xml" => Self::CourseSettings,
            "context.xml" => Self::Context,
            "assignment_groups.xml" => Self::AssignmentGroups,
            "files_meta.xml" => Self::FilesMeta,
            "late_policy.xml" => Self::LatePolicy,
            "media_tracks.xml" => Self::MediaTracks,
            "module_meta.xml" => Self::ModuleMeta,
            "syllabus.html" => Self::Syllabus,
            "rubrics.xml" => Self::Rubrics,
            "learning_outcomes.xml" => Self::LearningOutcomes,
            "grading_standards.xml" => Self::GradingStandards,
            "events.xml" => Self::Events,
            "external_feeds.xml" => Self::ExternalFeeds,
            "tool_profiles.xml" => Self::ToolProfiles,
            "blueprint.xml" => Self::BlueprintSettings,
            "course_paces.xml" => Self::CoursePaces,
            "conditional_release.xml" => Self::ConditionalRelease,
            _ => Self::CourseSettingsFile,
        }
    }

    /// Rows derived from documents rather than backed by their own file
    pub fn is_derived(self) -> bool {
        matches!(
            self,
            Self::Resource | Self::ModuleOrg | Self::ModuleItemOrg | Self::Module | Self::ModuleItem
        )
    }

    pub fn as_str(self) -> String {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{:?}", self))
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str())
    }
}

/// One classified row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Component {
    pub kind: ComponentKind,
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub workflow_state: Option<String>,
    pub position: Option<usize>,
    pub content_type: Option<String>,
    pub identifierref: Option<String>,
    pub href: Option<String>,
    pub resource_type: Option<String>,
    pub dependency: Option<String>,
    /// Owning module (module items) or organization node (org items)
    pub parent: Option<String>,
    /// Package-relative path of the file the row came from
    pub path: String,
    /// File text, for XML and HTML documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
    /// SHA-256 of the file bytes
    pub digest: String,
}

impl Default for ComponentKind {
    fn default() -> Self {
        Self::OtherFile
    }
}

impl Component {
    pub fn new(kind: ComponentKind, path: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            digest: digest.into(),
            ..Default::default()
        }
    }

    /// Title, falling back to the identifier, then the path
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or(self.identifier.as_deref())
            .unwrap_or(&self.path)
    }
}

/// All rows of one scan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentIndex {
    pub root: PathBuf,
    pub components: Vec<Component>,
}

impl ComponentIndex {
    pub fn new(root: PathBuf, components: Vec<Component>) -> Self {
        Self { root, components }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// All rows of a kind, in scan order
    pub fn filter_by_kind(&self, kind: ComponentKind) -> Vec<&Component> {
        self.components.iter().filter(|c| c.kind == kind).collect()
    }

    /// Row of a kind with a given identifier
    pub fn find(&self, kind: ComponentKind, identifier: &str) -> Option<&Component> {
        self.components
            .iter()
            .find(|c| c.kind == kind && c.identifier.as_deref() == Some(identifier))
    }

    /// First row of a kind with an exact title
    pub fn find_by_title(&self, kind: ComponentKind, title: &str) -> Option<&Component> {
        self.components
            .iter()
            .find(|c| c.kind == kind && c.title.as_deref() == Some(title))
    }

    /// Titles of every row of a kind (for "valid alternatives" listings)
    pub fn titles(&self, kind: ComponentKind) -> Vec<&str> {
        self.components
            .iter()
            .filter(|c| c.kind == kind)
            .filter_map(|c| c.title.as_deref())
            .collect()
    }

    /// Rows that came from a package-relative path
    pub fn by_path(&self, path: &str) -> Vec<&Component> {
        self.components.iter().filter(|c| c.path == path).collect()
    }

    /// Search rows by title (case-insensitive substring match)
    pub fn search(&self, query: &str) -> Vec<&Component> {
        let query_lower = query.to_lowercase();

        self.components
            .iter()
            .filter(|c| {
                c.title
                    .as_deref()
                    .is_some_and(|t| t.to_lowercase().contains(&query_lower))
            })
            .collect()
    }

    /// Number of rows per kind
    pub fn counts(&self) -> BTreeMap<ComponentKind, usize> {
        let mut counts = BTreeMap::new();
        for component in &self.components {
            *counts.entry(component.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Package-relative paths of every file in the package
    pub fn files(&self) -> BTreeSet<&str> {
        self.components.iter().map(|c| c.path.as_str()).collect()
    }

    /// Digest over every `(path, file digest)` pair, excluding `skip` paths
    pub fn fingerprint(&self, skip: &[&str]) -> String {
        let pairs: BTreeSet<(&str, &str)> = self
            .components
            .iter()
            .filter(|c| !skip.contains(&c.path.as_str()))
            .map(|c| (c.path.as_str(), c.digest.as_str()))
            .collect();

        let mut hasher = Sha256::new();
        for (path, digest) in pairs {
            hasher.update(path.as_bytes());
            hasher.update([0u8]);
            hasher.update(digest.as_bytes());
            hasher.update([b'\n']);
        }
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: ComponentKind, id: &str, title: &str, path: &str) -> Component {
        Component {
            identifier: Some(id.to_string()),
            title: Some(title.to_string()),
            ..Component::new(kind, path, "d0")
        }
    }

    fn sample() -> ComponentIndex {
        ComponentIndex::new(
            PathBuf::from("/pkg"),
            vec![
                row(ComponentKind::Module, "m1", "Unit 1", "course_settings/module_meta.xml"),
                row(ComponentKind::Module, "m2", "Unit 2", "course_settings/module_meta.xml"),
                row(ComponentKind::WikiPage, "r1", "Intro", "wiki_content/intro.html"),
            ],
        )
    }

    #[test]
    fn test_lookups() {
        let index = sample();

        assert_eq!(index.len(), 3);
        assert_eq!(index.filter_by_kind(ComponentKind::Module).len(), 2);
        assert_eq!(
            index.find(ComponentKind::Module, "m2").and_then(|c| c.title.as_deref()),
            Some("Unit 2")
        );
        assert!(index.find(ComponentKind::WikiPage, "m2").is_none());
        assert_eq!(
            index
                .find_by_title(ComponentKind::WikiPage, "Intro")
                .and_then(|c| c.identifier.as_deref()),
            Some("r1")
        );
        assert_eq!(index.titles(ComponentKind::Module), vec!["Unit 1", "Unit 2"]);
        assert_eq!(index.by_path("course_settings/module_meta.xml").len(), 2);
        assert_eq!(index.search("unit").len(), 2);
    }

    #[test]
    fn test_counts() {
        let counts = sample().counts();
        assert_eq!(counts.get(&ComponentKind::Module), Some(&2));
        assert_eq!(counts.get(&ComponentKind::WikiPage), Some(&1));
        assert_eq!(counts.get(&ComponentKind::Manifest), None);
    }

    #[test]
    fn test_fingerprint_tracks_digests() {
        let index = sample();
        let before = index.fingerprint(&[]);

        let mut changed = index.clone();
        changed.components[2].digest = "d1".to_string();

        assert_ne!(before, changed.fingerprint(&[]));
        assert_eq!(
            index.fingerprint(&["wiki_content/intro.html"]),
            changed.fingerprint(&["wiki_content/intro.html"])
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ComponentKind::DiscussionTopicMeta.to_string(), "discussion_topic_meta");
        assert_eq!(
            ComponentKind::for_course_settings("late_policy.xml"),
            ComponentKind::LatePolicy
        );
        assert_eq!(
            ComponentKind::for_course_settings("unknown.bin"),
            ComponentKind::CourseSettingsFile
        );
    }
}
