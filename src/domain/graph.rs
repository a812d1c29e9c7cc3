//! The in-memory content graph.
//!
//! Three views describe the same course: the module list (ordered modules
//! holding ordered items), the organization tree (the manifest's mirror of
//! the module list) and the flat resource list. Payload records live in one
//! collection per content family and own the resources that point at their
//! on-disk artifacts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::content::{ContentKind, ResourceType, WorkflowState};
use super::ids::Identifier;
use super::payload::{Assignment, Discussion, FileAsset, Quiz, WikiPage};

/// Anything carrying a 1-based position within its parent
pub trait Positioned {
    fn position(&self) -> usize;
    fn set_position(&mut self, position: usize);
}

/// Course-level identity written to the boilerplate descriptors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseInfo {
    /// Course identifier (also the course-settings resource id)
    pub id: Identifier,
    /// Manifest root identifier
    pub manifest_id: Identifier,
    pub title: String,
    pub code: String,
    /// Default assignment group all graded records belong to
    pub grading_group_id: Identifier,
    pub root_account_uuid: String,
}

impl CourseInfo {
    pub fn new(title: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: Identifier::generate(),
            manifest_id: Identifier::generate(),
            title: title.into(),
            code: code.into(),
            grading_group_id: Identifier::generate(),
            root_account_uuid: uuid::Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: Identifier,
    pub title: String,
    pub position: usize,
    pub state: WorkflowState,
    pub items: Vec<ModuleItem>,
}

impl Module {
    pub fn item(&self, item_id: &Identifier) -> Option<&ModuleItem> {
        self.items.iter().find(|i| &i.id == item_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleItem {
    pub id: Identifier,
    pub title: String,
    pub kind: ContentKind,
    pub state: WorkflowState,
    /// Primary resource of the referenced record
    pub resource_ref: Identifier,
    pub position: usize,
}

/// Manifest resource entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Identifier,
    pub kind: ResourceType,
    pub href: String,
    pub dependency: Option<Identifier>,
}

/// Foreign resource kept verbatim across re-serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassthroughResource {
    pub resource: Resource,
    pub files: Vec<String>,
}

/// Node of the manifest organization tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationNode {
    pub id: Identifier,
    pub title: String,
    pub resource_ref: Option<Identifier>,
    pub position: usize,
    pub children: Vec<OrganizationNode>,
}

impl OrganizationNode {
    /// Mirror node for a module (children mirror its items)
    pub fn for_module(module: &Module) -> Self {
        Self {
            id: module.id.clone(),
            title: module.title.clone(),
            resource_ref: None,
            position: module.position,
            children: module.items.iter().map(Self::for_item).collect(),
        }
    }

    pub fn for_item(item: &ModuleItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            resource_ref: Some(item.resource_ref.clone()),
            position: item.position,
            children: Vec::new(),
        }
    }
}

macro_rules! impl_positioned {
    ($($ty:ty),*) => {
        $(
            impl Positioned for $ty {
                fn position(&self) -> usize {
                    self.position
                }

                fn set_position(&mut self, position: usize) {
                    self.position = position;
                }
            }
        )*
    };
}

impl_positioned!(Module, ModuleItem, OrganizationNode);

/// Where a payload record lives and which resource represents it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHandle {
    pub kind: ContentKind,
    /// Payload id (page id, assignment id, quiz id, topic id, file id)
    pub content_id: Identifier,
    /// Resource referenced by module items
    pub primary_resource: Identifier,
}

/// A broken consistency rule between the graph's views
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("module item {item} references {resource}, which matches {matches} resources")]
    DanglingItemReference {
        item: Identifier,
        resource: Identifier,
        matches: usize,
    },

    #[error("{scope} positions are {found:?}, expected 1..={expected}")]
    SparsePositions {
        scope: String,
        found: Vec<usize>,
        expected: usize,
    },

    #[error("organization tree diverges from module list at {at}")]
    MirrorMismatch { at: String },

    #[error("resource {resource} depends on missing resource {target}")]
    MissingDependency {
        resource: Identifier,
        target: Identifier,
    },

    #[error("{kind} {content} owns {found} resources, expected {expected}")]
    OwnershipCount {
        kind: ContentKind,
        content: Identifier,
        found: usize,
        expected: usize,
    },

    #[error("resource {resource} is owned by {owners} records")]
    UnownedResource { resource: Identifier, owners: usize },
}

/// The whole course in memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentGraph {
    pub course: CourseInfo,
    pub modules: Vec<Module>,
    pub organization: Vec<OrganizationNode>,
    pub resources: Vec<Resource>,
    pub wiki_pages: Vec<WikiPage>,
    pub assignments: Vec<Assignment>,
    pub quizzes: Vec<Quiz>,
    pub discussions: Vec<Discussion>,
    pub files: Vec<FileAsset>,
    pub passthrough: Vec<PassthroughResource>,
}

impl ContentGraph {
    /// Create an empty graph for a course
    pub fn new(course: CourseInfo) -> Self {
        Self {
            course,
            modules: Vec::new(),
            organization: Vec::new(),
            resources: Vec::new(),
            wiki_pages: Vec::new(),
            assignments: Vec::new(),
            quizzes: Vec::new(),
            discussions: Vec::new(),
            files: Vec::new(),
            passthrough: Vec::new(),
        }
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    pub fn module(&self, id: &Identifier) -> Option<&Module> {
        self.modules.iter().find(|m| &m.id == id)
    }

    pub fn module_mut(&mut self, id: &Identifier) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| &m.id == id)
    }

    pub fn org_node_mut(&mut self, id: &Identifier) -> Option<&mut OrganizationNode> {
        self.organization.iter_mut().find(|n| &n.id == id)
    }

    pub fn resource(&self, id: &Identifier) -> Option<&Resource> {
        self.resources.iter().find(|r| &r.id == id)
    }

    pub fn resource_mut(&mut self, id: &Identifier) -> Option<&mut Resource> {
        self.resources.iter_mut().find(|r| &r.id == id)
    }

    pub fn wiki_page(&self, id: &Identifier) -> Option<&WikiPage> {
        self.wiki_pages.iter().find(|p| &p.id == id)
    }

    pub fn assignment(&self, id: &Identifier) -> Option<&Assignment> {
        self.assignments.iter().find(|a| &a.id == id)
    }

    pub fn quiz(&self, id: &Identifier) -> Option<&Quiz> {
        self.quizzes.iter().find(|q| &q.id == id)
    }

    pub fn discussion(&self, id: &Identifier) -> Option<&Discussion> {
        self.discussions.iter().find(|d| &d.topic_id == id)
    }

    pub fn file(&self, id: &Identifier) -> Option<&FileAsset> {
        self.files.iter().find(|f| &f.id == id)
    }

    /// Resolve a payload id or primary resource id to its record
    pub fn locate(&self, reference: &str) -> Option<ContentHandle> {
        if let Some(page) = self
            .wiki_pages
            .iter()
            .find(|p| p.id == reference || p.resource_id == reference)
        {
            return Some(ContentHandle {
                kind: ContentKind::WikiPage,
                content_id: page.id.clone(),
                primary_resource: page.resource_id.clone(),
            });
        }

        let simple = |kind: ContentKind, id: &Identifier| ContentHandle {
            kind,
            content_id: id.clone(),
            primary_resource: id.clone(),
        };

        if let Some(a) = self.assignments.iter().find(|a| a.id == reference) {
            return Some(simple(ContentKind::Assignment, &a.id));
        }
        if let Some(q) = self.quizzes.iter().find(|q| q.id == reference) {
            return Some(simple(ContentKind::Quiz, &q.id));
        }
        if let Some(d) = self.discussions.iter().find(|d| d.topic_id == reference) {
            return Some(simple(ContentKind::Discussion, &d.topic_id));
        }
        self.files
            .iter()
            .find(|f| f.id == reference)
            .map(|f| simple(ContentKind::File, &f.id))
    }

    /// Handle for the record whose primary resource is `resource_id`
    pub fn locate_by_resource(&self, resource_id: &Identifier) -> Option<ContentHandle> {
        self.locate(resource_id.as_str())
            .filter(|handle| &handle.primary_resource == resource_id)
    }

    /// Current title of a record
    pub fn title_of(&self, handle: &ContentHandle) -> Option<&str> {
        let id = &handle.content_id;
        match handle.kind {
            ContentKind::WikiPage => self.wiki_page(id).map(|p| p.title.as_str()),
            ContentKind::Assignment => self.assignment(id).map(|a| a.title.as_str()),
            ContentKind::Quiz => self.quiz(id).map(|q| q.title.as_str()),
            ContentKind::Discussion => self.discussion(id).map(|d| d.title.as_str()),
            ContentKind::File => self.file(id).map(|f| f.filename.as_str()),
        }
    }

    /// `(module id, item id)` of every item referencing a resource
    pub fn items_referencing(&self, resource_id: &Identifier) -> Vec<(Identifier, Identifier)> {
        self.modules
            .iter()
            .flat_map(|m| {
                m.items
                    .iter()
                    .filter(|i| &i.resource_ref == resource_id)
                    .map(move |i| (m.id.clone(), i.id.clone()))
            })
            .collect()
    }

    pub fn is_attached(&self, resource_id: &Identifier) -> bool {
        self.modules
            .iter()
            .any(|m| m.items.iter().any(|i| &i.resource_ref == resource_id))
    }

    /// Every record with the resources it owns, in collection order
    pub fn ownership(&self) -> Vec<(ContentKind, Identifier, Vec<Identifier>)> {
        let mut owned = Vec::new();

        for p in &self.wiki_pages {
            owned.push((ContentKind::WikiPage, p.id.clone(), vec![p.resource_id.clone()]));
        }
        for a in &self.assignments {
            owned.push((ContentKind::Assignment, a.id.clone(), vec![a.id.clone()]));
        }
        for q in &self.quizzes {
            owned.push((
                ContentKind::Quiz,
                q.id.clone(),
                vec![q.id.clone(), q.meta_resource_id.clone()],
            ));
        }
        for d in &self.discussions {
            owned.push((
                ContentKind::Discussion,
                d.topic_id.clone(),
                vec![d.topic_id.clone(), d.meta_id.clone()],
            ));
        }
        for f in &self.files {
            owned.push((ContentKind::File, f.id.clone(), vec![f.id.clone()]));
        }

        owned
    }

    /// Total number of payload records
    pub fn record_count(&self) -> usize {
        self.wiki_pages.len()
            + self.assignments.len()
            + self.quizzes.len()
            + self.discussions.len()
            + self.files.len()
    }

    // ========================================================================
    // Invariants
    // ========================================================================

    /// Check every cross-view consistency rule, returning all violations
    pub fn validate(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        // Item references
        for module in &self.modules {
            for item in &module.items {
                let matches = self
                    .resources
                    .iter()
                    .filter(|r| r.id == item.resource_ref)
                    .count();
                if matches != 1 {
                    violations.push(InvariantViolation::DanglingItemReference {
                        item: item.id.clone(),
                        resource: item.resource_ref.clone(),
                        matches,
                    });
                }
            }
        }

        // Position density
        check_dense("modules", &self.modules, &mut violations);
        for module in &self.modules {
            check_dense(
                &format!("items of module {}", module.id),
                &module.items,
                &mut violations,
            );
        }

        // Mirror isomorphism
        let expected: Vec<OrganizationNode> =
            self.modules.iter().map(OrganizationNode::for_module).collect();
        if expected.len() != self.organization.len() {
            violations.push(InvariantViolation::MirrorMismatch {
                at: format!(
                    "root ({} modules, {} nodes)",
                    expected.len(),
                    self.organization.len()
                ),
            });
        } else {
            for (want, got) in expected.iter().zip(&self.organization) {
                if want != got {
                    violations.push(InvariantViolation::MirrorMismatch {
                        at: format!("module {}", want.id),
                    });
                }
            }
        }

        // Dependency targets
        for resource in &self.resources {
            if let Some(target) = &resource.dependency {
                if self.resource(target).is_none() {
                    violations.push(InvariantViolation::MissingDependency {
                        resource: resource.id.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        // Ownership
        let mut owners: HashMap<&Identifier, usize> = HashMap::new();
        let ownership = self.ownership();
        for (kind, content, resources) in &ownership {
            let found = resources
                .iter()
                .filter(|id| self.resource(id).is_some())
                .count();
            if found != kind.owned_resources() {
                violations.push(InvariantViolation::OwnershipCount {
                    kind: *kind,
                    content: content.clone(),
                    found,
                    expected: kind.owned_resources(),
                });
            }
            for id in resources {
                *owners.entry(id).or_default() += 1;
            }
        }
        for resource in &self.resources {
            let count = owners.get(&resource.id).copied().unwrap_or(0);
            if count != 1 {
                violations.push(InvariantViolation::UnownedResource {
                    resource: resource.id.clone(),
                    owners: count,
                });
            }
        }

        violations
    }
}

fn check_dense<T: Positioned>(
    scope: &str,
    entries: &[T],
    violations: &mut Vec<InvariantViolation>,
) {
    let found: Vec<usize> = entries.iter().map(Positioned::position).collect();
    let dense = found.iter().enumerate().all(|(i, p)| *p == i + 1);
    if !dense {
        violations.push(InvariantViolation::SparsePositions {
            scope: scope.to_string(),
            found,
            expected: entries.len(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(title: &str) -> (WikiPage, Resource) {
        let resource_id = Identifier::generate();
        let page = WikiPage {
            id: Identifier::generate(),
            resource_id: resource_id.clone(),
            title: title.to_string(),
            body: String::new(),
            state: WorkflowState::Published,
            filename: format!("wiki_content/{}.html", title.to_lowercase()),
        };
        let resource = Resource {
            id: resource_id,
            kind: ResourceType::WebContent,
            href: page.filename.clone(),
            dependency: None,
        };
        (page, resource)
    }

    fn graph_with_one_item() -> ContentGraph {
        let mut graph = ContentGraph::new(CourseInfo::new("Course", "C-1"));
        let (page, resource) = page("Intro");
        let module = Module {
            id: Identifier::generate(),
            title: "Unit 1".to_string(),
            position: 1,
            state: WorkflowState::Published,
            items: vec![ModuleItem {
                id: Identifier::generate(),
                title: "Intro".to_string(),
                kind: ContentKind::WikiPage,
                state: WorkflowState::Published,
                resource_ref: resource.id.clone(),
                position: 1,
            }],
        };
        graph.organization.push(OrganizationNode::for_module(&module));
        graph.modules.push(module);
        graph.resources.push(resource);
        graph.wiki_pages.push(page);
        graph
    }

    #[test]
    fn test_consistent_graph_validates() {
        let graph = graph_with_one_item();
        assert!(graph.validate().is_empty());
    }

    #[test]
    fn test_locate_accepts_page_or_resource_id() {
        let graph = graph_with_one_item();
        let page = &graph.wiki_pages[0];

        let by_page = graph.locate(page.id.as_str()).unwrap();
        let by_resource = graph.locate(page.resource_id.as_str()).unwrap();
        assert_eq!(by_page, by_resource);
        assert_eq!(by_page.kind, ContentKind::WikiPage);
        assert!(graph.locate("gmissing").is_none());
    }

    #[test]
    fn test_sparse_positions_detected() {
        let mut graph = graph_with_one_item();
        graph.modules[0].items[0].position = 2;

        let violations = graph.validate();
        assert!(violations
            .iter()
            .any(|v| matches!(v, InvariantViolation::SparsePositions { .. })));
        // The mirror still says 1
        assert!(violations
            .iter()
            .any(|v| matches!(v, InvariantViolation::MirrorMismatch { .. })));
    }

    #[test]
    fn test_dangling_reference_detected() {
        let mut graph = graph_with_one_item();
        graph.resources.clear();

        let violations = graph.validate();
        assert!(violations
            .iter()
            .any(|v| matches!(v, InvariantViolation::DanglingItemReference { matches: 0, .. })));
        assert!(violations
            .iter()
            .any(|v| matches!(v, InvariantViolation::OwnershipCount { found: 0, .. })));
    }

    #[test]
    fn test_missing_dependency_detected() {
        let mut graph = graph_with_one_item();
        graph.resources[0].dependency = Some(Identifier::generate());

        let violations = graph.validate();
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            violations[0],
            InvariantViolation::MissingDependency { .. }
        ));
    }

    #[test]
    fn test_unowned_resource_detected() {
        let mut graph = graph_with_one_item();
        graph.resources.push(Resource {
            id: Identifier::generate(),
            kind: ResourceType::WebContent,
            href: "web_resources/stray.txt".to_string(),
            dependency: None,
        });

        let violations = graph.validate();
        assert!(matches!(
            violations.as_slice(),
            [InvariantViolation::UnownedResource { owners: 0, .. }]
        ));
    }
}
