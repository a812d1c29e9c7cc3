//! Rebuild a content graph from a component index.
//!
//! Records are claimed resource by resource in manifest order, so payload
//! collections come back in the order they were written. Module parentage
//! comes from the manifest organization tree; item metadata (content type,
//! state, position) from `module_meta.xml`. Anything that does not resolve is
//! logged and dropped, and unclaimed manifest resources are carried through
//! untouched.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use crate::config::paths;
use crate::core::error::{CartridgeError, Result};
use crate::core::positions;
use crate::domain::{
    Assignment, ContentGraph, ContentKind, CourseInfo, Discussion, FileAsset, Identifier, Module,
    ModuleItem, OrganizationNode, PassthroughResource, Quiz, Resource, ResourceType, WikiPage,
    WorkflowState,
};

use super::html;
use super::index::{Component, ComponentIndex, ComponentKind};
use super::scanner::markup_at;
use super::xml::Element;

pub const DEFAULT_ASSIGNMENT_POINTS: f64 = 100.0;
pub const DEFAULT_QUIZ_POINTS: f64 = 1.0;

const ASSIGNMENT_TITLE_PREFIX: &str = "Assignment: ";

/// Log a field that failed to parse and hand back the default
fn fallback<T>(context: &str, message: impl std::fmt::Display, default: T) -> T {
    let err = CartridgeError::parse(context, message);
    warn!(error = %err, "Using default value");
    default
}

fn parse_points(raw: Option<&str>, context: &str, default: f64) -> f64 {
    match raw {
        Some(text) => text
            .trim()
            .parse::<f64>()
            .unwrap_or_else(|e| fallback(context, format!("points {:?}: {}", text, e), default)),
        None => fallback(context, "points missing", default),
    }
}

fn parse_markup(index: &ComponentIndex, path: &str) -> Option<Element> {
    let markup = markup_at(index, path)?;
    match Element::parse(markup, path) {
        Ok(root) => Some(root),
        Err(e) => {
            warn!(error = %e, "Skipping unparsable document");
            None
        }
    }
}

fn state_of(raw: Option<&str>) -> WorkflowState {
    raw.map(WorkflowState::parse).unwrap_or_default()
}

fn id_or_generate(raw: Option<&str>, context: &str, field: &str) -> Identifier {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(id) => Identifier::new(id),
        None => fallback(context, format!("{} missing", field), Identifier::generate()),
    }
}

struct Hydrator<'a> {
    index: &'a ComponentIndex,
    graph: ContentGraph,
    /// Resource rows in manifest order, course-settings resource excluded
    resources: Vec<&'a Component>,
    claimed: HashSet<String>,
}

/// Rebuild the content graph described by a scanned package
#[instrument(skip_all, fields(root = %index.root.display()))]
pub fn hydrate(index: &ComponentIndex) -> Result<ContentGraph> {
    if index.filter_by_kind(ComponentKind::Manifest).is_empty() {
        return Err(CartridgeError::InvalidPackage {
            path: index.root.clone(),
            reason: format!("no {} in index", paths::MANIFEST_FILE),
        });
    }

    let course = course_info(index);
    let resources = index
        .filter_by_kind(ComponentKind::Resource)
        .into_iter()
        .filter(|r| {
            r.identifier.as_deref() != Some(course.id.as_str())
                && r.href.as_deref() != Some(paths::CANVAS_EXPORT_FILE)
        })
        .collect();

    let mut hydrator = Hydrator {
        index,
        graph: ContentGraph::new(course),
        resources,
        claimed: HashSet::new(),
    };

    hydrator.claim_records();
    hydrator.collect_resources();
    hydrator.build_modules();

    let graph = hydrator.graph;
    info!(
        modules = graph.modules.len(),
        records = graph.record_count(),
        passthrough = graph.passthrough.len(),
        "Hydrated package"
    );
    Ok(graph)
}

fn course_info(index: &ComponentIndex) -> CourseInfo {
    let settings_row = index.filter_by_kind(ComponentKind::CourseSettings).into_iter().next();
    let settings = settings_row
        .and_then(|row| row.markup.as_deref())
        .and_then(|markup| Element::parse(markup, paths::COURSE_SETTINGS_FILE).ok());
    let manifest = index.filter_by_kind(ComponentKind::Manifest).into_iter().next();

    let id = settings_row
        .and_then(|r| r.identifier.clone())
        .or_else(|| {
            index
                .filter_by_kind(ComponentKind::Resource)
                .into_iter()
                .find(|r| r.href.as_deref() == Some(paths::CANVAS_EXPORT_FILE))
                .and_then(|r| r.identifier.clone())
        })
        .map(Identifier::new)
        .unwrap_or_else(Identifier::generate);

    let title = settings_row
        .and_then(|r| r.title.clone())
        .or_else(|| manifest.and_then(|m| m.title.clone()))
        .unwrap_or_else(|| "Untitled Course".to_string());

    let grading_group_id = index
        .filter_by_kind(ComponentKind::AssignmentGroups)
        .into_iter()
        .find_map(|r| r.identifier.clone())
        .map(Identifier::new)
        .unwrap_or_else(Identifier::generate);

    CourseInfo {
        id,
        manifest_id: manifest
            .and_then(|m| m.identifier.clone())
            .map(Identifier::new)
            .unwrap_or_else(Identifier::generate),
        title,
        code: settings
            .as_ref()
            .and_then(|s| s.child_text("course_code"))
            .unwrap_or_default()
            .to_string(),
        grading_group_id,
        root_account_uuid: settings
            .as_ref()
            .and_then(|s| s.child_text("root_account_uuid"))
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
    }
}

impl<'a> Hydrator<'a> {
    fn resource_row(&self, id: &str) -> Option<&'a Component> {
        self.resources
            .iter()
            .copied()
            .find(|r| r.identifier.as_deref() == Some(id))
    }

    fn resource_at(&self, href: &str) -> Option<&'a Component> {
        self.resources
            .iter()
            .copied()
            .find(|r| r.href.as_deref() == Some(href))
    }

    // ========================================================================
    // Records
    // ========================================================================

    fn claim_records(&mut self) {
        let rows = self.resources.clone();
        for row in rows {
            let (Some(id), Some(href)) = (row.identifier.as_deref(), row.href.as_deref()) else {
                continue;
            };
            if self.claimed.contains(id) {
                continue;
            }
            if !paths::is_contained(href) {
                warn!(
                    resource = id,
                    href,
                    "Resource path leaves the package, keeping it as passthrough"
                );
                continue;
            }

            match ResourceType::parse(row.resource_type.as_deref().unwrap_or_default()) {
                ResourceType::WebContent
                    if paths::top_dir(href) == Some(paths::WIKI_CONTENT_DIR) && href.ends_with(".html") =>
                {
                    self.claim_wiki_page(id, href)
                }
                ResourceType::WebContent if paths::top_dir(href) == Some(paths::WEB_RESOURCES_DIR) => {
                    self.claim_file(id, href)
                }
                ResourceType::LearningApplication if href.ends_with(".html") => {
                    self.claim_assignment(id, href)
                }
                ResourceType::QtiAssessment => self.claim_quiz(row, id, href),
                ResourceType::DiscussionTopic => self.claim_discussion(row, id, href),
                _ => {}
            }
        }
    }

    fn mark(&mut self, ids: &[&Identifier]) {
        for id in ids {
            self.claimed.insert(id.to_string());
        }
    }

    fn claim_wiki_page(&mut self, id: &str, href: &str) {
        let markup = markup_at(self.index, href).unwrap_or_default();
        let row = self
            .index
            .by_path(href)
            .into_iter()
            .find(|c| c.kind == ComponentKind::WikiPage);

        let page = WikiPage {
            id: html::meta(markup, "page_identifier")
                .map(Identifier::new)
                .unwrap_or_else(|| Identifier::new(id)),
            resource_id: Identifier::new(id),
            title: row
                .and_then(|r| r.title.clone())
                .unwrap_or_else(|| fallback(href, "title missing", String::new())),
            body: html::body(markup).unwrap_or_else(|| fallback(href, "body missing", String::new())),
            state: state_of(row.and_then(|r| r.workflow_state.as_deref())),
            filename: href.to_string(),
        };

        self.mark(&[&page.resource_id]);
        self.graph.wiki_pages.push(page);
    }

    fn claim_file(&mut self, id: &str, href: &str) {
        let path = self.index.root.join(href);
        let content = std::fs::read(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Unreadable file, using empty content");
            Vec::new()
        });
        let filename = href
            .strip_prefix(paths::WEB_RESOURCES_DIR)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(href)
            .to_string();

        let file = FileAsset {
            id: Identifier::new(id),
            filename,
            content,
            path: href.to_string(),
        };

        self.mark(&[&file.id]);
        self.graph.files.push(file);
    }

    fn claim_assignment(&mut self, id: &str, href: &str) {
        let settings_path = paths::assignment_settings_path(href);
        let settings = parse_markup(self.index, &settings_path);
        let markup = markup_at(self.index, href).unwrap_or_default();

        let title = settings
            .as_ref()
            .and_then(|s| s.child_text("title"))
            .map(str::to_string)
            .or_else(|| {
                html::title(markup).map(|t| {
                    t.strip_prefix(ASSIGNMENT_TITLE_PREFIX)
                        .map(str::to_string)
                        .unwrap_or(t)
                })
            })
            .unwrap_or_else(|| fallback(href, "title missing", String::new()));

        let assignment = Assignment {
            id: Identifier::new(id),
            title,
            body: html::body(markup).unwrap_or_else(|| fallback(href, "body missing", String::new())),
            points: parse_points(
                settings.as_ref().and_then(|s| s.child_text("points_possible")),
                &settings_path,
                DEFAULT_ASSIGNMENT_POINTS,
            ),
            state: state_of(settings.as_ref().and_then(|s| s.child_text("workflow_state"))),
            grading_group_id: settings
                .as_ref()
                .and_then(|s| s.child_text("assignment_group_identifierref"))
                .map(Identifier::new)
                .unwrap_or_else(|| self.graph.course.grading_group_id.clone()),
        };

        self.mark(&[&assignment.id]);
        self.graph.assignments.push(assignment);
    }

    /// Dependency resource of a primary: the manifest link, else the
    /// resource holding a document that points back at the primary
    fn dependency_of(&self, row: &Component, id: &str, sniff_kind: ComponentKind) -> Option<&'a Component> {
        if let Some(target) = row.dependency.as_deref() {
            match self.resource_row(target) {
                Some(dependency) => return Some(dependency),
                None => warn!(resource = id, dependency = target, "Manifest dependency does not resolve"),
            }
        }

        let sniffed = self
            .index
            .filter_by_kind(sniff_kind)
            .into_iter()
            .find(|c| match sniff_kind {
                ComponentKind::AssessmentMeta => c.identifier.as_deref() == Some(id),
                _ => c.identifierref.as_deref() == Some(id),
            })?;
        debug!(resource = id, path = %sniffed.path, "Paired dependency by content");
        self.resource_at(&sniffed.path)
    }

    fn claim_quiz(&mut self, row: &Component, id: &str, href: &str) {
        let Some(meta_row) = self.dependency_of(row, id, ComponentKind::AssessmentMeta) else {
            warn!(resource = id, "Quiz without settings resource, skipping");
            return;
        };
        let (Some(meta_id), Some(meta_href)) = (meta_row.identifier.as_deref(), meta_row.href.as_deref()) else {
            return;
        };
        if !paths::is_contained(meta_href) {
            warn!(resource = id, href = meta_href, "Settings path leaves the package, skipping");
            return;
        }

        let meta = parse_markup(self.index, meta_href);
        let qti = parse_markup(self.index, href);
        let assignment = meta.as_ref().and_then(|m| m.child("assignment"));
        let question = qti.as_ref().and_then(|q| q.find("item"));
        let assessment_question = qti.as_ref().and_then(|q| {
            q.descendants("qtimetadatafield")
                .into_iter()
                .find(|f| f.child_text("fieldlabel") == Some("assessment_question_identifierref"))
                .and_then(|f| f.child_text("fieldentry"))
        });

        let quiz = Quiz {
            id: Identifier::new(id),
            title: meta
                .as_ref()
                .and_then(|m| m.child_text("title"))
                .map(str::to_string)
                .or_else(|| {
                    qti.as_ref()
                        .and_then(|q| q.find("assessment"))
                        .and_then(|a| a.attr("title"))
                        .map(str::to_string)
                })
                .unwrap_or_else(|| fallback(meta_href, "title missing", String::new())),
            description: meta
                .as_ref()
                .and_then(|m| m.child("description"))
                .map(|d| d.text.clone())
                .unwrap_or_else(|| fallback(meta_href, "description missing", String::new())),
            points: parse_points(
                meta.as_ref().and_then(|m| m.child_text("points_possible")),
                meta_href,
                DEFAULT_QUIZ_POINTS,
            ),
            state: state_of(assignment.and_then(|a| a.child_text("workflow_state"))),
            grading_group_id: meta
                .as_ref()
                .and_then(|m| m.child_text("assignment_group_identifierref"))
                .map(Identifier::new)
                .unwrap_or_else(|| self.graph.course.grading_group_id.clone()),
            assignment_id: id_or_generate(
                assignment.and_then(|a| a.attr("identifier")),
                meta_href,
                "assignment identifier",
            ),
            question_id: id_or_generate(question.and_then(|q| q.attr("ident")), href, "question ident"),
            assessment_question_id: id_or_generate(
                assessment_question,
                href,
                "assessment question identifier",
            ),
            meta_resource_id: Identifier::new(meta_id),
        };

        self.mark(&[&quiz.id, &quiz.meta_resource_id]);
        self.graph.quizzes.push(quiz);
    }

    fn claim_discussion(&mut self, row: &Component, id: &str, href: &str) {
        let Some(meta_row) = self.dependency_of(row, id, ComponentKind::DiscussionTopicMeta) else {
            warn!(resource = id, "Discussion without topic meta, skipping");
            return;
        };
        let (Some(meta_id), Some(meta_href)) = (meta_row.identifier.as_deref(), meta_row.href.as_deref()) else {
            return;
        };
        if !paths::is_contained(meta_href) {
            warn!(resource = id, href = meta_href, "Settings path leaves the package, skipping");
            return;
        }

        let topic = parse_markup(self.index, href);
        let meta = parse_markup(self.index, meta_href);

        let discussion = Discussion {
            topic_id: Identifier::new(id),
            meta_id: Identifier::new(meta_id),
            title: topic
                .as_ref()
                .and_then(|t| t.child_text("title"))
                .or_else(|| meta.as_ref().and_then(|m| m.child_text("title")))
                .map(str::to_string)
                .unwrap_or_else(|| fallback(href, "title missing", String::new())),
            body: topic
                .as_ref()
                .and_then(|t| t.child("text"))
                .map(|t| t.text.clone())
                .unwrap_or_else(|| fallback(href, "text missing", String::new())),
            state: state_of(meta.as_ref().and_then(|m| m.child_text("workflow_state"))),
        };

        self.mark(&[&discussion.topic_id, &discussion.meta_id]);
        self.graph.discussions.push(discussion);
    }

    // ========================================================================
    // Resources
    // ========================================================================

    fn collect_resources(&mut self) {
        let manifest = parse_markup(self.index, paths::MANIFEST_FILE);
        let dependencies: Vec<(Identifier, Identifier)> = self
            .graph
            .quizzes
            .iter()
            .map(|q| (q.id.clone(), q.meta_resource_id.clone()))
            .chain(
                self.graph
                    .discussions
                    .iter()
                    .map(|d| (d.topic_id.clone(), d.meta_id.clone())),
            )
            .collect();

        for row in &self.resources {
            let Some(id) = row.identifier.as_deref() else {
                continue;
            };
            let resource = Resource {
                id: Identifier::new(id),
                kind: ResourceType::parse(row.resource_type.as_deref().unwrap_or_default()),
                href: row.href.clone().unwrap_or_default(),
                dependency: None,
            };

            if self.claimed.contains(id) {
                let dependency = dependencies
                    .iter()
                    .find(|(primary, _)| primary == id)
                    .map(|(_, meta)| meta.clone());
                self.graph.resources.push(Resource {
                    dependency,
                    ..resource
                });
            } else {
                let files = manifest
                    .as_ref()
                    .and_then(|m| {
                        m.descendants("resource")
                            .into_iter()
                            .find(|r| r.attr("identifier") == Some(id))
                    })
                    .map(|r| {
                        r.children_named("file")
                            .filter_map(|f| f.attr("href"))
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                debug!(resource = id, "Keeping unclaimed resource as passthrough");
                self.graph.passthrough.push(PassthroughResource {
                    resource: Resource {
                        dependency: row.dependency.clone().map(Identifier::new),
                        ..resource
                    },
                    files,
                });
            }
        }
    }

    // ========================================================================
    // Modules
    // ========================================================================

    fn build_modules(&mut self) {
        let meta_modules = self.index.filter_by_kind(ComponentKind::Module);
        let org_modules = self.index.filter_by_kind(ComponentKind::ModuleOrg);

        let mut ordered: Vec<&Component> = meta_modules.clone();
        ordered.sort_by_key(|m| m.position.unwrap_or(usize::MAX));
        for org in org_modules.iter().copied() {
            if !meta_modules.iter().any(|m| m.identifier == org.identifier) {
                ordered.push(org);
            }
        }

        let mut modules = Vec::new();
        for row in ordered {
            let Some(module_id) = row.identifier.as_deref() else {
                continue;
            };
            let org = org_modules
                .iter()
                .find(|o| o.identifier.as_deref() == Some(module_id));

            let module = Module {
                id: Identifier::new(module_id),
                title: row
                    .title
                    .clone()
                    .or_else(|| org.and_then(|o| o.title.clone()))
                    .unwrap_or_default(),
                position: 0,
                state: state_of(row.workflow_state.as_deref()),
                items: self.build_items(module_id),
            };
            modules.push(module);
        }

        positions::renumber(&mut modules);
        self.graph.organization = modules.iter().map(OrganizationNode::for_module).collect();
        self.graph.modules = modules;
    }

    fn build_items(&self, module_id: &str) -> Vec<ModuleItem> {
        let meta_items: Vec<&Component> = self
            .index
            .filter_by_kind(ComponentKind::ModuleItem)
            .into_iter()
            .filter(|i| i.parent.as_deref() == Some(module_id))
            .collect();
        let org_items: Vec<&Component> = self
            .index
            .filter_by_kind(ComponentKind::ModuleItemOrg)
            .into_iter()
            .filter(|i| i.parent.as_deref() == Some(module_id))
            .collect();

        // Parentage from the organization tree when it has any, else module metadata
        let mut rows: Vec<(Option<&Component>, Option<&Component>)> = if org_items.is_empty() {
            meta_items.iter().map(|m| (None, Some(*m))).collect()
        } else {
            org_items
                .iter()
                .map(|o| {
                    let meta = meta_items.iter().copied().find(|m| m.identifier == o.identifier);
                    (Some(*o), meta)
                })
                .collect()
        };
        rows.sort_by_key(|(org, meta)| {
            meta.and_then(|m| m.position)
                .or_else(|| org.and_then(|o| o.position))
                .unwrap_or(usize::MAX)
        });

        let mut items = Vec::new();
        for (org, meta) in rows {
            let Some(item_id) = org.or(meta).and_then(|r| r.identifier.as_deref()) else {
                continue;
            };
            let reference = meta
                .and_then(|m| m.identifierref.as_deref())
                .or_else(|| org.and_then(|o| o.identifierref.as_deref()));
            let Some(handle) = reference.and_then(|r| self.graph.locate_by_resource(&Identifier::new(r))) else {
                warn!(module = module_id, item = item_id, reference, "Dropping item with unresolved reference");
                continue;
            };

            if let Some(tag) = meta.and_then(|m| m.content_type.as_deref()) {
                if ContentKind::from_item_content_type(tag) != Some(handle.kind) {
                    warn!(item = item_id, tag, kind = %handle.kind, "Item content type disagrees with its record");
                }
            }

            let title = meta
                .and_then(|m| m.title.clone())
                .or_else(|| org.and_then(|o| o.title.clone()))
                .or_else(|| self.graph.title_of(&handle).map(str::to_string))
                .unwrap_or_default();

            items.push(ModuleItem {
                id: Identifier::new(item_id),
                title,
                kind: handle.kind,
                state: state_of(meta.and_then(|m| m.workflow_state.as_deref())),
                resource_ref: handle.primary_resource,
                position: 0,
            });
        }

        positions::renumber(&mut items);
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: ComponentKind) -> Component {
        Component::new(kind, "imsmanifest.xml", "d")
    }

    #[test]
    fn test_parse_points_defaults() {
        assert_eq!(parse_points(Some("25.0"), "ctx", 100.0), 25.0);
        assert_eq!(parse_points(Some(" 7 "), "ctx", 100.0), 7.0);
        assert_eq!(parse_points(Some("lots"), "ctx", 100.0), 100.0);
        assert_eq!(parse_points(None, "ctx", 1.0), 1.0);
    }

    #[test]
    fn test_index_without_manifest_is_invalid() {
        let index = ComponentIndex::default();
        assert!(matches!(
            hydrate(&index),
            Err(CartridgeError::InvalidPackage { .. })
        ));
    }

    #[test]
    fn test_items_with_unresolved_references_are_dropped() {
        let index = ComponentIndex::new(
            std::path::PathBuf::from("/nowhere"),
            vec![
                row(ComponentKind::Manifest),
                Component {
                    identifier: Some("gmod".to_string()),
                    title: Some("Unit".to_string()),
                    position: Some(1),
                    ..row(ComponentKind::ModuleOrg)
                },
                Component {
                    identifier: Some("gitem".to_string()),
                    title: Some("Ghost".to_string()),
                    identifierref: Some("gmissing".to_string()),
                    parent: Some("gmod".to_string()),
                    position: Some(1),
                    ..row(ComponentKind::ModuleItemOrg)
                },
            ],
        );

        let graph = hydrate(&index).unwrap();

        assert_eq!(graph.modules.len(), 1);
        assert!(graph.modules[0].items.is_empty());
        assert_eq!(graph.organization[0].children.len(), 0);
        assert!(graph.validate().is_empty());
    }

    #[test]
    fn test_unclaimed_resources_pass_through() {
        let index = ComponentIndex::new(
            std::path::PathBuf::from("/nowhere"),
            vec![
                row(ComponentKind::Manifest),
                Component {
                    identifier: Some("glti".to_string()),
                    href: Some("external_tools/tool.xml".to_string()),
                    resource_type: Some("imsbasiclti_xmlv1p0".to_string()),
                    ..row(ComponentKind::Resource)
                },
            ],
        );

        let graph = hydrate(&index).unwrap();

        assert!(graph.resources.is_empty());
        assert_eq!(graph.passthrough.len(), 1);
        assert_eq!(
            graph.passthrough[0].resource.kind,
            ResourceType::Other("imsbasiclti_xmlv1p0".to_string())
        );
    }

    #[test]
    fn test_escaping_hrefs_are_not_claimed() {
        let index = ComponentIndex::new(
            std::path::PathBuf::from("/nowhere"),
            vec![
                row(ComponentKind::Manifest),
                Component {
                    identifier: Some("gfile".to_string()),
                    href: Some("web_resources/../../escaped.txt".to_string()),
                    resource_type: Some("webcontent".to_string()),
                    ..row(ComponentKind::Resource)
                },
                Component {
                    identifier: Some("gpage".to_string()),
                    href: Some("wiki_content/../../page.html".to_string()),
                    resource_type: Some("webcontent".to_string()),
                    ..row(ComponentKind::Resource)
                },
            ],
        );

        let graph = hydrate(&index).unwrap();

        assert!(graph.files.is_empty());
        assert!(graph.wiki_pages.is_empty());
        assert!(graph.resources.is_empty());
        assert_eq!(graph.passthrough.len(), 2);
    }
}
