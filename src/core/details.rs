//! Read-only view of one record and where modules place it.

use serde::Serialize;

use crate::domain::{ContentKind, Identifier, WorkflowState};

use super::engine::Cartridge;
use super::error::{CartridgeError, Result};

/// One module item pointing at a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub module_id: Identifier,
    pub module: String,
    pub position: usize,
}

/// Every field a record carries, flattened across kinds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDetails {
    pub kind: ContentKind,
    pub id: Identifier,
    pub resource_id: Identifier,
    pub title: String,
    /// Body, or the description for quizzes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
    /// Files have no publication state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<WorkflowState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    pub placements: Vec<Placement>,
}

impl RecordDetails {
    fn new(kind: ContentKind, id: &Identifier, resource_id: &Identifier, title: &str) -> Self {
        Self {
            kind,
            id: id.clone(),
            resource_id: resource_id.clone(),
            title: title.to_string(),
            body: None,
            points: None,
            state: None,
            filename: None,
            path: None,
            size: None,
            placements: Vec::new(),
        }
    }
}

impl Cartridge {
    /// Look up a record by payload id or primary resource id
    pub fn details(&self, reference: &str) -> Result<RecordDetails> {
        let graph = &self.graph;
        let missing = || CartridgeError::not_found("content", reference);
        let handle = graph.locate(reference).ok_or_else(missing)?;
        let id = &handle.content_id;
        let resource = &handle.primary_resource;

        let mut details = match handle.kind {
            ContentKind::WikiPage => {
                let page = graph.wiki_page(id).ok_or_else(missing)?;
                RecordDetails {
                    body: Some(page.body.clone()),
                    state: Some(page.state),
                    filename: Some(page.filename.clone()),
                    ..RecordDetails::new(handle.kind, id, resource, &page.title)
                }
            }
            ContentKind::Assignment => {
                let a = graph.assignment(id).ok_or_else(missing)?;
                RecordDetails {
                    body: Some(a.body.clone()),
                    points: Some(a.points),
                    state: Some(a.state),
                    ..RecordDetails::new(handle.kind, id, resource, &a.title)
                }
            }
            ContentKind::Quiz => {
                let q = graph.quiz(id).ok_or_else(missing)?;
                RecordDetails {
                    body: Some(q.description.clone()),
                    points: Some(q.points),
                    state: Some(q.state),
                    ..RecordDetails::new(handle.kind, id, resource, &q.title)
                }
            }
            ContentKind::Discussion => {
                let d = graph.discussion(id).ok_or_else(missing)?;
                RecordDetails {
                    body: Some(d.body.clone()),
                    state: Some(d.state),
                    ..RecordDetails::new(handle.kind, id, resource, &d.title)
                }
            }
            ContentKind::File => {
                let f = graph.file(id).ok_or_else(missing)?;
                RecordDetails {
                    filename: Some(f.filename.clone()),
                    path: Some(f.path.clone()),
                    size: Some(f.content.len()),
                    ..RecordDetails::new(handle.kind, id, resource, &f.filename)
                }
            }
        };

        for (module_id, item_id) in graph.items_referencing(resource) {
            let Some(module) = graph.module(&module_id) else {
                continue;
            };
            if let Some(item) = module.items.iter().find(|i| i.id == item_id) {
                details.placements.push(Placement {
                    module_id: module.id.clone(),
                    module: module.title.clone(),
                    position: item.position,
                });
            }
        }
        Ok(details)
    }
}
