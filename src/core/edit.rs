//! In-place edits, deletion and cloning of existing content.

use tracing::{debug, info, instrument, warn};

use crate::config::paths;
use crate::domain::payload::{copy_filename, copy_title};
use crate::domain::{
    ContentDraft, ContentHandle, ContentKind, FileAsset, Identifier, ModuleItem, WorkflowState,
};
use crate::package::serializer::{move_file, remove_path};
use crate::package::templates;

use super::engine::{check_filename, prepare, unique_wiki_filename, Cartridge};
use super::error::{CartridgeError, Result};
use super::positions;

/// Field edits for a record; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    /// Title, or the new filename for files
    pub title: Option<String>,
    /// Body for pages, assignments and discussions; description for quizzes
    pub body: Option<String>,
    pub points: Option<f64>,
    pub published: Option<bool>,
    /// Replacement bytes for files
    pub content: Option<Vec<u8>>,
    pub position: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleUpdate {
    pub title: Option<String>,
    pub published: Option<bool>,
    pub position: Option<usize>,
}

/// Outcome of a position request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionChange {
    /// No position was requested
    Unchanged,
    Moved { from: usize, to: usize },
    /// The record is not in any module, so there is nothing to reorder
    IgnoredUnattached,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    pub id: Identifier,
    /// Names of the fields that were applied
    pub applied: Vec<&'static str>,
    /// Fields that do not apply to this kind of record
    pub skipped: Vec<&'static str>,
    pub position: PositionChange,
}

impl UpdateReport {
    fn new(id: Identifier) -> Self {
        Self {
            id,
            applied: Vec::new(),
            skipped: Vec::new(),
            position: PositionChange::Unchanged,
        }
    }
}

/// What a delete removed
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedContent {
    pub kind: ContentKind,
    pub content_id: Identifier,
    pub resources: Vec<Identifier>,
    /// Module items that referenced the record
    pub items: Vec<Identifier>,
    /// Package-relative paths removed from disk
    pub artifacts: Vec<String>,
}

impl Cartridge {
    fn locate(&self, reference: &str) -> Result<ContentHandle> {
        self.graph
            .locate(reference)
            .ok_or_else(|| CartridgeError::not_found("content", reference))
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Edit a record in place. `reference` is a payload id or primary
    /// resource id.
    #[instrument(skip(self, update))]
    pub fn update_item(&mut self, reference: &str, mut update: ItemUpdate) -> Result<UpdateReport> {
        let handle = self.locate(reference)?;
        update.title = update.title.map(|title| title.trim().to_string());
        if let (ContentKind::File, Some(filename)) = (handle.kind, update.title.as_deref()) {
            check_filename(filename)?;
        }
        let mut report = UpdateReport::new(handle.content_id.clone());

        match handle.kind {
            ContentKind::WikiPage => self.update_wiki_page(&handle, &update, &mut report)?,
            ContentKind::File => self.update_file(&handle, &update, &mut report)?,
            _ => self.update_record(&handle, &update, &mut report),
        }

        // Item titles and states follow the record
        let title = self.graph.title_of(&handle).map(str::to_string);
        let state = update.published.map(WorkflowState::from_published);
        if update.title.is_some() || state.is_some() {
            for (module_id, item_id) in self.graph.items_referencing(&handle.primary_resource) {
                self.edit_item(&module_id, &item_id, title.as_deref(), state);
            }
        }

        if let Some(requested) = update.position {
            report.position = self.reposition(&handle, requested);
        }

        self.flush()?;
        info!(
            content = %handle.content_id,
            applied = ?report.applied,
            position = ?report.position,
            "Updated content"
        );
        Ok(report)
    }

    fn update_wiki_page(
        &mut self,
        handle: &ContentHandle,
        update: &ItemUpdate,
        report: &mut UpdateReport,
    ) -> Result<()> {
        let renamed = update
            .title
            .as_deref()
            .map(|title| unique_wiki_filename(&self.graph, title, Some(&handle.content_id)));

        let page = self
            .graph
            .wiki_pages
            .iter_mut()
            .find(|p| p.id == handle.content_id)
            .ok_or_else(|| CartridgeError::not_found("wiki page", handle.content_id.as_str()))?;

        if let Some(title) = &update.title {
            page.title = title.clone();
            report.applied.push("title");
        }
        if let Some(body) = &update.body {
            page.body = body.clone();
            report.applied.push("body");
        }
        if let Some(published) = update.published {
            page.state = WorkflowState::from_published(published);
            report.applied.push("published");
        }
        skip_unless(report, update.points.is_some(), "points");
        skip_unless(report, update.content.is_some(), "content");

        if let Some(filename) = renamed.filter(|f| *f != page.filename) {
            let old = std::mem::replace(&mut page.filename, filename.clone());
            if let Some(resource) = self.graph.resource_mut(&handle.primary_resource) {
                resource.href = filename.clone();
            }
            remove_path(&self.root, &old)?;
            debug!(from = %old, to = %filename, "Renamed wiki page file");
        }
        Ok(())
    }

    fn update_file(
        &mut self,
        handle: &ContentHandle,
        update: &ItemUpdate,
        report: &mut UpdateReport,
    ) -> Result<()> {
        let file = self
            .graph
            .files
            .iter_mut()
            .find(|f| f.id == handle.content_id)
            .ok_or_else(|| CartridgeError::not_found("file", handle.content_id.as_str()))?;

        if let Some(content) = &update.content {
            file.content = content.clone();
            report.applied.push("content");
        }
        skip_unless(report, update.body.is_some(), "body");
        skip_unless(report, update.points.is_some(), "points");
        skip_unless(report, update.published.is_some(), "published");

        if let Some(filename) = update.title.as_deref().filter(|f| *f != file.filename) {
            let old = file.path.clone();
            let path = FileAsset::storage_path(filename);
            file.filename = filename.to_string();
            file.path = path.clone();
            if let Some(resource) = self.graph.resource_mut(&handle.primary_resource) {
                resource.href = path.clone();
            }
            if self.root.join(&old).is_file() {
                move_file(&self.root, &old, &path)?;
            }
            report.applied.push("title");
            debug!(from = %old, to = %path, "Moved file");
        }
        Ok(())
    }

    /// Assignments, quizzes and discussions
    fn update_record(
        &mut self,
        handle: &ContentHandle,
        update: &ItemUpdate,
        report: &mut UpdateReport,
    ) {
        let graph = &mut self.graph;
        let id = &handle.content_id;
        let (title, body, points, state) = match handle.kind {
            ContentKind::Assignment => match graph.assignments.iter_mut().find(|a| &a.id == id) {
                Some(a) => (&mut a.title, &mut a.body, Some(&mut a.points), &mut a.state),
                None => return,
            },
            ContentKind::Quiz => match graph.quizzes.iter_mut().find(|q| &q.id == id) {
                Some(q) => (
                    &mut q.title,
                    &mut q.description,
                    Some(&mut q.points),
                    &mut q.state,
                ),
                None => return,
            },
            ContentKind::Discussion => {
                match graph.discussions.iter_mut().find(|d| &d.topic_id == id) {
                    Some(d) => (&mut d.title, &mut d.body, None, &mut d.state),
                    None => return,
                }
            }
            ContentKind::WikiPage | ContentKind::File => return,
        };

        if let Some(new_title) = &update.title {
            *title = new_title.clone();
            report.applied.push("title");
        }
        if let Some(new_body) = &update.body {
            *body = new_body.clone();
            report.applied.push("body");
        }
        if let Some(published) = update.published {
            *state = WorkflowState::from_published(published);
            report.applied.push("published");
        }
        match (points, update.points) {
            (Some(points), Some(new_points)) => {
                *points = new_points;
                report.applied.push("points");
            }
            (None, Some(_)) => report.skipped.push("points"),
            _ => {}
        }
        skip_unless(report, update.content.is_some(), "content");
    }

    /// Rewrite one item's title/state and its organization node
    fn edit_item(
        &mut self,
        module_id: &Identifier,
        item_id: &Identifier,
        title: Option<&str>,
        state: Option<WorkflowState>,
    ) {
        if let Some(item) = self
            .graph
            .module_mut(module_id)
            .and_then(|m| m.items.iter_mut().find(|i| &i.id == item_id))
        {
            if let Some(title) = title {
                item.title = title.to_string();
            }
            if let Some(state) = state {
                item.state = state;
            }
        }

        if let Some(title) = title {
            if let Some(node) = self
                .graph
                .org_node_mut(module_id)
                .and_then(|n| n.children.iter_mut().find(|c| &c.id == item_id))
            {
                node.title = title.to_string();
            }
        }
    }

    /// Move every item referencing the record; the first move is reported
    fn reposition(&mut self, handle: &ContentHandle, requested: usize) -> PositionChange {
        let referencing = self.graph.items_referencing(&handle.primary_resource);
        if referencing.is_empty() {
            info!(content = %handle.content_id, "Record is not in a module, ignoring position");
            return PositionChange::IgnoredUnattached;
        }

        let mut change = PositionChange::Unchanged;
        for (module_id, item_id) in referencing {
            let moved = self
                .graph
                .module_mut(&module_id)
                .and_then(|m| positions::move_where(&mut m.items, |i| i.id == item_id, requested));
            let Some((from, to)) = moved else {
                continue;
            };
            if let Some(mirror) = self.graph.org_node_mut(&module_id) {
                positions::move_where(&mut mirror.children, |n| n.id == item_id, to);
            }
            if change == PositionChange::Unchanged {
                change = PositionChange::Moved { from, to };
            }
        }
        change
    }

    /// Rename, publish or move a module
    #[instrument(skip(self, update), fields(module = %module_id))]
    pub fn update_module(
        &mut self,
        module_id: &Identifier,
        update: ModuleUpdate,
    ) -> Result<UpdateReport> {
        let module = self
            .graph
            .module_mut(module_id)
            .ok_or_else(|| CartridgeError::not_found("module", module_id.as_str()))?;
        let mut report = UpdateReport::new(module_id.clone());

        if let Some(title) = update.title.as_deref().map(str::trim) {
            module.title = title.to_string();
            if let Some(node) = self.graph.org_node_mut(module_id) {
                node.title = title.to_string();
            }
            report.applied.push("title");
        }
        if let Some(published) = update.published {
            if let Some(module) = self.graph.module_mut(module_id) {
                module.state = WorkflowState::from_published(published);
            }
            report.applied.push("published");
        }
        if let Some(requested) = update.position {
            if let Some((from, to)) =
                positions::move_where(&mut self.graph.modules, |m| &m.id == module_id, requested)
            {
                positions::move_where(&mut self.graph.organization, |n| &n.id == module_id, to);
                report.position = PositionChange::Moved { from, to };
            }
        }

        self.flush()?;
        info!(applied = ?report.applied, position = ?report.position, "Updated module");
        Ok(report)
    }

    // ========================================================================
    // Delete
    // ========================================================================

    /// Delete a record, its resources, every item referencing it and its
    /// files on disk
    #[instrument(skip(self))]
    pub fn delete_item(&mut self, reference: &str) -> Result<DeletedContent> {
        let handle = self.locate(reference)?;
        let deleted = self.remove_content(&handle)?;
        self.flush()?;

        info!(
            content = %deleted.content_id,
            items = deleted.items.len(),
            artifacts = deleted.artifacts.len(),
            "Deleted content"
        );
        Ok(deleted)
    }

    /// Delete a module and everything its items reference
    #[instrument(skip(self), fields(module = %module_id))]
    pub fn delete_module(&mut self, module_id: &Identifier) -> Result<Vec<DeletedContent>> {
        let module = self
            .graph
            .module(module_id)
            .ok_or_else(|| CartridgeError::not_found("module", module_id.as_str()))?;
        let references: Vec<Identifier> = module.items.iter().map(|i| i.resource_ref.clone()).collect();

        let mut deleted = Vec::new();
        for resource_id in references {
            match self.graph.locate_by_resource(&resource_id) {
                Some(handle) => deleted.push(self.remove_content(&handle)?),
                None => debug!(resource = %resource_id, "Already removed"),
            }
        }

        positions::remove_where(&mut self.graph.modules, |m| &m.id == module_id);
        positions::remove_where(&mut self.graph.organization, |n| &n.id == module_id);

        self.flush()?;
        info!(records = deleted.len(), "Deleted module");
        Ok(deleted)
    }

    /// Remove a record from the graph and its artifacts from disk, without
    /// flushing
    fn remove_content(&mut self, handle: &ContentHandle) -> Result<DeletedContent> {
        let owned: Vec<Identifier> = self
            .graph
            .ownership()
            .into_iter()
            .find(|(kind, id, _)| *kind == handle.kind && *id == handle.content_id)
            .map(|(_, _, resources)| resources)
            .unwrap_or_else(|| vec![handle.primary_resource.clone()]);

        let mut artifacts: Vec<String> = owned
            .iter()
            .filter_map(|id| self.graph.resource(id))
            .flat_map(templates::resource_files)
            .collect();
        if handle.kind == ContentKind::Quiz {
            let non_cc = paths::non_cc_qti_path(handle.content_id.as_str());
            if !artifacts.contains(&non_cc) {
                artifacts.push(non_cc);
            }
        }

        let graph = &mut self.graph;
        let id = &handle.content_id;
        match handle.kind {
            ContentKind::WikiPage => graph.wiki_pages.retain(|p| &p.id != id),
            ContentKind::Assignment => graph.assignments.retain(|a| &a.id != id),
            ContentKind::Quiz => graph.quizzes.retain(|q| &q.id != id),
            ContentKind::Discussion => graph.discussions.retain(|d| &d.topic_id != id),
            ContentKind::File => graph.files.retain(|f| &f.id != id),
        }
        graph.resources.retain(|r| !owned.contains(&r.id));

        let mut items = Vec::new();
        for (module_id, item_id) in graph.items_referencing(&handle.primary_resource) {
            if let Some(module) = graph.module_mut(&module_id) {
                positions::remove_where(&mut module.items, |i| i.id == item_id);
            }
            if let Some(mirror) = graph.org_node_mut(&module_id) {
                positions::remove_where(&mut mirror.children, |n| n.id == item_id);
            }
            items.push(item_id);
        }

        for artifact in &artifacts {
            remove_path(&self.root, artifact)?;
        }
        prune_record_dirs(&self.root, &artifacts);

        debug!(content = %handle.content_id, kind = %handle.kind, "Removed content");
        Ok(DeletedContent {
            kind: handle.kind,
            content_id: handle.content_id.clone(),
            resources: owned,
            items,
            artifacts,
        })
    }

    // ========================================================================
    // Clone
    // ========================================================================

    /// Copy a record under fresh identifiers, detached or appended to
    /// `target`. Returns the copy's id.
    #[instrument(skip(self))]
    pub fn clone_item(&mut self, reference: &str, target: Option<&Identifier>) -> Result<Identifier> {
        let handle = self.locate(reference)?;
        let (draft, group) = self.copy_draft(&handle)?;
        let draft = prepare(draft)?;
        if let Some(module_id) = target {
            self.resolve_module(module_id)?;
        }

        let title = draft.title().to_string();
        let state = draft.state();
        let copy = self.materialize(draft, target.is_some());

        if let Some(group) = group {
            if let Some(a) = self.graph.assignments.iter_mut().find(|a| a.id == copy.content_id) {
                a.grading_group_id = group.clone();
            }
            if let Some(q) = self.graph.quizzes.iter_mut().find(|q| q.id == copy.content_id) {
                q.grading_group_id = group;
            }
        }

        if let Some(module_id) = target {
            let item = ModuleItem {
                id: Identifier::generate(),
                title,
                kind: copy.kind,
                state,
                resource_ref: copy.primary_resource.clone(),
                position: 0,
            };
            self.insert_item(module_id, item, None)?;
        }

        self.flush()?;
        info!(source = %handle.content_id, copy = %copy.content_id, "Cloned content");
        Ok(copy.content_id)
    }

    /// Draft reproducing a record with a copy title, plus its grading group
    fn copy_draft(&self, handle: &ContentHandle) -> Result<(ContentDraft, Option<Identifier>)> {
        let id = &handle.content_id;
        let missing = || CartridgeError::not_found("content", id.as_str());
        let graph = &self.graph;

        let copied = match handle.kind {
            ContentKind::WikiPage => {
                let page = graph.wiki_page(id).ok_or_else(missing)?;
                let draft = ContentDraft::WikiPage {
                    title: copy_title(&page.title),
                    body: page.body.clone(),
                    published: page.state.is_published(),
                };
                (draft, None)
            }
            ContentKind::Assignment => {
                let a = graph.assignment(id).ok_or_else(missing)?;
                let draft = ContentDraft::Assignment {
                    title: copy_title(&a.title),
                    body: a.body.clone(),
                    points: a.points,
                    published: a.state.is_published(),
                };
                (draft, Some(a.grading_group_id.clone()))
            }
            ContentKind::Quiz => {
                let q = graph.quiz(id).ok_or_else(missing)?;
                let draft = ContentDraft::Quiz {
                    title: copy_title(&q.title),
                    description: q.description.clone(),
                    points: q.points,
                    published: q.state.is_published(),
                };
                (draft, Some(q.grading_group_id.clone()))
            }
            ContentKind::Discussion => {
                let d = graph.discussion(id).ok_or_else(missing)?;
                let draft = ContentDraft::Discussion {
                    title: copy_title(&d.title),
                    body: d.body.clone(),
                    published: d.state.is_published(),
                };
                (draft, None)
            }
            ContentKind::File => {
                let f = graph.file(id).ok_or_else(missing)?;
                (ContentDraft::file(copy_filename(&f.filename), f.content.clone()), None)
            }
        };
        Ok(copied)
    }
}

fn skip_unless(report: &mut UpdateReport, requested: bool, field: &'static str) {
    if requested {
        report.skipped.push(field);
    }
}

/// Remove identifier-named directories left empty by a delete
fn prune_record_dirs(root: &std::path::Path, artifacts: &[String]) {
    for artifact in artifacts {
        let Some(dir) = paths::top_dir(artifact) else {
            continue;
        };
        if paths::PACKAGE_DIRS.contains(&dir) {
            continue;
        }
        // Fails harmlessly while the directory still holds other files
        if let Err(e) = std::fs::remove_dir(root.join(dir)) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(dir, error = %e, "Record directory not removed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn package() -> (TempDir, Cartridge, Identifier) {
        let temp = TempDir::new().unwrap();
        let mut cartridge = Cartridge::create(temp.path().join("pkg"), "Course", "C").unwrap();
        let module = cartridge.add_module("Unit 1", None, true).unwrap();
        (temp, cartridge, module)
    }

    #[test]
    fn test_wiki_rename_moves_file() {
        let (_temp, mut cartridge, module) = package();
        let attached = cartridge
            .attach_item(&module, ContentDraft::wiki_page("Intro", "<p>hi</p>"), None)
            .unwrap();

        let update = ItemUpdate {
            title: Some("Welcome".to_string()),
            ..Default::default()
        };
        cartridge.update_item(attached.content_id.as_str(), update).unwrap();

        let root = cartridge.root();
        assert!(!root.join("wiki_content/intro.html").exists());
        assert!(root.join("wiki_content/welcome.html").exists());

        let graph = cartridge.graph();
        let page = graph.wiki_page(&attached.content_id).unwrap();
        assert_eq!(graph.resource(&page.resource_id).unwrap().href, "wiki_content/welcome.html");
        assert_eq!(graph.modules[0].items[0].title, "Welcome");
        assert_eq!(graph.organization[0].children[0].title, "Welcome");
        assert!(graph.validate().is_empty());
    }

    #[test]
    fn test_file_rename_and_content() {
        let (_temp, mut cartridge, _module) = package();
        let id = cartridge
            .add_standalone(ContentDraft::file("notes.txt", b"v1".to_vec()))
            .unwrap();

        let update = ItemUpdate {
            title: Some("renamed.txt".to_string()),
            content: Some(b"v2".to_vec()),
            ..Default::default()
        };
        cartridge.update_item(id.as_str(), update).unwrap();

        let root = cartridge.root();
        assert!(!root.join("web_resources/notes.txt").exists());
        assert_eq!(std::fs::read(root.join("web_resources/renamed.txt")).unwrap(), b"v2");
    }

    #[test]
    fn test_file_rename_rejects_paths() {
        let (_temp, mut cartridge, _module) = package();
        let id = cartridge
            .add_standalone(ContentDraft::file("notes.txt", b"v1".to_vec()))
            .unwrap();
        let before = cartridge.graph().clone();

        for name in ["../x.txt", "sub/x.txt", "  ", ".."] {
            let update = ItemUpdate {
                title: Some(name.to_string()),
                content: Some(b"v2".to_vec()),
                ..Default::default()
            };
            let err = cartridge.update_item(id.as_str(), update).unwrap_err();
            assert!(matches!(err, CartridgeError::InvalidName { .. }), "{}", name);
        }

        assert_eq!(cartridge.graph(), &before);
        let root = cartridge.root();
        assert_eq!(std::fs::read(root.join("web_resources/notes.txt")).unwrap(), b"v1");
        assert!(!root.join("x.txt").exists());
    }

    #[test]
    fn test_renames_are_trimmed() {
        let (_temp, mut cartridge, module) = package();
        let attached = cartridge
            .attach_item(&module, ContentDraft::quiz("Check", "", 1.0), None)
            .unwrap();

        let update = ItemUpdate {
            title: Some(" Final check\n".to_string()),
            ..Default::default()
        };
        cartridge.update_item(attached.content_id.as_str(), update).unwrap();
        let rename = ModuleUpdate {
            title: Some("\tUnit One ".to_string()),
            ..Default::default()
        };
        cartridge.update_module(&module, rename).unwrap();

        let graph = cartridge.graph();
        assert_eq!(graph.quiz(&attached.content_id).unwrap().title, "Final check");
        assert_eq!(graph.modules[0].title, "Unit One");
        assert_eq!(graph.modules[0].items[0].title, "Final check");
        assert_eq!(graph.organization[0].title, "Unit One");
    }

    #[test]
    fn test_points_on_discussion_are_skipped() {
        let (_temp, mut cartridge, module) = package();
        let attached = cartridge
            .attach_item(&module, ContentDraft::discussion("Talk", "hi"), None)
            .unwrap();

        let report = cartridge
            .update_item(
                attached.content_id.as_str(),
                ItemUpdate {
                    points: Some(5.0),
                    published: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(report.applied, vec!["published"]);
        assert_eq!(report.skipped, vec!["points"]);
        assert_eq!(cartridge.graph().modules[0].items[0].state, WorkflowState::Unpublished);
    }

    #[test]
    fn test_position_on_unattached_record_is_ignored() {
        let (_temp, mut cartridge, _module) = package();
        let id = cartridge
            .add_standalone(ContentDraft::assignment("Essay", "", 10.0))
            .unwrap();

        let report = cartridge
            .update_item(
                id.as_str(),
                ItemUpdate {
                    position: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(report.position, PositionChange::IgnoredUnattached);
    }

    #[test]
    fn test_update_unknown_is_not_found() {
        let (_temp, mut cartridge, _module) = package();
        let err = cartridge.update_item("gmissing", ItemUpdate::default()).unwrap_err();
        assert!(matches!(err, CartridgeError::NotFound { .. }));
    }

    #[test]
    fn test_update_module_title_and_position() {
        let (_temp, mut cartridge, first) = package();
        let second = cartridge.add_module("Unit 2", None, true).unwrap();

        let report = cartridge
            .update_module(
                &second,
                ModuleUpdate {
                    title: Some("Unit Zero".to_string()),
                    position: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(report.position, PositionChange::Moved { from: 2, to: 1 });
        let graph = cartridge.graph();
        assert_eq!(graph.modules[0].id, second);
        assert_eq!(graph.modules[1].id, first);
        assert_eq!(graph.organization[0].title, "Unit Zero");
        assert!(graph.validate().is_empty());
    }

    #[test]
    fn test_delete_quiz_removes_artifacts() {
        let (_temp, mut cartridge, module) = package();
        let attached = cartridge
            .attach_item(&module, ContentDraft::quiz("Check", "desc", 3.0), None)
            .unwrap();
        let id = attached.content_id.clone();
        assert!(cartridge.root().join(paths::non_cc_qti_path(id.as_str())).exists());

        let deleted = cartridge.delete_item(id.as_str()).unwrap();

        assert_eq!(deleted.resources.len(), 2);
        assert_eq!(deleted.items, vec![attached.item_id]);
        let root = cartridge.root();
        assert!(!root.join(id.as_str()).exists());
        assert!(!root.join(paths::non_cc_qti_path(id.as_str())).exists());
        assert!(cartridge.graph().resources.is_empty());
        assert!(cartridge.graph().modules[0].items.is_empty());
    }

    #[test]
    fn test_clone_file_gets_copy_name() {
        let (_temp, mut cartridge, module) = package();
        let id = cartridge
            .add_standalone(ContentDraft::file("notes.txt", b"x".to_vec()))
            .unwrap();

        let copy = cartridge.clone_item(id.as_str(), Some(&module)).unwrap();

        let file = cartridge.graph().file(&copy).unwrap();
        assert_eq!(file.filename, "notes (Copy).txt");
        assert_eq!(file.path, "web_resources/notes (Copy).txt");
        assert_eq!(cartridge.graph().modules[0].items[0].title, "notes (Copy).txt");
        assert!(cartridge.root().join("web_resources/notes (Copy).txt").exists());
    }
}
