//! Package lifecycle and content creation.
//!
//! A [`Cartridge`] owns the in-memory graph of one package directory. Every
//! mutation edits the graph, then [`Cartridge::flush`] writes the whole
//! package and rescans it so the component index always describes what is on
//! disk.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::config::paths;
use crate::domain::payload::{slugify, wiki_filename};
use crate::domain::{
    Assignment, ContentDraft, ContentGraph, ContentHandle, ContentKind, CourseInfo, Discussion,
    FileAsset, Identifier, Module, ModuleItem, OrganizationNode, Quiz, Resource, ResourceType,
    WikiPage, WorkflowState,
};
use crate::package::{boilerplate, hydrate, scan, serialize, ComponentIndex, ComponentKind};

use super::error::{CartridgeError, Result};
use super::positions;

/// Where an attached record landed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedItem {
    pub item_id: Identifier,
    pub content_id: Identifier,
    pub position: usize,
}

/// An editable package on disk
pub struct Cartridge {
    pub(crate) root: PathBuf,
    pub(crate) graph: ContentGraph,
    pub(crate) index: ComponentIndex,
}

impl Cartridge {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Create a new, empty package in `dir`, replacing anything already there
    #[instrument(skip_all, fields(dir = %dir.as_ref().display(), title = %title))]
    pub fn create(dir: impl AsRef<Path>, title: &str, code: &str) -> Result<Self> {
        let root = dir.as_ref().to_path_buf();

        if root.exists() {
            warn!("Target directory exists, replacing its contents");
            std::fs::remove_dir_all(&root).map_err(CartridgeError::io(&root))?;
        }
        for sub in paths::PACKAGE_DIRS {
            let path = root.join(sub);
            std::fs::create_dir_all(&path).map_err(CartridgeError::io(&path))?;
        }

        let course = CourseInfo::new(title, code);
        boilerplate::write_boilerplate(&root, &course)?;

        let mut cartridge = Self {
            index: ComponentIndex::new(root.clone(), Vec::new()),
            graph: ContentGraph::new(course),
            root,
        };
        cartridge.flush()?;

        info!(course = %cartridge.graph.course.id, "Created package");
        Ok(cartridge)
    }

    /// Open an existing package and rebuild its graph
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let root = dir.as_ref().to_path_buf();
        let index = scan(&root)?;
        let graph = hydrate(&index)?;

        info!(
            modules = graph.modules.len(),
            records = graph.record_count(),
            "Opened package"
        );
        Ok(Self { root, graph, index })
    }

    /// Write the full graph to disk, then refresh the index from what was written
    pub fn flush(&mut self) -> Result<()> {
        serialize(&self.root, &self.graph)?;
        self.index = scan(&self.root)?;
        debug!(components = self.index.len(), "Flushed package");
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn graph(&self) -> &ContentGraph {
        &self.graph
    }

    /// Index of the package as last written
    pub fn index(&self) -> &ComponentIndex {
        &self.index
    }

    // ========================================================================
    // Modules
    // ========================================================================

    /// Add a module, appended or at a clamped position
    #[instrument(skip(self))]
    pub fn add_module(
        &mut self,
        title: &str,
        position: Option<usize>,
        published: bool,
    ) -> Result<Identifier> {
        let module = Module {
            id: Identifier::generate(),
            title: title.trim().to_string(),
            position: 0,
            state: WorkflowState::from_published(published),
            items: Vec::new(),
        };
        let id = module.id.clone();
        let node = OrganizationNode::for_module(&module);

        let landed = positions::insert_at(&mut self.graph.modules, module, position);
        positions::insert_at(&mut self.graph.organization, node, Some(landed));

        self.flush()?;
        info!(module = %id, position = landed, "Added module");
        Ok(id)
    }

    /// Make sure a module exists in the graph, recovering it from the last
    /// scanned index when only the disk knows about it
    pub(crate) fn resolve_module(&mut self, module_id: &Identifier) -> Result<()> {
        if self.graph.module(module_id).is_some() {
            return Ok(());
        }

        let row = self
            .index
            .find(ComponentKind::Module, module_id.as_str())
            .or_else(|| self.index.find(ComponentKind::ModuleOrg, module_id.as_str()))
            .ok_or_else(|| CartridgeError::not_found("module", module_id.as_str()))?;

        let module = Module {
            id: module_id.clone(),
            title: row.title.clone().unwrap_or_default(),
            position: 0,
            state: WorkflowState::Unpublished,
            items: Vec::new(),
        };
        let node = OrganizationNode::for_module(&module);
        let landed = positions::insert_at(&mut self.graph.modules, module, None);
        positions::insert_at(&mut self.graph.organization, node, Some(landed));

        warn!(module = %module_id, "Recovered module from package index");
        Ok(())
    }

    // ========================================================================
    // Content
    // ========================================================================

    /// Create a record and reference it from a module
    #[instrument(skip(self, draft), fields(module = %module_id, kind = %draft.kind()))]
    pub fn attach_item(
        &mut self,
        module_id: &Identifier,
        draft: ContentDraft,
        position: Option<usize>,
    ) -> Result<AttachedItem> {
        let draft = prepare(draft)?;
        self.resolve_module(module_id)?;

        let title = draft.title().to_string();
        let state = draft.state();
        let handle = self.materialize(draft, true);

        let item = ModuleItem {
            id: Identifier::generate(),
            title,
            kind: handle.kind,
            state,
            resource_ref: handle.primary_resource.clone(),
            position: 0,
        };
        let item_id = item.id.clone();
        let landed = self.insert_item(module_id, item, position)?;

        self.flush()?;
        info!(item = %item_id, content = %handle.content_id, position = landed, "Attached item");
        Ok(AttachedItem {
            item_id,
            content_id: handle.content_id,
            position: landed,
        })
    }

    /// Create a record that no module references
    #[instrument(skip(self, draft), fields(kind = %draft.kind()))]
    pub fn add_standalone(&mut self, draft: ContentDraft) -> Result<Identifier> {
        let draft = prepare(draft)?;
        let handle = self.materialize(draft, false);
        self.flush()?;
        info!(content = %handle.content_id, "Added standalone content");
        Ok(handle.content_id)
    }

    /// Insert an item into a module and its organization node at the same
    /// position
    pub(crate) fn insert_item(
        &mut self,
        module_id: &Identifier,
        item: ModuleItem,
        position: Option<usize>,
    ) -> Result<usize> {
        let node = OrganizationNode::for_item(&item);

        let module = self
            .graph
            .module_mut(module_id)
            .ok_or_else(|| CartridgeError::not_found("module", module_id.as_str()))?;
        let landed = positions::insert_at(&mut module.items, item, position);

        let mirror = self
            .graph
            .org_node_mut(module_id)
            .ok_or_else(|| CartridgeError::not_found("organization node", module_id.as_str()))?;
        positions::insert_at(&mut mirror.children, node, Some(landed));

        Ok(landed)
    }

    /// Allocate identifiers, resources and the payload record for a draft
    pub(crate) fn materialize(&mut self, draft: ContentDraft, in_module: bool) -> ContentHandle {
        let graph = &mut self.graph;

        match draft {
            ContentDraft::WikiPage {
                title,
                body,
                published,
            } => {
                let filename = unique_wiki_filename(graph, &title, None);
                let page = WikiPage {
                    id: Identifier::generate(),
                    resource_id: Identifier::generate(),
                    title,
                    body,
                    state: WorkflowState::from_published(published),
                    filename: filename.clone(),
                };
                graph.resources.push(Resource {
                    id: page.resource_id.clone(),
                    kind: ResourceType::WebContent,
                    href: filename,
                    dependency: None,
                });

                let handle = ContentHandle {
                    kind: ContentKind::WikiPage,
                    content_id: page.id.clone(),
                    primary_resource: page.resource_id.clone(),
                };
                graph.wiki_pages.push(page);
                handle
            }

            ContentDraft::Assignment {
                title,
                body,
                points,
                published,
            } => {
                let id = Identifier::generate();
                graph.resources.push(Resource {
                    id: id.clone(),
                    kind: ResourceType::LearningApplication,
                    href: paths::assignment_href(id.as_str()),
                    dependency: None,
                });
                graph.assignments.push(Assignment {
                    id: id.clone(),
                    title,
                    body,
                    points,
                    state: WorkflowState::from_published(published),
                    grading_group_id: graph.course.grading_group_id.clone(),
                });
                primary_handle(ContentKind::Assignment, id)
            }

            ContentDraft::Quiz {
                title,
                description,
                points,
                published,
            } => {
                let id = Identifier::generate();
                let meta_id = Identifier::generate();
                graph.resources.push(Resource {
                    id: id.clone(),
                    kind: ResourceType::QtiAssessment,
                    href: paths::assessment_qti_path(id.as_str()),
                    dependency: Some(meta_id.clone()),
                });
                graph.resources.push(Resource {
                    id: meta_id.clone(),
                    kind: ResourceType::LearningApplication,
                    href: paths::assessment_meta_path(id.as_str()),
                    dependency: None,
                });
                graph.quizzes.push(Quiz {
                    id: id.clone(),
                    title,
                    description,
                    points,
                    state: WorkflowState::from_published(published),
                    grading_group_id: graph.course.grading_group_id.clone(),
                    assignment_id: Identifier::generate(),
                    question_id: Identifier::generate(),
                    assessment_question_id: Identifier::generate(),
                    meta_resource_id: meta_id,
                });
                primary_handle(ContentKind::Quiz, id)
            }

            ContentDraft::Discussion {
                title,
                body,
                published,
            } => {
                let topic_id = Identifier::generate();
                let meta_id = Identifier::generate();
                graph.resources.push(Resource {
                    id: topic_id.clone(),
                    kind: ResourceType::DiscussionTopic,
                    href: paths::discussion_path(topic_id.as_str(), in_module),
                    dependency: Some(meta_id.clone()),
                });
                graph.resources.push(Resource {
                    id: meta_id.clone(),
                    kind: ResourceType::LearningApplication,
                    href: paths::discussion_path(meta_id.as_str(), in_module),
                    dependency: None,
                });
                graph.discussions.push(Discussion {
                    topic_id: topic_id.clone(),
                    meta_id,
                    title,
                    body,
                    state: WorkflowState::from_published(published),
                });
                primary_handle(ContentKind::Discussion, topic_id)
            }

            ContentDraft::File { filename, content } => {
                let id = Identifier::generate();
                let path = FileAsset::storage_path(&filename);
                if graph.files.iter().any(|f| f.path == path) {
                    warn!(path = %path, "Another file already uses this name");
                }
                graph.resources.push(Resource {
                    id: id.clone(),
                    kind: ResourceType::WebContent,
                    href: path.clone(),
                    dependency: None,
                });
                graph.files.push(FileAsset {
                    id: id.clone(),
                    filename,
                    content,
                    path,
                });
                primary_handle(ContentKind::File, id)
            }
        }
    }
}

/// Trim the draft's title and reject file names that cannot live under
/// `web_resources/`
pub(crate) fn prepare(draft: ContentDraft) -> Result<ContentDraft> {
    let draft = draft.normalized();
    if let ContentDraft::File { filename, .. } = &draft {
        check_filename(filename)?;
    }
    Ok(draft)
}

pub(crate) fn check_filename(name: &str) -> Result<()> {
    match paths::segment_problem(name) {
        Some(reason) => Err(CartridgeError::invalid_name(name, reason)),
        None => Ok(()),
    }
}

fn primary_handle(kind: ContentKind, id: Identifier) -> ContentHandle {
    ContentHandle {
        kind,
        content_id: id.clone(),
        primary_resource: id,
    }
}

/// Wiki filename for a title, suffixed `-2`, `-3`, ... past other pages'
/// filenames (`exclude` is the page being renamed)
pub(crate) fn unique_wiki_filename(
    graph: &ContentGraph,
    title: &str,
    exclude: Option<&Identifier>,
) -> String {
    let slug = slugify(title);
    let taken = |candidate: &str| {
        graph
            .wiki_pages
            .iter()
            .any(|p| Some(&p.id) != exclude && p.filename == candidate)
    };

    let mut suffix = 1;
    loop {
        let candidate = wiki_filename(&slug, suffix);
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
