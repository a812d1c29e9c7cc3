//! Render the full content graph to disk.
//!
//! Serialization is total: the manifest, module metadata and every payload
//! artifact are rewritten on each call. Artifacts orphaned by a mutation are
//! removed by that mutation, not here.

use std::path::Path;

use tracing::{debug, instrument};

use crate::config::paths;
use crate::core::error::{CartridgeError, Result};
use crate::domain::{ContentGraph, Identifier};

use super::templates;

/// Write `content` to a package-relative path, creating parent directories
pub fn write_file(root: &Path, relative: &str, content: &[u8]) -> Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(CartridgeError::io(parent))?;
    }
    std::fs::write(&path, content).map_err(CartridgeError::io(&path))
}

/// Remove a package-relative file or directory; missing paths are fine
pub fn remove_path(root: &Path, relative: &str) -> Result<()> {
    let path = root.join(relative);
    let result = if path.is_dir() {
        std::fs::remove_dir_all(&path)
    } else {
        std::fs::remove_file(&path)
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CartridgeError::Io { path, source: e }),
    }
}

/// Move a package-relative file, creating the target's parent directory
pub fn move_file(root: &Path, from: &str, to: &str) -> Result<()> {
    let target = root.join(to);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(CartridgeError::io(parent))?;
    }
    std::fs::rename(root.join(from), &target).map_err(CartridgeError::io(&target))
}

fn href_or(graph: &ContentGraph, id: &Identifier, fallback: impl FnOnce() -> String) -> String {
    graph
        .resource(id)
        .map(|r| r.href.clone())
        .unwrap_or_else(fallback)
}

/// Position of the first item referencing a resource, if attached
fn item_position(graph: &ContentGraph, resource_id: &Identifier) -> Option<usize> {
    graph
        .modules
        .iter()
        .flat_map(|m| m.items.iter())
        .find(|i| &i.resource_ref == resource_id)
        .map(|i| i.position)
}

/// Serialize the whole graph into `root`
#[instrument(skip_all, fields(root = %root.display()))]
pub fn serialize(root: &Path, graph: &ContentGraph) -> Result<()> {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    write_file(
        root,
        paths::MANIFEST_FILE,
        templates::manifest(graph, &date).as_bytes(),
    )?;
    write_file(
        root,
        paths::MODULE_META_FILE,
        templates::module_meta(&graph.modules).as_bytes(),
    )?;

    for page in &graph.wiki_pages {
        write_file(root, &page.filename, templates::wiki_page_html(page).as_bytes())?;
    }

    for (index, assignment) in graph.assignments.iter().enumerate() {
        let href = href_or(graph, &assignment.id, || {
            paths::assignment_href(assignment.id.as_str())
        });
        write_file(
            root,
            &paths::assignment_settings_path(&href),
            templates::assignment_settings(assignment, index + 1).as_bytes(),
        )?;
        write_file(root, &href, templates::assignment_html(assignment).as_bytes())?;
    }

    for (index, quiz) in graph.quizzes.iter().enumerate() {
        let qti_href = href_or(graph, &quiz.id, || paths::assessment_qti_path(quiz.id.as_str()));
        let meta_href = href_or(graph, &quiz.meta_resource_id, || {
            paths::assessment_meta_path(quiz.id.as_str())
        });
        let qti = templates::quiz_qti(quiz);

        write_file(root, &meta_href, templates::quiz_meta(quiz, index + 1).as_bytes())?;
        write_file(root, &qti_href, qti.as_bytes())?;
        write_file(root, &paths::non_cc_qti_path(quiz.id.as_str()), qti.as_bytes())?;
    }

    for discussion in &graph.discussions {
        let attached = graph.is_attached(&discussion.topic_id);
        let topic_href = href_or(graph, &discussion.topic_id, || {
            paths::discussion_path(discussion.topic_id.as_str(), attached)
        });
        let meta_href = href_or(graph, &discussion.meta_id, || {
            paths::discussion_path(discussion.meta_id.as_str(), attached)
        });
        let position = item_position(graph, &discussion.topic_id);

        write_file(root, &topic_href, templates::discussion_topic(discussion).as_bytes())?;
        write_file(
            root,
            &meta_href,
            templates::discussion_meta(discussion, position).as_bytes(),
        )?;
    }

    for file in &graph.files {
        write_file(root, &file.path, &file.content)?;
    }

    debug!(
        modules = graph.modules.len(),
        resources = graph.resources.len(),
        records = graph.record_count(),
        "Serialized package"
    );
    Ok(())
}
