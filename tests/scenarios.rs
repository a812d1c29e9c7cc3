//! Scenario Integration Tests
//!
//! End-to-end edits against a package on disk: create, attach, reorder,
//! delete and clone.

use cartridge::config::paths;
use cartridge::domain::{ContentKind, ResourceType};
use cartridge::{Cartridge, ContentDraft, ComponentKind, Identifier, ItemUpdate, PositionChange};
use tempfile::TempDir;

fn new_package(temp: &TempDir) -> Cartridge {
    Cartridge::create(temp.path().join("course"), "Biology", "BIO101").unwrap()
}

#[test]
fn test_attach_wiki_page_to_new_module() {
    let temp = TempDir::new().unwrap();
    let mut cartridge = new_package(&temp);

    let module_id = cartridge.add_module("Unit 1", None, true).unwrap();
    let attached = cartridge
        .attach_item(&module_id, ContentDraft::wiki_page("Intro", "<p>hi</p>"), None)
        .unwrap();

    let graph = cartridge.graph();
    assert_eq!(graph.modules.len(), 1);
    assert_eq!(graph.modules[0].items.len(), 1);

    let item = &graph.modules[0].items[0];
    assert_eq!(item.kind, ContentKind::WikiPage);
    assert_eq!(item.position, 1);
    assert_eq!(item.id, attached.item_id);

    assert_eq!(graph.resources.len(), 1);
    let resource = &graph.resources[0];
    assert_eq!(resource.kind, ResourceType::WebContent);
    assert_eq!(resource.href, "wiki_content/intro.html");
    assert_eq!(item.resource_ref, resource.id);

    let html = std::fs::read_to_string(cartridge.root().join("wiki_content/intro.html")).unwrap();
    assert!(html.contains("<p>hi</p>"));
    assert!(html.contains("<title>Intro</title>"));

    // The rescanned index sees the new module and page
    let index = cartridge.index();
    assert!(index.find(ComponentKind::Module, module_id.as_str()).is_some());
    assert_eq!(index.titles(ComponentKind::WikiPage), vec!["Intro"]);
}

#[test]
fn test_move_third_item_to_front() {
    let temp = TempDir::new().unwrap();
    let mut cartridge = new_package(&temp);
    let module_id = cartridge.add_module("Unit 1", None, true).unwrap();

    let mut items = Vec::new();
    for title in ["One", "Two", "Three"] {
        let attached = cartridge
            .attach_item(&module_id, ContentDraft::wiki_page(title, ""), None)
            .unwrap();
        items.push(attached);
    }

    let report = cartridge
        .update_item(
            items[2].content_id.as_str(),
            ItemUpdate {
                position: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(report.position, PositionChange::Moved { from: 3, to: 1 });

    let graph = cartridge.graph();
    let order: Vec<&Identifier> = graph.modules[0].items.iter().map(|i| &i.id).collect();
    assert_eq!(order, vec![&items[2].item_id, &items[0].item_id, &items[1].item_id]);

    let positions: Vec<usize> = graph.modules[0].items.iter().map(|i| i.position).collect();
    assert_eq!(positions, vec![1, 2, 3]);

    let mirror: Vec<(&Identifier, usize)> = graph.organization[0]
        .children
        .iter()
        .map(|n| (&n.id, n.position))
        .collect();
    let expected: Vec<(&Identifier, usize)> = graph.modules[0]
        .items
        .iter()
        .map(|i| (&i.id, i.position))
        .collect();
    assert_eq!(mirror, expected);
}

#[test]
fn test_quiz_owns_dependency_pair() {
    let temp = TempDir::new().unwrap();
    let mut cartridge = new_package(&temp);
    let module_id = cartridge.add_module("Unit 1", None, true).unwrap();

    let attached = cartridge
        .attach_item(&module_id, ContentDraft::quiz("Check", "Warm-up", 5.0), None)
        .unwrap();

    let graph = cartridge.graph();
    assert_eq!(graph.resources.len(), 2);

    let quiz = graph.quiz(&attached.content_id).unwrap();
    let primary = graph.resource(&quiz.id).unwrap();
    assert_eq!(primary.kind, ResourceType::QtiAssessment);
    assert_eq!(primary.dependency.as_ref(), Some(&quiz.meta_resource_id));

    let meta = graph.resource(&quiz.meta_resource_id).unwrap();
    assert_eq!(meta.kind, ResourceType::LearningApplication);
    assert!(meta.dependency.is_none());

    let root = cartridge.root();
    assert!(root.join(paths::assessment_meta_path(quiz.id.as_str())).is_file());
    assert!(root.join(paths::assessment_qti_path(quiz.id.as_str())).is_file());
    assert!(root.join(paths::non_cc_qti_path(quiz.id.as_str())).is_file());
}

#[test]
fn test_delete_module_cascades() {
    let temp = TempDir::new().unwrap();
    let mut cartridge = new_package(&temp);
    let module_id = cartridge.add_module("Unit 1", None, true).unwrap();

    let assignment = cartridge
        .attach_item(&module_id, ContentDraft::assignment("Essay", "<p>Write</p>", 25.0), None)
        .unwrap();
    let file = cartridge
        .attach_item(&module_id, ContentDraft::file("notes.txt", b"hello".to_vec()), None)
        .unwrap();

    let root = cartridge.root().to_path_buf();
    assert!(root.join(assignment.content_id.as_str()).join("assignment.html").is_file());
    assert!(root.join("web_resources/notes.txt").is_file());

    let deleted = cartridge.delete_module(&module_id).unwrap();
    assert_eq!(deleted.len(), 2);

    let graph = cartridge.graph();
    assert!(graph.assignments.is_empty());
    assert!(graph.files.is_empty());
    assert!(graph.resources.is_empty());
    assert!(graph.module(&module_id).is_none());
    assert!(graph.organization.iter().all(|n| n.id != module_id));

    assert!(!root.join(assignment.content_id.as_str()).exists());
    assert!(!root.join("web_resources/notes.txt").exists());
    assert!(cartridge
        .index()
        .find(ComponentKind::Module, module_id.as_str())
        .is_none());
}

#[test]
fn test_clone_wiki_page_into_other_module() {
    let temp = TempDir::new().unwrap();
    let mut cartridge = new_package(&temp);
    let first = cartridge.add_module("Unit 1", None, true).unwrap();
    let second = cartridge.add_module("Unit 2", None, true).unwrap();

    let original = cartridge
        .attach_item(&first, ContentDraft::wiki_page("Intro", "<p>hi</p>"), None)
        .unwrap();
    let before = cartridge.graph().wiki_page(&original.content_id).unwrap().clone();

    let copy_id = cartridge
        .clone_item(original.content_id.as_str(), Some(&second))
        .unwrap();

    let graph = cartridge.graph();
    let copy = graph.wiki_page(&copy_id).unwrap();
    assert_ne!(copy.id, before.id);
    assert_ne!(copy.resource_id, before.resource_id);
    assert_eq!(copy.title, "Intro (Copy)");
    assert_eq!(copy.body, before.body);
    assert_eq!(copy.filename, "wiki_content/intro-copy.html");

    // Original untouched
    assert_eq!(graph.wiki_page(&original.content_id), Some(&before));
    assert_eq!(graph.module(&first).unwrap().items.len(), 1);

    let target = graph.module(&second).unwrap();
    assert_eq!(target.items.len(), 1);
    assert_eq!(target.items[0].resource_ref, copy.resource_id);
    assert_eq!(target.items[0].title, "Intro (Copy)");
    assert!(cartridge.root().join("wiki_content/intro-copy.html").is_file());
    assert!(graph.validate().is_empty());
}

#[test]
fn test_unattached_position_request_is_noop() {
    let temp = TempDir::new().unwrap();
    let mut cartridge = new_package(&temp);
    let module_id = cartridge.add_module("Unit 1", None, true).unwrap();
    cartridge
        .attach_item(&module_id, ContentDraft::wiki_page("Attached", ""), None)
        .unwrap();
    let loose = cartridge
        .add_standalone(ContentDraft::wiki_page("Loose", ""))
        .unwrap();
    let before = cartridge.graph().modules.clone();

    let report = cartridge
        .update_item(
            loose.as_str(),
            ItemUpdate {
                position: Some(1),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(report.position, PositionChange::IgnoredUnattached);
    assert_eq!(cartridge.graph().modules, before);
}
