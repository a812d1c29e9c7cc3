//! Invariant Integration Tests
//!
//! Every mutation must leave positions dense, the organization tree in step
//! with the module list, dependency pairs intact and no dangling references.

use cartridge::domain::{ContentGraph, InvariantViolation, OrganizationNode};
use cartridge::{Cartridge, CartridgeError, ContentDraft, Identifier, ItemUpdate, ModuleUpdate};
use tempfile::TempDir;

fn assert_consistent(graph: &ContentGraph) {
    let violations = graph.validate();
    assert!(violations.is_empty(), "violations: {:#?}", violations);
}

/// A package with two modules holding one record of every kind
fn populated(temp: &TempDir) -> (Cartridge, Identifier, Identifier) {
    let mut cartridge = Cartridge::create(temp.path().join("course"), "Course", "C1").unwrap();
    let first = cartridge.add_module("Unit 1", None, true).unwrap();
    let second = cartridge.add_module("Unit 2", None, false).unwrap();

    cartridge
        .attach_item(&first, ContentDraft::wiki_page("Intro", "<p>hi</p>"), None)
        .unwrap();
    cartridge
        .attach_item(&first, ContentDraft::assignment("Essay", "<p>Write</p>", 20.0), None)
        .unwrap();
    cartridge
        .attach_item(&first, ContentDraft::quiz("Check", "Quick check", 2.0), Some(1))
        .unwrap();
    cartridge
        .attach_item(&second, ContentDraft::discussion("Talk", "<p>Discuss</p>"), None)
        .unwrap();
    cartridge
        .attach_item(&second, ContentDraft::file("data.csv", b"a,b\n1,2\n".to_vec()), Some(99))
        .unwrap();

    (cartridge, first, second)
}

#[test]
fn test_every_mutation_keeps_graph_consistent() {
    let temp = TempDir::new().unwrap();
    let (mut cartridge, first, second) = populated(&temp);
    assert_consistent(cartridge.graph());

    let quiz_id = cartridge.graph().quizzes[0].id.clone();
    cartridge
        .update_item(
            quiz_id.as_str(),
            ItemUpdate {
                title: Some("Checkpoint".to_string()),
                position: Some(3),
                ..Default::default()
            },
        )
        .unwrap();
    assert_consistent(cartridge.graph());

    cartridge
        .update_module(
            &second,
            ModuleUpdate {
                position: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
    assert_consistent(cartridge.graph());

    let page_id = cartridge.graph().wiki_pages[0].id.clone();
    cartridge.clone_item(page_id.as_str(), Some(&second)).unwrap();
    assert_consistent(cartridge.graph());

    cartridge.delete_item(page_id.as_str()).unwrap();
    assert_consistent(cartridge.graph());

    cartridge.delete_module(&first).unwrap();
    assert_consistent(cartridge.graph());
}

#[test]
fn test_positions_dense_after_inserts_and_deletes() {
    let temp = TempDir::new().unwrap();
    let (mut cartridge, first, _second) = populated(&temp);

    let order: Vec<String> = cartridge.graph().module(&first).unwrap().items.iter().map(|i| i.title.clone()).collect();
    assert_eq!(order, vec!["Check", "Intro", "Essay"]);

    let essay = cartridge.graph().assignments[0].id.clone();
    cartridge
        .attach_item(&first, ContentDraft::wiki_page("Middle", ""), Some(2))
        .unwrap();
    cartridge.delete_item(essay.as_str()).unwrap();

    let module = cartridge.graph().module(&first).unwrap();
    let positions: Vec<usize> = module.items.iter().map(|i| i.position).collect();
    assert_eq!(positions, vec![1, 2, 3]);
    let titles: Vec<&str> = module.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Check", "Middle", "Intro"]);
}

#[test]
fn test_mirror_matches_module_tree() {
    let temp = TempDir::new().unwrap();
    let (cartridge, _first, _second) = populated(&temp);
    let graph = cartridge.graph();

    let expected: Vec<OrganizationNode> = graph.modules.iter().map(OrganizationNode::for_module).collect();
    assert_eq!(graph.organization, expected);
}

#[test]
fn test_dependency_pairs() {
    let temp = TempDir::new().unwrap();
    let (cartridge, _first, _second) = populated(&temp);
    let graph = cartridge.graph();

    let quiz = &graph.quizzes[0];
    assert_eq!(
        graph.resource(&quiz.id).unwrap().dependency.as_ref(),
        Some(&quiz.meta_resource_id)
    );

    let discussion = &graph.discussions[0];
    assert_eq!(
        graph.resource(&discussion.topic_id).unwrap().dependency.as_ref(),
        Some(&discussion.meta_id)
    );

    let with_dependency = graph.resources.iter().filter(|r| r.dependency.is_some()).count();
    assert_eq!(with_dependency, 2);
}

#[test]
fn test_cascading_delete_leaves_no_references() {
    let temp = TempDir::new().unwrap();
    let (mut cartridge, first, second) = populated(&temp);

    // A copy in the second module outlives the first module
    let quiz_id = cartridge.graph().quizzes[0].id.clone();
    let copy = cartridge.clone_item(quiz_id.as_str(), Some(&second)).unwrap();

    let deleted = cartridge.delete_module(&first).unwrap();
    assert_eq!(deleted.len(), 3);

    let graph = cartridge.graph();
    assert!(graph.quiz(&quiz_id).is_none());
    assert!(graph.quiz(&copy).is_some());
    assert!(graph.wiki_pages.is_empty());
    assert!(graph.assignments.is_empty());
    assert_eq!(graph.modules.len(), 1);
    assert_eq!(graph.modules[0].position, 1);
    for module in &graph.modules {
        for item in &module.items {
            assert!(graph.resource(&item.resource_ref).is_some());
        }
    }
    assert_consistent(graph);
}

#[test]
fn test_validate_reports_broken_graph() {
    let temp = TempDir::new().unwrap();
    let (cartridge, _first, _second) = populated(&temp);
    let mut graph = cartridge.graph().clone();

    graph.modules[0].items[0].position = 7;
    let meta_id = graph.quizzes[0].meta_resource_id.clone();
    graph.resources.retain(|r| r.id != meta_id);

    let violations = graph.validate();
    assert!(violations
        .iter()
        .any(|v| matches!(v, InvariantViolation::SparsePositions { .. })));
    assert!(violations
        .iter()
        .any(|v| matches!(v, InvariantViolation::MirrorMismatch { .. })));
    assert!(violations
        .iter()
        .any(|v| matches!(v, InvariantViolation::MissingDependency { .. })));
    assert!(violations
        .iter()
        .any(|v| matches!(v, InvariantViolation::OwnershipCount { .. })));
}

#[test]
fn test_invalid_file_names_are_rejected_before_any_change() {
    let temp = TempDir::new().unwrap();
    let (mut cartridge, first, _second) = populated(&temp);
    let graph = cartridge.graph().clone();
    let files = cartridge.index().files().len();

    for name in ["", "   ", "../../escaped.txt", "a/b.txt", "a\\b.txt", ".."] {
        let err = cartridge
            .attach_item(&first, ContentDraft::file(name, b"x".to_vec()), None)
            .unwrap_err();
        assert!(matches!(err, CartridgeError::InvalidName { .. }), "{:?}", name);

        let err = cartridge
            .add_standalone(ContentDraft::file(name, b"x".to_vec()))
            .unwrap_err();
        assert!(matches!(err, CartridgeError::InvalidName { .. }), "{:?}", name);
    }

    // Unknown modules are not recovered for a draft that cannot be written
    let err = cartridge
        .attach_item(&Identifier::new("gnope"), ContentDraft::file("..", b"x".to_vec()), None)
        .unwrap_err();
    assert!(matches!(err, CartridgeError::InvalidName { .. }));

    let data = cartridge.graph().files[0].id.clone();
    let rename = ItemUpdate {
        title: Some("../x.csv".to_string()),
        ..Default::default()
    };
    let err = cartridge.update_item(data.as_str(), rename).unwrap_err();
    assert!(matches!(err, CartridgeError::InvalidName { .. }));

    assert_eq!(cartridge.graph(), &graph);
    assert_eq!(cartridge.index().files().len(), files);
    assert!(!temp.path().join("escaped.txt").exists());
    assert!(!temp.path().join("x.csv").exists());

    // The package stays writable
    cartridge.add_module("Unit 3", None, true).unwrap();
    let copy = cartridge.clone_item(data.as_str(), Some(&first)).unwrap();
    assert_eq!(cartridge.graph().file(&copy).unwrap().filename, "data (Copy).csv");
    assert_consistent(cartridge.graph());

    let reopened = Cartridge::open(cartridge.root()).unwrap();
    assert_eq!(reopened.graph(), cartridge.graph());
}
