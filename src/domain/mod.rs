//! Domain types for the cartridge content graph.
//!
//! This module contains the core data structures:
//! - Identifiers: XML-safe random tokens
//! - Content: content-type tags, publication and resource types
//! - Payload: typed records (pages, assignments, quizzes, discussions, files)
//! - Graph: modules, organization mirror, resources and invariants

pub mod content;
pub mod graph;
pub mod ids;
pub mod payload;

// Re-export commonly used types
pub use content::{ContentKind, ResourceType, WorkflowState};
pub use graph::{
    ContentGraph, ContentHandle, CourseInfo, InvariantViolation, Module, ModuleItem,
    OrganizationNode, PassthroughResource, Positioned, Resource,
};
pub use ids::Identifier;
pub use payload::{Assignment, ContentDraft, Discussion, FileAsset, Quiz, WikiPage};
