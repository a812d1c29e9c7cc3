//! cartridge - Course cartridge graph engine
//!
//! Builds and edits online-course content packages ("cartridges"): a
//! directory tree of HTML and XML documents indexed by an `imsmanifest.xml`.
//!
//! # Architecture
//!
//! The package is held as an in-memory content graph:
//! - Modules hold ordered items; the manifest organization tree mirrors them
//! - Items reference resources; quizzes and discussions own a dependency pair
//! - Every mutation rewrites the whole package, then rescans it
//!
//! Opening an existing package scans it into a flat component index and
//! hydrates a graph from that index, so exported content can be edited again.
//!
//! # Modules
//!
//! - `domain`: Data structures (identifiers, records, the content graph)
//! - `core`: Mutation engine and the shared position algorithm
//! - `package`: Serializer, scanner and hydrator for the on-disk format
//! - `config`: Configuration and package layout names
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Create a package and add a page to a module
//! cartridge --package ./export init --title "Biology" --code BIO101
//! cartridge --package ./export add-module "Unit 1"
//! cartridge --package ./export add page "Intro" --module "Unit 1" --body "<p>hi</p>"
//!
//! # Inspect it
//! cartridge --package ./export list
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod package;

// Re-export main types at crate root for convenience
pub use core::{
    AttachedItem, Cartridge, CartridgeError, DeletedContent, ItemUpdate, ModuleUpdate,
    Placement, PositionChange, RecordDetails, UpdateReport,
};
pub use domain::{ContentDraft, ContentGraph, ContentKind, Identifier, WorkflowState};
pub use package::{Component, ComponentIndex, ComponentKind};
