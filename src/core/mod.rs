//! Mutation engine.
//!
//! This module contains:
//! - Cartridge: package lifecycle plus create/update/delete/clone operations
//! - Details: a flattened read-only view of one record
//! - Positions: the dense 1..N ordering shared by modules, items and the
//!   organization tree
//! - Errors: the library error type

pub mod details;
pub mod edit;
pub mod engine;
pub mod error;
pub mod positions;

// Re-export commonly used types
pub use details::{Placement, RecordDetails};
pub use edit::{DeletedContent, ItemUpdate, ModuleUpdate, PositionChange, UpdateReport};
pub use engine::{AttachedItem, Cartridge};
pub use error::{CartridgeError, Result};
