//! On-disk package: templates, serialization, scanning and hydration.

pub mod boilerplate;
pub mod html;
pub mod hydrator;
pub mod index;
pub mod scanner;
pub mod serializer;
pub mod templates;
pub mod xml;

pub use hydrator::hydrate;
pub use index::{Component, ComponentIndex, ComponentKind};
pub use scanner::scan;
pub use serializer::serialize;
