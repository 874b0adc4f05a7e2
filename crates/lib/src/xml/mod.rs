//! Ordered XML tree used for addon descriptors, the manifest and listings.
//!
//! # Modules
//!
//! - [`types`] - The tree itself (`XmlElement`, `XmlNode`)
//! - [`parse`] - Reading a document into a tree (via `quick-xml`)
//! - [`write`] - Stable, indented serialization
//!
//! Attribute and child order are part of the data: they survive a parse and
//! are written back exactly as stored.

pub mod parse;
pub mod types;
pub mod write;

pub use parse::{XmlError, parse};
pub use types::*;
pub use write::{STANDALONE_DECLARATION, to_document_string, to_string_pretty};
