//! Build configuration.
//!
//! # Modules
//!
//! - `types` - The `config.json` document and its validation
//! - [`layout`] - Directory layout of the working tree and build output

pub mod layout;
mod types;

pub use layout::Layout;
pub use types::*;
