//! The cumulative addon manifest (`addons.xml`) and its reconciliation.
//!
//! The manifest lists the current descriptor of every packaged plugin, at
//! most one per plugin name. Each build reads the previous manifest, decides
//! per plugin whether its packaged version is still current, swaps stale
//! entries for freshly packaged ones, and writes the result once after every
//! plugin has been handled.
//!
//! # Modules
//!
//! - `types` - The manifest document, loading and persisting
//! - [`reconcile`] - Per-plugin decisions and their effect on the build tree

pub mod reconcile;
mod types;

pub use reconcile::{Decision, Outcome, PluginReport, ReconcileError, plan, reconcile_plugin};
pub use types::*;
