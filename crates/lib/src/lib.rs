//! repoforge-lib: Core types and logic for repoforge
//!
//! This crate turns a set of tagged plugin repositories into an installable
//! addon repository:
//! - `vcs`: keeps a disposable working copy of each plugin at a release tag
//! - `package`: turns a working copy into a versioned archive + metadata
//! - `manifest`: the cumulative `addons.xml` and its reconciliation rules
//! - `repository`: the top-level repository addon that points at the manifest
//! - `site`: optional static directory listings over the build tree
//! - `pipeline`: runs the above in order for one build

pub mod config;
pub mod consts;
pub mod descriptor;
pub mod manifest;
pub mod package;
pub mod pipeline;
pub mod repository;
pub mod site;
pub mod util;
pub mod vcs;
pub mod xml;
