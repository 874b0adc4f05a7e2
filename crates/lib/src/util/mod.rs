//! Shared utilities.
//!
//! Common utilities used across the crate: checksums, filesystem moves and
//! copies, and zip archives.

pub mod archive;
pub mod fs;
pub mod hash;

#[cfg(test)]
pub mod testutil;
