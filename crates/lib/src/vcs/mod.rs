//! Plugin source checkouts.
//!
//! Each plugin has a working copy under `plugins/<name>/` that is treated as a
//! disposable cache: it is cloned on first use and fetched on every later run.
//! Checking out the release tag then replaces the working tree, discarding
//! local modifications and untracked files.
//!
//! # Version resolution
//!
//! A pinned tag is used as-is (and must exist). Without a pin, the last tag in
//! the VCS's own tag-list order is used. That order is by name, not by
//! semantic version, so `v10.0.0` sorts before `v9.0.0`.
//!
//! # Modules
//!
//! - [`git`] - `SourceControl` backed by gitoxide

pub mod git;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::config::PluginSpec;
use crate::util::fs::FsError;

pub use git::GitSource;

/// Errors that can occur while fetching plugin sources.
#[derive(Debug, Error)]
pub enum VcsError {
  /// Failed to clone a repository.
  #[error("failed to clone repository '{url}': {source}")]
  Clone {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// Failed to open an existing working copy.
  #[error("failed to open repository at '{path}': {source}")]
  Open {
    path: PathBuf,
    #[source]
    source: Box<gix::open::Error>,
  },

  /// Failed to fetch from the remote.
  #[error("failed to fetch from '{url}': {source}")]
  Fetch {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// The working copy has no remote to fetch from.
  #[error("no remote configured for repository at '{0}'")]
  NoRemote(PathBuf),

  /// Failed to list tags.
  #[error("failed to list tags of '{path}': {source}")]
  Tags {
    path: PathBuf,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// Failed to check out a tag.
  #[error("failed to check out tag '{tag}': {source}")]
  Checkout {
    tag: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error(transparent)]
  Fs(#[from] FsError),

  /// The repository has no tags to package.
  #[error("repository at '{0}' has no tags")]
  NoTags(PathBuf),

  /// The pinned tag does not exist.
  #[error("tag '{tag}' not found in repository at '{path}'")]
  TagNotFound { tag: String, path: PathBuf },
}

/// A tag and the version string derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
  /// Tag name as it exists in the repository (e.g. `v2.0.0`).
  pub tag: String,
  /// Tag with a single leading `v` removed (e.g. `2.0.0`).
  pub version: String,
}

impl ResolvedVersion {
  pub fn from_tag(tag: impl Into<String>) -> Self {
    let tag = tag.into();
    let version = normalize_version(&tag).to_string();
    Self { tag, version }
  }
}

/// A working copy checked out at a release tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedOut {
  pub path: PathBuf,
  pub resolved: ResolvedVersion,
}

/// Strip a single leading `v` from a tag name.
pub fn normalize_version(tag: &str) -> &str {
  tag.strip_prefix('v').unwrap_or(tag)
}

/// Access to plugin source repositories.
///
/// Implementors provide the three primitive operations; the provided methods
/// combine them into the checkout flow used by the build.
pub trait SourceControl {
  /// Make `dest` a working copy of `url` with up-to-date tags.
  ///
  /// Clones when `dest` is not a working copy yet; otherwise fetches.
  fn sync(&self, url: &str, dest: &Path) -> Result<(), VcsError>;

  /// All tags of the working copy, in the VCS's tag-list order.
  fn tags(&self, dest: &Path) -> Result<Vec<String>, VcsError>;

  /// Make the working tree hold exactly the files of `tag`, removing local
  /// modifications and untracked files.
  fn checkout_tag(&self, dest: &Path, tag: &str) -> Result<(), VcsError>;

  /// Pick the tag to package: `pinned` if given, else the last listed tag.
  fn resolve_version(&self, dest: &Path, pinned: Option<&str>) -> Result<ResolvedVersion, VcsError> {
    let tags = self.tags(dest)?;
    let tag = match pinned {
      Some(pinned) if tags.iter().any(|t| t == pinned) => pinned.to_string(),
      Some(pinned) => {
        return Err(VcsError::TagNotFound {
          tag: pinned.to_string(),
          path: dest.to_path_buf(),
        });
      }
      None => tags.last().cloned().ok_or_else(|| VcsError::NoTags(dest.to_path_buf()))?,
    };
    Ok(ResolvedVersion::from_tag(tag))
  }

  /// Sync the plugin's working copy under `plugins_dir` and check out the
  /// resolved tag.
  fn ensure_checked_out(&self, spec: &PluginSpec, plugins_dir: &Path) -> Result<CheckedOut, VcsError> {
    let path = plugins_dir.join(&spec.name);
    self.sync(&spec.source_url, &path)?;

    let resolved = self.resolve_version(&path, spec.version.as_deref())?;
    self.checkout_tag(&path, &resolved.tag)?;

    info!(plugin = %spec.name, tag = %resolved.tag, version = %resolved.version, "checked out");
    Ok(CheckedOut { path, resolved })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::FakeSourceControl;
  use tempfile::TempDir;

  #[test]
  fn normalize_strips_one_leading_v() {
    assert_eq!(normalize_version("v2.0.0"), "2.0.0");
    assert_eq!(normalize_version("vv2"), "v2");
    assert_eq!(normalize_version("2.0.0"), "2.0.0");
    assert_eq!(normalize_version("release-1"), "release-1");
  }

  #[test]
  fn resolves_last_tag_in_list_order() {
    let temp = TempDir::new().unwrap();
    let vcs = FakeSourceControl::new();
    vcs.add_tag("foo", "v9.0.0", &[("addon.xml", "<addon/>")]);
    vcs.add_tag("foo", "v10.0.0", &[("addon.xml", "<addon/>")]);

    let spec = PluginSpec {
      name: "foo".to_string(),
      source_url: "fake://foo".to_string(),
      version: None,
    };
    let checked_out = vcs.ensure_checked_out(&spec, temp.path()).unwrap();

    // List order, not semantic order.
    assert_eq!(checked_out.resolved, ResolvedVersion::from_tag("v10.0.0"));
    assert_eq!(checked_out.path, temp.path().join("foo"));
  }

  #[test]
  fn pinned_tag_must_exist() {
    let temp = TempDir::new().unwrap();
    let vcs = FakeSourceControl::new();
    vcs.add_tag("foo", "v1.0.0", &[("addon.xml", "<addon/>")]);

    let spec = PluginSpec {
      name: "foo".to_string(),
      source_url: "fake://foo".to_string(),
      version: Some("v2.0.0".to_string()),
    };
    let result = vcs.ensure_checked_out(&spec, temp.path());
    assert!(matches!(result, Err(VcsError::TagNotFound { tag, .. }) if tag == "v2.0.0"));
  }

  #[test]
  fn repository_without_tags_is_an_error() {
    let temp = TempDir::new().unwrap();
    let vcs = FakeSourceControl::new();

    let spec = PluginSpec {
      name: "foo".to_string(),
      source_url: "fake://foo".to_string(),
      version: None,
    };
    assert!(matches!(vcs.ensure_checked_out(&spec, temp.path()), Err(VcsError::NoTags(_))));
  }
}
