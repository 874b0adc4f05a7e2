//! Directory layout of a build.
//!
//! ```text
//! <root>/
//!   config.json
//!   plugins/                         # disposable VCS working copies
//!     <plugin>/
//!   build/
//!     Plugins/
//!       addons.xml
//!       addons.xml.md5
//!       <plugin>/                     # current version of each plugin
//!         <plugin>-<version>.zip
//!         <plugin>-<version>.zip.md5
//!         addon.xml
//!         changelog-<version>.txt
//!     Repository/
//!       <repo-id>-<repo-version>/
//!         addon.xml
//!         changelog.txt
//!         icon.png
//!         <repo-id>-<repo-version>.zip
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::{
  BUILD_DIR, BUILD_PLUGINS_DIR, BUILD_REPO_DIR, CONFIG_FILENAME, MANIFEST_CHECKSUM_FILENAME, MANIFEST_FILENAME,
  PLUGINS_DIR,
};
use crate::util::fs::{FsError, ensure_dir};

/// Resolved paths for one build, all rooted at a working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
  root: PathBuf,
}

impl Layout {
  /// Create a layout rooted at `root`.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn config_path(&self) -> PathBuf {
    self.root.join(CONFIG_FILENAME)
  }

  /// Directory holding one working copy per plugin.
  pub fn plugins_dir(&self) -> PathBuf {
    self.root.join(PLUGINS_DIR)
  }

  pub fn build_dir(&self) -> PathBuf {
    self.root.join(BUILD_DIR)
  }

  /// Directory holding plugin packages and the manifest.
  pub fn build_plugins_dir(&self) -> PathBuf {
    self.build_dir().join(BUILD_PLUGINS_DIR)
  }

  pub fn build_repo_dir(&self) -> PathBuf {
    self.build_dir().join(BUILD_REPO_DIR)
  }

  /// `build/Repository/<repo-id>-<repo-version>/`.
  pub fn repo_package_dir(&self, name_with_version: &str) -> PathBuf {
    self.build_repo_dir().join(name_with_version)
  }

  pub fn manifest_path(&self) -> PathBuf {
    self.build_plugins_dir().join(MANIFEST_FILENAME)
  }

  pub fn manifest_checksum_path(&self) -> PathBuf {
    self.build_plugins_dir().join(MANIFEST_CHECKSUM_FILENAME)
  }

  /// Stable, version-agnostic directory of a plugin.
  pub fn stable_plugin_dir(&self, name: &str) -> PathBuf {
    self.build_plugins_dir().join(name)
  }

  /// Version-specific package directory of a plugin, before flattening.
  pub fn versioned_plugin_dir(&self, name: &str, version: &str) -> PathBuf {
    self.build_plugins_dir().join(format!("{}-{}", name, version))
  }

  /// Create every directory of the layout that does not exist yet.
  pub fn init(&self, repo_name_with_version: &str) -> Result<(), FsError> {
    for dir in [
      self.plugins_dir(),
      self.build_dir(),
      self.build_plugins_dir(),
      self.build_repo_dir(),
      self.repo_package_dir(repo_name_with_version),
    ] {
      ensure_dir(&dir)?;
    }
    debug!(root = %self.root.display(), "initialised build layout");
    Ok(())
  }
}
