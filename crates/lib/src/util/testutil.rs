//! Test utilities for repoforge-lib.
//!
//! Provides an in-memory [`SourceControl`] so the build can be exercised
//! without a network, plus helpers for building real origin repositories with
//! the `git` binary where a test needs them.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::process::Command;

use crate::util::fs::{ensure_dir, remove_if_exists};
use crate::vcs::{SourceControl, VcsError};

type Tree = Vec<(String, String)>;

/// A fake VCS whose repositories are lists of `(tag, files)`.
///
/// Repositories are keyed by the working-copy directory name, which is the
/// plugin name. Checking out a tag replaces the working copy's contents with
/// that tag's files and a stub `.git` directory.
#[derive(Debug, Default)]
pub struct FakeSourceControl {
  repos: RefCell<BTreeMap<String, Vec<(String, Tree)>>>,
  failing: RefCell<HashSet<String>>,
  syncs: RefCell<Vec<String>>,
}

impl FakeSourceControl {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append a tag (in list order) to the repository of `plugin`.
  pub fn add_tag(&self, plugin: &str, tag: &str, files: &[(&str, &str)]) {
    let tree = files.iter().map(|(p, c)| (p.to_string(), c.to_string())).collect();
    self
      .repos
      .borrow_mut()
      .entry(plugin.to_string())
      .or_default()
      .push((tag.to_string(), tree));
  }

  /// Make every later `sync` of `plugin` fail.
  pub fn fail_sync(&self, plugin: &str) {
    self.failing.borrow_mut().insert(plugin.to_string());
  }

  /// Plugin names in the order they were synced.
  pub fn synced(&self) -> Vec<String> {
    self.syncs.borrow().clone()
  }

  fn key(dest: &Path) -> String {
    dest
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  }
}

impl SourceControl for FakeSourceControl {
  fn sync(&self, url: &str, dest: &Path) -> Result<(), VcsError> {
    let key = Self::key(dest);
    if self.failing.borrow().contains(&key) {
      return Err(VcsError::Fetch {
        url: url.to_string(),
        source: "remote unreachable".into(),
      });
    }
    self.syncs.borrow_mut().push(key);
    ensure_dir(&dest.join(".git"))?;
    Ok(())
  }

  fn tags(&self, dest: &Path) -> Result<Vec<String>, VcsError> {
    Ok(
      self
        .repos
        .borrow()
        .get(&Self::key(dest))
        .map(|tags| tags.iter().map(|(tag, _)| tag.clone()).collect())
        .unwrap_or_default(),
    )
  }

  fn checkout_tag(&self, dest: &Path, tag: &str) -> Result<(), VcsError> {
    let repos = self.repos.borrow();
    let tree = repos
      .get(&Self::key(dest))
      .and_then(|tags| tags.iter().find(|(t, _)| t == tag))
      .map(|(_, tree)| tree)
      .ok_or_else(|| VcsError::TagNotFound {
        tag: tag.to_string(),
        path: dest.to_path_buf(),
      })?;

    let write_err = |source: std::io::Error| VcsError::Checkout {
      tag: tag.to_string(),
      source: Box::new(source),
    };
    remove_if_exists(dest)?;
    ensure_dir(&dest.join(".git"))?;
    fs::write(dest.join(".git").join("HEAD"), tag).map_err(write_err)?;
    fs::write(dest.join(".gitignore"), "*.pyc\n").map_err(write_err)?;
    for (path, content) in tree {
      let file = dest.join(path);
      if let Some(parent) = file.parent() {
        ensure_dir(parent)?;
      }
      fs::write(&file, content).map_err(write_err)?;
    }
    Ok(())
  }
}

/// A minimal plugin descriptor for `id` at `version`.
pub fn addon_xml(id: &str, version: &str) -> String {
  format!(
    r#"<?xml version="1.0" encoding="UTF-8"?>
<addon id="{id}" name="{id}" version="{version}" provider-name="tests">
  <requires>
    <import addon="xbmc.python" version="2.25.0"/>
  </requires>
  <extension point="xbmc.python.pluginsource" library="main.py"/>
</addon>
"#
  )
}

/// Whether a usable `git` binary is on the PATH.
pub fn git_available() -> bool {
  Command::new("git")
    .arg("--version")
    .output()
    .map(|o| o.status.success())
    .unwrap_or(false)
}

/// Run `git` with a throwaway identity and signing disabled, panicking on failure.
pub fn git(cwd: &Path, args: &[&str]) {
  let output = Command::new("git")
    .args([
      "-c",
      "user.name=repoforge-tests",
      "-c",
      "user.email=tests@example.com",
      "-c",
      "commit.gpgsign=false",
      "-c",
      "tag.gpgsign=false",
      "-c",
      "init.defaultBranch=main",
    ])
    .args(args)
    .current_dir(cwd)
    .output()
    .expect("failed to spawn git");
  assert!(
    output.status.success(),
    "git {:?} failed: {}",
    args,
    String::from_utf8_lossy(&output.stderr)
  );
}
