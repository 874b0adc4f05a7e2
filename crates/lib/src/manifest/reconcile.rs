//! Per-plugin reconciliation against the previous manifest.
//!
//! For each plugin the build first resolves a version, then asks [`plan`]
//! whether that version is already the one recorded. Only when it is not does
//! the plugin get packaged. Once packaging has succeeded the stale version is
//! retired, the package directory is flattened into the plugin's stable
//! directory and the new descriptor is appended. A version that fails to
//! package leaves the previous one in place.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

use super::Manifest;
use crate::config::Layout;
use crate::package::{PackageError, PackagedAddon, name_with_version, package, versioned_changelog_name};
use crate::util::fs::{FsError, flatten_into, remove_if_exists};
use crate::vcs::CheckedOut;

/// Errors that can occur while reconciling one plugin.
#[derive(Debug, Error)]
pub enum ReconcileError {
  #[error(transparent)]
  Package(#[from] PackageError),

  #[error(transparent)]
  Fs(#[from] FsError),
}

/// What to do with a plugin given the previous manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
  /// The recorded version is current; nothing is packaged.
  Skip,
  /// Package the new version, then retire `retire` when present.
  Include { retire: Option<String> },
}

/// Decide whether `name` at `version` needs packaging.
///
/// Versions are compared as `name-version` strings. Any difference, a
/// downgrade included, counts as an update.
pub fn plan(manifest: &Manifest, name: &str, version: &str) -> Decision {
  match manifest.version_of(name) {
    None => Decision::Include { retire: None },
    Some(old) if name_with_version(name, old) == name_with_version(name, version) => Decision::Skip,
    Some(old) => Decision::Include {
      retire: Some(old.to_string()),
    },
  }
}

/// Result of reconciling one plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  Added { version: String },
  Updated { from: String, to: String },
  Unchanged { version: String },
}

impl Outcome {
  /// Whether this outcome changed the manifest.
  pub fn is_change(&self) -> bool {
    !matches!(self, Outcome::Unchanged { .. })
  }
}

impl fmt::Display for Outcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Outcome::Added { version } => write!(f, "added {}", version),
      Outcome::Updated { from, to } => write!(f, "updated {} -> {}", from, to),
      Outcome::Unchanged { version } => write!(f, "unchanged at {}", version),
    }
  }
}

/// One line of the run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginReport {
  pub name: String,
  pub outcome: Outcome,
  /// The new package, in the stable plugin directory. `None` when unchanged.
  pub packaged: Option<PackagedAddon>,
}

/// Bring `name` up to date in `manifest` and in the build tree.
///
/// Only the in-memory manifest is changed; persisting it is left to the
/// caller once every plugin has been reconciled.
pub fn reconcile_plugin(
  manifest: &mut Manifest,
  layout: &Layout,
  name: &str,
  checked_out: &CheckedOut,
) -> Result<PluginReport, ReconcileError> {
  let version = checked_out.resolved.version.as_str();

  let retire = match plan(manifest, name, version) {
    Decision::Skip => {
      debug!(plugin = name, version, "already current");
      return Ok(PluginReport {
        name: name.to_string(),
        outcome: Outcome::Unchanged {
          version: version.to_string(),
        },
        packaged: None,
      });
    }
    Decision::Include { retire } => retire,
  };

  let packaged = package(&checked_out.path, &layout.build_plugins_dir(), name, version)?;

  if let Some(old) = &retire {
    retire_version(layout, name, old)?;
    manifest.remove(name);
  }

  let stable_dir = layout.stable_plugin_dir(name);
  flatten_into(&packaged.package_dir, &stable_dir)?;
  let packaged = packaged.relocate(&stable_dir);
  manifest.include(packaged.descriptor.clone());

  let outcome = match retire {
    Some(from) => Outcome::Updated {
      from,
      to: version.to_string(),
    },
    None => Outcome::Added {
      version: version.to_string(),
    },
  };
  info!(plugin = name, %outcome, archive = %packaged.archive_path.display(), "reconciled");
  Ok(PluginReport {
    name: name.to_string(),
    outcome,
    packaged: Some(packaged),
  })
}

/// Delete everything on disk that belongs to version `old` of `name`.
fn retire_version(layout: &Layout, name: &str, old: &str) -> Result<(), FsError> {
  let base_name = name_with_version(name, old);
  let stable = layout.stable_plugin_dir(name);

  let stale = [
    layout.versioned_plugin_dir(name, old),
    stable.join(format!("{}.zip", base_name)),
    stable.join(format!("{}.zip.md5", base_name)),
    stable.join(versioned_changelog_name(old)),
  ];
  for path in &stale {
    if remove_if_exists(path)? {
      debug!(plugin = name, path = %path.display(), "removed stale artifact");
    }
  }

  info!(plugin = name, version = old, "retired");
  Ok(())
}
