//! One complete build.
//!
//! Plugins are handled strictly one after another in configuration order.
//! The manifest is read once up front, changed in memory while the plugins are
//! reconciled, and written once after the last plugin. Any error aborts the
//! build; the manifest on disk then still reflects the previous successful
//! run, and re-running converges.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::config::{Config, ConfigError, Layout};
use crate::manifest::{Manifest, ManifestError, PluginReport, ReconcileError, reconcile_plugin};
use crate::repository::{AssembleError, assemble_repository};
use crate::site::{SiteError, render_index};
use crate::util::fs::FsError;
use crate::vcs::{SourceControl, VcsError};

/// Any error that aborts a build.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Fs(#[from] FsError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error("plugin '{plugin}': {source}")]
  Fetch {
    plugin: String,
    #[source]
    source: VcsError,
  },

  #[error("plugin '{plugin}': {source}")]
  Reconcile {
    plugin: String,
    #[source]
    source: ReconcileError,
  },

  #[error(transparent)]
  Assemble(#[from] AssembleError),

  #[error(transparent)]
  Site(#[from] SiteError),
}

/// Options for [`run`].
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
  /// Render `index.html` listings over the build tree.
  pub gh_pages: bool,
}

/// What a build did.
#[derive(Debug, Clone)]
pub struct BuildSummary {
  /// One report per configured plugin, in configuration order.
  pub plugins: Vec<PluginReport>,
  /// Whether `addons.xml` was rewritten.
  pub manifest_written: bool,
  pub repository_package: PathBuf,
  /// Number of listings written, when rendering was requested.
  pub listings: Option<usize>,
}

impl BuildSummary {
  /// Number of plugins whose manifest entry changed.
  pub fn changed(&self) -> usize {
    self.plugins.iter().filter(|p| p.outcome.is_change()).count()
  }
}

/// Run a build in `layout` using `vcs` to fetch plugin sources.
pub fn run(layout: &Layout, vcs: &dyn SourceControl, options: &BuildOptions) -> Result<BuildSummary, BuildError> {
  let config = Config::load(&layout.config_path())?;
  layout.init(&config.repository.name_with_version())?;

  let mut manifest = Manifest::load(&layout.manifest_path())?;
  let plugins_dir = layout.plugins_dir();

  let mut plugins = Vec::with_capacity(config.plugins.len());
  for spec in &config.plugins {
    let checked_out = vcs
      .ensure_checked_out(spec, &plugins_dir)
      .map_err(|source| BuildError::Fetch {
        plugin: spec.name.clone(),
        source,
      })?;

    let report =
      reconcile_plugin(&mut manifest, layout, &spec.name, &checked_out).map_err(|source| BuildError::Reconcile {
        plugin: spec.name.clone(),
        source,
      })?;
    plugins.push(report);
  }

  let manifest_written = manifest.save(&layout.manifest_path(), &layout.manifest_checksum_path())?;
  let repository_package = assemble_repository(&config, layout)?;

  let listings = if options.gh_pages {
    Some(render_index(&layout.build_dir(), Path::new(""))?)
  } else {
    None
  };

  let summary = BuildSummary {
    plugins,
    manifest_written,
    repository_package,
    listings,
  };
  info!(
    plugins = summary.plugins.len(),
    changed = summary.changed(),
    manifest_written,
    "build complete"
  );
  Ok(summary)
}
