//! Assembling the repository addon.
//!
//! The repository is itself an installable addon. Its package directory,
//! `build/Repository/<id>-<version>/`, holds a generated `addon.xml`, a
//! one-line `changelog.txt`, the icon and a zip of the whole directory. The
//! descriptor points clients at `<host>/Plugins/addons.xml`, its checksum and
//! the plugin data directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{Config, Layout, RepositoryInfo};
use crate::consts::{
  BUILD_PLUGINS_DIR, CHANGELOG_FILENAME, DESCRIPTOR_FILENAME, ICON_FILENAME, MANIFEST_CHECKSUM_FILENAME,
  MANIFEST_FILENAME, RUNTIME_ADDON, RUNTIME_VERSION,
};
use crate::util::archive::{ArchiveError, create_zip};
use crate::util::fs::{FsError, ensure_dir, remove_if_exists};
use crate::xml::{STANDALONE_DECLARATION, XmlElement, to_document_string};

/// Errors that can occur while assembling the repository addon.
#[derive(Debug, Error)]
pub enum AssembleError {
  /// Failed to write one of the package files.
  #[error("failed to write '{path}': {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to copy a local icon.
  #[error("failed to copy icon '{path}': {source}")]
  IconCopy {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to download a remote icon.
  #[error("failed to download icon '{url}': {message}")]
  IconDownload { url: String, message: String },

  /// The icon is neither an existing file nor an http(s) URL.
  #[error("icon '{0}' is neither an existing file nor an http(s) URL")]
  IconUnresolved(String),

  #[error(transparent)]
  Fs(#[from] FsError),

  #[error(transparent)]
  Archive(#[from] ArchiveError),
}

/// The repository's `addon.xml`.
///
/// Attributes are emitted in the order `id`, `name`, `version`,
/// `provider-name`.
pub fn build_descriptor(config: &Config) -> XmlElement {
  let repo = &config.repository;
  let plugins_url = format!("{}/{}", config.host_base(), BUILD_PLUGINS_DIR);

  let requires = XmlElement::new("requires").with_child(
    XmlElement::new("import")
      .with_attr("addon", RUNTIME_ADDON)
      .with_attr("version", RUNTIME_VERSION),
  );

  let repository = XmlElement::new("extension")
    .with_attr("point", "xbmc.addon.repository")
    .with_attr("name", &repo.name)
    .with_child(
      XmlElement::new("info")
        .with_attr("compressed", "true")
        .with_text(format!("{}/{}", plugins_url, MANIFEST_FILENAME)),
    )
    .with_child(XmlElement::new("checksum").with_text(format!("{}/{}", plugins_url, MANIFEST_CHECKSUM_FILENAME)))
    .with_child(XmlElement::new("datadir").with_attr("zip", "true").with_text(&plugins_url))
    .with_child(XmlElement::new("hashes").with_text("true"));

  let metadata = XmlElement::new("extension")
    .with_attr("point", "xbmc.addon.metadata")
    .with_child(XmlElement::new("summary").with_text(&repo.summary))
    .with_child(XmlElement::new("description").with_text(&repo.description))
    .with_child(XmlElement::new("platform").with_text("all"));

  XmlElement::new("addon")
    .with_attr("id", &repo.id)
    .with_attr("name", &repo.name)
    .with_attr("version", &repo.version)
    .with_attr("provider-name", &repo.provider_name)
    .with_child(requires)
    .with_child(repository)
    .with_child(metadata)
}

/// The repository changelog: a single entry for the configured version.
pub fn changelog(repo: &RepositoryInfo) -> String {
  format!("[B]Version {}[/B]\n- Initial version", repo.version)
}

/// Build the repository package and return its directory.
pub fn assemble_repository(config: &Config, layout: &Layout) -> Result<PathBuf, AssembleError> {
  let repo = &config.repository;
  let base_name = repo.name_with_version();
  let package_dir = layout.repo_package_dir(&base_name);
  ensure_dir(&package_dir)?;

  resolve_icon(&repo.icon, layout.root(), &package_dir.join(ICON_FILENAME))?;

  let descriptor = to_document_string(&build_descriptor(config), STANDALONE_DECLARATION);
  write_file(&package_dir.join(DESCRIPTOR_FILENAME), descriptor.as_bytes())?;
  write_file(&package_dir.join(CHANGELOG_FILENAME), changelog(repo).as_bytes())?;

  let archive = package_dir.join(format!("{}.zip", base_name));
  if remove_if_exists(&archive)? {
    debug!(path = %archive.display(), "replaced previous repository archive");
  }
  create_zip(&package_dir, &base_name, &archive, &[archive.as_path()])?;

  info!(repository = %repo.id, version = %repo.version, path = %package_dir.display(), "assembled repository");
  Ok(package_dir)
}

/// Place the icon at `dest`, copying a local file or downloading a URL.
///
/// Relative icon paths are resolved against `root`.
fn resolve_icon(icon: &str, root: &Path, dest: &Path) -> Result<(), AssembleError> {
  let local = root.join(icon);
  if local.is_file() {
    debug!(from = %local.display(), "copying icon");
    fs::copy(&local, dest).map_err(|source| AssembleError::IconCopy { path: local, source })?;
    return Ok(());
  }

  if icon.starts_with("http://") || icon.starts_with("https://") {
    return download(icon, dest);
  }

  Err(AssembleError::IconUnresolved(icon.to_string()))
}

fn download(url: &str, dest: &Path) -> Result<(), AssembleError> {
  info!(url, "downloading icon");
  let fetch_err = |message: String| AssembleError::IconDownload {
    url: url.to_string(),
    message,
  };

  let response = reqwest::blocking::get(url).map_err(|e| fetch_err(e.to_string()))?;
  if !response.status().is_success() {
    return Err(fetch_err(format!("HTTP {}", response.status())));
  }
  let bytes = response.bytes().map_err(|e| fetch_err(e.to_string()))?;

  write_file(dest, &bytes)?;
  debug!(path = %dest.display(), size = bytes.len(), "icon downloaded");
  Ok(())
}

fn write_file(path: &Path, content: &[u8]) -> Result<(), AssembleError> {
  fs::write(path, content).map_err(|source| AssembleError::Write {
    path: path.to_path_buf(),
    source,
  })
}
