//! Turning a checked-out plugin into a distributable package.
//!
//! Packaging `foo` at `2.0.0` produces `build/Plugins/foo-2.0.0/` holding:
//!
//! ```text
//! foo-2.0.0.zip          # the plugin source, rooted at foo-2.0.0/
//! foo-2.0.0.zip.md5      # "<digest> *foo-2.0.0.zip"
//! addon.xml              # the plugin's descriptor
//! changelog-2.0.0.txt    # renamed from changelog.txt
//! icon.* / fanart.*      # artwork, when the plugin ships it
//! ```
//!
//! Everything else from the source tree lives only inside the archive.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::consts::{CHANGELOG_FILENAME, DESCRIPTOR_FILENAME};
use crate::descriptor::{AddonDescriptor, DescriptorError};
use crate::util::archive::{ArchiveError, create_zip};
use crate::util::fs::{
  FsError, copy_dir_filtered, is_vcs_metadata, move_path, remove_if_exists, remove_path, sorted_entries,
};
use crate::util::hash::{HashError, compute_checksum};

/// File name prefixes of ancillary files kept next to the archive.
const ANCILLARY_PREFIXES: [&str; 3] = ["changelog.", "fanart.", "icon."];

/// Errors that can occur while packaging a plugin.
#[derive(Debug, Error)]
pub enum PackageError {
  #[error(transparent)]
  Fs(#[from] FsError),

  #[error(transparent)]
  Archive(#[from] ArchiveError),

  #[error(transparent)]
  Checksum(#[from] HashError),

  #[error(transparent)]
  Descriptor(#[from] DescriptorError),

  /// The descriptor's id does not match the configured plugin name.
  #[error("descriptor id '{found}' does not match plugin name '{expected}'")]
  IdMismatch { expected: String, found: String },

  /// The descriptor's version does not match the version taken from the tag.
  #[error("descriptor version '{found}' of '{plugin}' does not match tag version '{expected}'")]
  VersionMismatch {
    plugin: String,
    expected: String,
    found: String,
  },
}

/// A packaged plugin version, ready to be folded into the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedAddon {
  pub name: String,
  pub version: String,
  pub descriptor: AddonDescriptor,
  /// Directory holding the archive and its sidecars: `<name>-<version>/`
  /// right after packaging, the stable plugin directory after [`relocate`].
  ///
  /// [`relocate`]: PackagedAddon::relocate
  pub package_dir: PathBuf,
  pub archive_path: PathBuf,
  pub checksum_path: PathBuf,
  /// MD5 digest of the archive.
  pub digest: String,
  /// Changelog and artwork files, in name order.
  pub ancillary: Vec<PathBuf>,
}

impl PackagedAddon {
  /// The same package after its files were moved into `dir`.
  pub fn relocate(self, dir: &Path) -> Self {
    let moved = |path: PathBuf| match path.file_name() {
      Some(file_name) => dir.join(file_name),
      None => path,
    };
    Self {
      archive_path: moved(self.archive_path),
      checksum_path: moved(self.checksum_path),
      ancillary: self.ancillary.into_iter().map(moved).collect(),
      package_dir: dir.to_path_buf(),
      ..self
    }
  }
}

/// `<name>-<version>`, the package directory and archive base name.
pub fn name_with_version(name: &str, version: &str) -> String {
  format!("{}-{}", name, version)
}

/// Version-suffixed changelog name, so changelogs of different versions do
/// not collide in the stable plugin directory.
pub fn versioned_changelog_name(version: &str) -> String {
  format!("changelog-{}.txt", version)
}

/// Package the working copy at `source_dir` as `name` at `version`.
///
/// The package directory is created under `build_plugins_dir`; a leftover
/// directory of the same name (from an interrupted run) is replaced.
pub fn package(
  source_dir: &Path,
  build_plugins_dir: &Path,
  name: &str,
  version: &str,
) -> Result<PackagedAddon, PackageError> {
  let base_name = name_with_version(name, version);
  let package_dir = build_plugins_dir.join(&base_name);

  // 1. Copy the working copy without VCS metadata.
  if remove_if_exists(&package_dir)? {
    warn!(path = %package_dir.display(), "replaced leftover package directory");
  }
  copy_dir_filtered(source_dir, &package_dir, is_vcs_metadata)?;
  debug!(from = %source_dir.display(), to = %package_dir.display(), "copied sources");

  // 2. Archive it, rooted at the versioned directory name.
  let archive_name = format!("{}.zip", base_name);
  let staged_archive = build_plugins_dir.join(&archive_name);
  create_zip(&package_dir, &base_name, &staged_archive, &[])?;

  // 3. Checksum, then move archive and sidecar into the package.
  let checksum = compute_checksum(&staged_archive)?;
  let archive_path = package_dir.join(&archive_name);
  let checksum_path = package_dir.join(format!("{}.md5", archive_name));
  move_path(&staged_archive, &archive_path)?;
  move_path(&checksum.sidecar_path, &checksum_path)?;

  // 4. Read the plugin's own descriptor.
  let descriptor = AddonDescriptor::load(&package_dir.join(DESCRIPTOR_FILENAME))?;
  if descriptor.id() != name {
    return Err(PackageError::IdMismatch {
      expected: name.to_string(),
      found: descriptor.id().to_string(),
    });
  }
  if descriptor.version() != version {
    return Err(PackageError::VersionMismatch {
      plugin: name.to_string(),
      expected: version.to_string(),
      found: descriptor.version().to_string(),
    });
  }

  // 5. Keep only what ships next to the archive.
  prune(&package_dir, &archive_name)?;

  // 6. Give the changelog a version-specific name.
  let changelog = package_dir.join(CHANGELOG_FILENAME);
  let versioned_changelog = versioned_changelog_name(version);
  if changelog.is_file() {
    move_path(&changelog, &package_dir.join(&versioned_changelog))?;
  } else {
    warn!(plugin = name, "plugin has no {}", CHANGELOG_FILENAME);
  }

  let ancillary = sorted_entries(&package_dir)?
    .into_iter()
    .filter(|e| {
      let file_name = e.file_name().to_string_lossy().into_owned();
      file_name == versioned_changelog || is_ancillary(&file_name)
    })
    .map(|e| e.path())
    .collect();

  info!(plugin = name, version, digest = %checksum.digest, "packaged");
  Ok(PackagedAddon {
    name: name.to_string(),
    version: version.to_string(),
    descriptor,
    package_dir,
    archive_path,
    checksum_path,
    digest: checksum.digest,
    ancillary,
  })
}

fn is_ancillary(file_name: &str) -> bool {
  ANCILLARY_PREFIXES.iter().any(|prefix| file_name.starts_with(prefix))
}

/// Delete everything in `package_dir` except the archive, its checksum, the
/// descriptor and ancillary files.
fn prune(package_dir: &Path, archive_name: &str) -> Result<(), FsError> {
  let checksum_name = format!("{}.md5", archive_name);
  for entry in sorted_entries(package_dir)? {
    let file_name = entry.file_name();
    let file_name = file_name.to_string_lossy();
    let keep = file_name == archive_name
      || file_name == checksum_name
      || file_name == DESCRIPTOR_FILENAME
      || is_ancillary(&file_name);
    if !keep {
      remove_path(&entry.path())?;
    }
  }
  Ok(())
}
