//! The manifest document.
//!
//! # Format
//!
//! ```xml
//! <addons>
//!   <addon id="plugin.video.foo" version="2.0.0" ...>
//!     ...                       <!-- the plugin's addon.xml, verbatim -->
//!   </addon>
//!   <addon id="plugin.video.bar" version="0.3.1" ...>
//!     ...
//!   </addon>
//! </addons>
//! ```
//!
//! The sidecar `addons.xml.md5` holds the bare hex digest of those bytes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::descriptor::{ADDON_ELEMENT, AddonDescriptor};
use crate::util::hash::hash_bytes;
use crate::xml::{self, XmlElement, XmlError, to_string_pretty};

/// Root element name of the manifest.
pub const MANIFEST_ELEMENT: &str = "addons";

/// Errors that can occur when loading or saving the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  /// Failed to read the manifest file.
  #[error("failed to read manifest '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The manifest is not well-formed XML.
  #[error("failed to parse manifest '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: XmlError,
  },

  /// The root element is not `<addons>`.
  #[error("manifest root must be <addons>, found <{0}>")]
  NotAManifest(String),

  /// Failed to write the manifest or its checksum.
  #[error("failed to write '{path}': {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// The in-memory manifest: an ordered list of addon descriptors.
///
/// Entries are matched to plugins by their `id` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
  root: XmlElement,
}

impl Default for Manifest {
  fn default() -> Self {
    Self::new()
  }
}

impl Manifest {
  /// Create an empty manifest.
  pub fn new() -> Self {
    Self {
      root: XmlElement::new(MANIFEST_ELEMENT),
    }
  }

  /// Load the manifest at `path`.
  ///
  /// Returns an empty manifest if the file doesn't exist.
  pub fn load(path: &Path) -> Result<Self, ManifestError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no previous manifest");
        return Ok(Self::new());
      }
      Err(source) => {
        return Err(ManifestError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    let root = xml::parse(&content).map_err(|source| ManifestError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_element(root)
  }

  /// Wrap an already parsed `<addons>` element.
  pub fn from_element(root: XmlElement) -> Result<Self, ManifestError> {
    if root.name != MANIFEST_ELEMENT {
      return Err(ManifestError::NotAManifest(root.name));
    }
    Ok(Self { root })
  }

  /// Descriptor elements in manifest order.
  pub fn entries(&self) -> impl Iterator<Item = &XmlElement> {
    self.root.elements().filter(|el| el.name == ADDON_ELEMENT)
  }

  pub fn len(&self) -> usize {
    self.entries().count()
  }

  pub fn is_empty(&self) -> bool {
    self.entries().next().is_none()
  }

  /// The descriptor recorded for `name`.
  pub fn get(&self, name: &str) -> Option<&XmlElement> {
    self.entries().find(|el| el.attr("id") == Some(name))
  }

  /// The version recorded for `name`.
  pub fn version_of(&self, name: &str) -> Option<&str> {
    self.get(name).and_then(|el| el.attr("version"))
  }

  /// Plugin names in manifest order.
  pub fn names(&self) -> Vec<&str> {
    self.entries().filter_map(|el| el.attr("id")).collect()
  }

  /// Remove every entry for `name`, returning the first one.
  pub fn remove(&mut self, name: &str) -> Option<XmlElement> {
    let mut removed = None;
    loop {
      let found = self
        .root
        .elements()
        .position(|el| el.name == ADDON_ELEMENT && el.attr("id") == Some(name));
      let Some(index) = found else { break };
      let element = self.root.remove_element_at(index);
      removed = removed.or(element);
    }
    removed
  }

  /// Append a descriptor at the end of the manifest.
  pub fn include(&mut self, descriptor: AddonDescriptor) {
    self.root.push(descriptor.into_element());
  }

  /// The serialized document.
  pub fn to_xml_string(&self) -> String {
    to_string_pretty(&self.root)
  }

  /// Digest of the serialized document, as written to the sidecar.
  pub fn checksum(&self) -> String {
    hash_bytes(self.to_xml_string().as_bytes())
  }

  /// Write the manifest to `path` and its digest to `checksum_path`.
  ///
  /// Both files are written via a temporary file and a rename. When the
  /// serialized bytes and the digest already match what is on disk nothing is
  /// written. Returns whether anything was written.
  pub fn save(&self, path: &Path, checksum_path: &Path) -> Result<bool, ManifestError> {
    let content = self.to_xml_string();
    let digest = hash_bytes(content.as_bytes());

    let unchanged = fs::read(path).is_ok_and(|existing| existing == content.as_bytes())
      && fs::read_to_string(checksum_path).is_ok_and(|existing| existing == digest);
    if unchanged {
      debug!(path = %path.display(), "manifest unchanged");
      return Ok(false);
    }

    write_atomic(path, content.as_bytes())?;
    write_atomic(checksum_path, digest.as_bytes())?;

    info!(path = %path.display(), entries = self.len(), %digest, "wrote manifest");
    Ok(true)
  }
}

/// Write to a sibling temp file, then rename over `path`.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), ManifestError> {
  let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
  temp_name.push(".tmp");
  let temp_path = path.with_file_name(temp_name);

  let write_err = |source| ManifestError::Write {
    path: path.to_path_buf(),
    source,
  };
  fs::write(&temp_path, content).map_err(write_err)?;
  fs::rename(&temp_path, path).map_err(write_err)?;
  Ok(())
}
