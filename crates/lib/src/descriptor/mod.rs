//! Addon descriptors (`addon.xml`).
//!
//! A descriptor is kept as the parsed tree so it can be folded into the
//! manifest verbatim; only `id` and `version` are interpreted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::xml::{self, XmlElement, XmlError};

/// Root element name of every descriptor.
pub const ADDON_ELEMENT: &str = "addon";

/// Errors that can occur when loading a descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
  /// The descriptor file does not exist.
  #[error("descriptor not found: {0}")]
  NotFound(PathBuf),

  /// Failed to read the descriptor file.
  #[error("failed to read descriptor '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The descriptor is not well-formed XML.
  #[error("failed to parse descriptor '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: XmlError,
  },

  /// The root element is not `<addon>`.
  #[error("descriptor root must be <addon>, found <{0}>")]
  NotAnAddon(String),

  /// A required attribute is missing or empty.
  #[error("descriptor is missing the '{0}' attribute")]
  MissingAttribute(&'static str),
}

/// A validated `<addon>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonDescriptor {
  element: XmlElement,
}

impl AddonDescriptor {
  /// Read and validate the descriptor at `path`.
  pub fn load(path: &Path) -> Result<Self, DescriptorError> {
    let content = fs::read_to_string(path).map_err(|source| {
      if source.kind() == io::ErrorKind::NotFound {
        DescriptorError::NotFound(path.to_path_buf())
      } else {
        DescriptorError::Read {
          path: path.to_path_buf(),
          source,
        }
      }
    })?;

    let element = xml::parse(&content).map_err(|source| DescriptorError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_element(element)
  }

  /// Validate an already parsed element.
  pub fn from_element(element: XmlElement) -> Result<Self, DescriptorError> {
    if element.name != ADDON_ELEMENT {
      return Err(DescriptorError::NotAnAddon(element.name));
    }
    for attr in ["id", "version"] {
      if element.attr(attr).is_none_or(|v| v.trim().is_empty()) {
        return Err(DescriptorError::MissingAttribute(attr));
      }
    }
    Ok(Self { element })
  }

  pub fn id(&self) -> &str {
    self.element.attr("id").unwrap_or_default()
  }

  pub fn version(&self) -> &str {
    self.element.attr("version").unwrap_or_default()
  }

  pub fn element(&self) -> &XmlElement {
    &self.element
  }

  pub fn into_element(self) -> XmlElement {
    self.element
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn loads_id_and_version() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("addon.xml");
    fs::write(
      &path,
      r#"<addon id="plugin.video.foo" version="2.0.0" name="Foo"><extension point="x"/></addon>"#,
    )
    .unwrap();

    let descriptor = AddonDescriptor::load(&path).unwrap();
    assert_eq!(descriptor.id(), "plugin.video.foo");
    assert_eq!(descriptor.version(), "2.0.0");
    assert_eq!(descriptor.element().elements().count(), 1);
  }

  #[test]
  fn missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let result = AddonDescriptor::load(&temp.path().join("addon.xml"));
    assert!(matches!(result, Err(DescriptorError::NotFound(_))));
  }

  #[test]
  fn malformed_file_is_a_parse_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("addon.xml");
    fs::write(&path, "<addon id=\"x\"").unwrap();
    assert!(matches!(AddonDescriptor::load(&path), Err(DescriptorError::Parse { .. })));
  }

  #[test]
  fn root_must_be_addon() {
    let result = AddonDescriptor::from_element(XmlElement::new("settings"));
    assert!(matches!(result, Err(DescriptorError::NotAnAddon(name)) if name == "settings"));
  }

  #[test]
  fn version_is_required() {
    let element = XmlElement::new("addon").with_attr("id", "foo").with_attr("version", "");
    assert!(matches!(
      AddonDescriptor::from_element(element),
      Err(DescriptorError::MissingAttribute("version"))
    ));
  }
}
