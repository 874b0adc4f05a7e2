//! The `config.json` document.
//!
//! # Format
//!
//! ```json
//! {
//!   "host_url": "https://example.github.io/addons",
//!   "repository": {
//!     "id": "repository.example",
//!     "name": "Example Repository",
//!     "version": "1.0.0",
//!     "provider-name": "example",
//!     "icon": "icon.png",
//!     "summary": "Example addons",
//!     "description": "Addons built from tagged releases"
//!   },
//!   "plugins": [
//!     { "name": "plugin.video.foo", "github_url": "https://github.com/example/foo.git", "version": "v2.0.0" }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// The configuration file does not exist.
  #[error("config file not found: {0}")]
  NotFound(PathBuf),

  /// Failed to read the configuration file.
  #[error("failed to read config file '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to parse the configuration JSON.
  #[error("failed to parse config file '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  /// A required field is empty.
  #[error("config field '{0}' must not be empty")]
  EmptyField(String),

  /// Two plugins share a name.
  #[error("plugin '{0}' is declared more than once")]
  DuplicatePlugin(String),
}

/// Top-level build configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
  /// Base URL the build output is served from.
  pub host_url: String,
  /// Identity of the repository addon.
  pub repository: RepositoryInfo,
  /// Plugins to package, in manifest order.
  #[serde(default)]
  pub plugins: Vec<PluginSpec>,
}

/// Identity and metadata of the repository addon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryInfo {
  pub id: String,
  pub name: String,
  pub version: String,
  #[serde(rename = "provider-name")]
  pub provider_name: String,
  /// Local file path or `http(s)://` URL of the repository icon.
  pub icon: String,
  pub summary: String,
  pub description: String,
}

/// A plugin to package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSpec {
  /// Plugin name; must equal the `id` in the plugin's own descriptor.
  pub name: String,
  /// Clone URL of the plugin's source repository.
  #[serde(rename = "github_url", alias = "source_url")]
  pub source_url: String,
  /// Tag to package. When absent the last tag in tag-list order is used.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
}

impl Config {
  /// Load and validate the configuration at `path`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ConfigError::NotFound(path.to_path_buf())),
      Err(source) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    let config: Config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    config.validate()?;

    debug!(path = %path.display(), plugins = config.plugins.len(), "loaded config");
    Ok(config)
  }

  /// Check required fields and plugin name uniqueness.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let required = [
      ("host_url", &self.host_url),
      ("repository.id", &self.repository.id),
      ("repository.name", &self.repository.name),
      ("repository.version", &self.repository.version),
      ("repository.provider-name", &self.repository.provider_name),
    ];
    for (field, value) in required {
      if value.trim().is_empty() {
        return Err(ConfigError::EmptyField(field.to_string()));
      }
    }

    let mut seen = HashSet::new();
    for plugin in &self.plugins {
      if plugin.name.trim().is_empty() {
        return Err(ConfigError::EmptyField("plugins[].name".to_string()));
      }
      if plugin.source_url.trim().is_empty() {
        return Err(ConfigError::EmptyField(format!("plugins[{}].github_url", plugin.name)));
      }
      if !seen.insert(plugin.name.as_str()) {
        return Err(ConfigError::DuplicatePlugin(plugin.name.clone()));
      }
    }

    Ok(())
  }

  /// Host URL without a trailing slash, ready for suffix concatenation.
  pub fn host_base(&self) -> &str {
    self.host_url.trim_end_matches('/')
  }
}

impl RepositoryInfo {
  /// `<id>-<version>`, the name of the repository package directory and archive.
  pub fn name_with_version(&self) -> String {
    format!("{}-{}", self.id, self.version)
  }
}
