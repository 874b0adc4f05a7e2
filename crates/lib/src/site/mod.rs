//! Static directory listings for hosting the build tree as a website.
//!
//! Every directory under the root gets an `index.html` in the style of a web
//! server's autoindex page, so the build output can be served from a plain
//! static host.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::debug;

use crate::consts::INDEX_FILENAME;
use crate::util::fs::{FsError, sorted_entries};
use crate::xml::{XmlElement, to_string_pretty};

const TIME_FORMAT: &str = "%d-%b-%Y %H:%M";

/// Errors that can occur while rendering listings.
#[derive(Debug, Error)]
pub enum SiteError {
  #[error(transparent)]
  Fs(#[from] FsError),

  /// Failed to read an entry's metadata.
  #[error("failed to stat '{path}': {source}")]
  Metadata {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to write a listing.
  #[error("failed to write '{path}': {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

struct Listed {
  name: String,
  modified: String,
  /// `None` for directories.
  size: Option<u64>,
}

/// Write `index.html` into `current` (relative to `root`) and every
/// directory below it. Returns the number of listings written.
pub fn render_index(root: &Path, current: &Path) -> Result<usize, SiteError> {
  let dir = root.join(current);
  let mut dirs = Vec::new();
  let mut files = Vec::new();

  for entry in sorted_entries(&dir)? {
    let name = entry.file_name().to_string_lossy().into_owned();
    let path = entry.path();
    let meta = fs::metadata(&path).map_err(|source| SiteError::Metadata {
      path: path.clone(),
      source,
    })?;
    let modified = format_time(meta.modified().ok());

    if meta.is_dir() {
      dirs.push(Listed {
        name,
        modified,
        size: None,
      });
    } else if name != INDEX_FILENAME {
      files.push(Listed {
        name,
        modified,
        size: Some(meta.len()),
      });
    }
  }

  let mut written = 0;
  for listed in &dirs {
    written += render_index(root, &current.join(&listed.name))?;
  }

  let rel = current.to_string_lossy().replace('\\', "/");
  let html = listing_page(&rel, dirs.iter().chain(files.iter()));
  let index = dir.join(INDEX_FILENAME);
  fs::write(&index, to_string_pretty(&html)).map_err(|source| SiteError::Write { path: index, source })?;
  debug!(dir = %dir.display(), "wrote listing");

  Ok(written + 1)
}

fn format_time(time: Option<SystemTime>) -> String {
  time
    .map(|t| DateTime::<Local>::from(t).format(TIME_FORMAT).to_string())
    .unwrap_or_else(|| "-".to_string())
}

fn listing_page<'a>(rel: &str, entries: impl Iterator<Item = &'a Listed>) -> XmlElement {
  let index_path = format!("/{}", rel);
  let parent = if rel.is_empty() { "." } else { "../" };

  let mut table = XmlElement::new("table")
    .with_attr("style", "width: 50%; min-width: 800px;")
    .with_child(
      XmlElement::new("tr")
        .with_child(
          XmlElement::new("td").with_child(
            XmlElement::new("a")
              .with_attr("href", parent)
              .with_attr("style", "width: 70%;")
              .with_text("../"),
          ),
        )
        .with_child(XmlElement::new("td"))
        .with_child(XmlElement::new("td")),
    );

  for entry in entries {
    let (label, size) = match entry.size {
      Some(size) => (entry.name.clone(), size.to_string()),
      None => (format!("{}/", entry.name), "-".to_string()),
    };
    let link = XmlElement::new("a").with_attr("href", &entry.name).with_text(label);
    table.push(
      XmlElement::new("tr")
        .with_child(XmlElement::new("td").with_child(link))
        .with_child(XmlElement::new("td").with_text(&entry.modified))
        .with_child(XmlElement::new("td").with_text(size)),
    );
  }

  let body = XmlElement::new("body")
    .with_child(XmlElement::new("h1").with_text(format!("Index of {}", index_path)))
    .with_child(XmlElement::new("hr"))
    .with_child(table)
    .with_child(XmlElement::new("hr"));

  XmlElement::new("html").with_child(XmlElement::new("head")).with_child(body)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("Plugins/foo")).unwrap();
    fs::create_dir_all(root.join("Repository")).unwrap();
    fs::write(root.join("Plugins/addons.xml"), "<addons/>\n").unwrap();
    fs::write(root.join("Plugins/foo/foo-1.0.0.zip"), "12345").unwrap();
    temp
  }

  #[test]
  fn writes_a_listing_per_directory() {
    let temp = tree();
    let written = render_index(temp.path(), Path::new("")).unwrap();

    assert_eq!(written, 4);
    for dir in ["", "Plugins", "Plugins/foo", "Repository"] {
      assert!(temp.path().join(dir).join("index.html").is_file(), "missing listing in '{}'", dir);
    }
  }

  #[test]
  fn root_listing_links_to_itself() {
    let temp = tree();
    render_index(temp.path(), Path::new("")).unwrap();

    let html = fs::read_to_string(temp.path().join("index.html")).unwrap();
    assert!(html.contains("<h1>Index of /</h1>"));
    assert!(html.contains(r#"<a href="." style="width: 70%;">../</a>"#));
    assert!(html.contains(r#"<a href="Plugins">Plugins/</a>"#));
    assert!(!html.contains(r#"href="index.html""#));
  }

  #[test]
  fn nested_listing_shows_files_after_directories() {
    let temp = tree();
    render_index(temp.path(), Path::new("")).unwrap();

    let html = fs::read_to_string(temp.path().join("Plugins/index.html")).unwrap();
    assert!(html.contains("<h1>Index of /Plugins</h1>"));
    assert!(html.contains(r#"<a href="../" style="width: 70%;">../</a>"#));
    let dir_row = html.find(r#"href="foo""#).unwrap();
    let file_row = html.find(r#"href="addons.xml""#).unwrap();
    assert!(dir_row < file_row);
    assert!(html.contains("<td>10</td>"));
  }

  #[test]
  fn rerendering_is_identical() {
    let temp = tree();
    render_index(temp.path(), Path::new("")).unwrap();
    let first = fs::read_to_string(temp.path().join("Plugins/foo/index.html")).unwrap();

    render_index(temp.path(), Path::new("")).unwrap();
    let second = fs::read_to_string(temp.path().join("Plugins/foo/index.html")).unwrap();

    assert_eq!(first, second);
    assert!(second.contains("<td>5</td>"));
  }
}
