//! Deterministic zip archives of build directories.
//!
//! Entries are written in sorted path order with a fixed timestamp, so the
//! same tree always produces the same bytes (and therefore the same checksum).

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Errors that can occur while writing an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
  /// Failed to create the archive file.
  #[error("failed to create archive '{path}': {source}")]
  Create {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to read a file that goes into the archive.
  #[error("failed to read '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to walk the source directory.
  #[error("failed to walk '{path}': {message}")]
  Walk { path: PathBuf, message: String },

  /// The zip writer rejected an entry.
  #[error("failed to write archive '{path}': {source}")]
  Zip {
    path: PathBuf,
    #[source]
    source: zip::result::ZipError,
  },
}

/// Zip the contents of `src_dir` into `dest`.
///
/// Every entry is placed under `root_name/`, so extracting the archive yields
/// a single top-level directory of that name. Paths listed in `exclude` are
/// left out (used when the archive lives inside the directory it packs).
pub fn create_zip(src_dir: &Path, root_name: &str, dest: &Path, exclude: &[&Path]) -> Result<(), ArchiveError> {
  let file = File::create(dest).map_err(|source| ArchiveError::Create {
    path: dest.to_path_buf(),
    source,
  })?;
  let mut zip = ZipWriter::new(file);
  let zip_err = |source| ArchiveError::Zip {
    path: dest.to_path_buf(),
    source,
  };

  let base_options = SimpleFileOptions::default()
    .compression_method(CompressionMethod::Deflated)
    .last_modified_time(DateTime::default());

  let walker = WalkDir::new(src_dir)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|e| !exclude.contains(&e.path()));

  let mut count = 0usize;
  for entry in walker {
    let entry = entry.map_err(|e| ArchiveError::Walk {
      path: src_dir.to_path_buf(),
      message: e.to_string(),
    })?;

    let rel = entry.path().strip_prefix(src_dir).unwrap_or(entry.path());
    let mut name = root_name.to_string();
    for component in rel.components() {
      name.push('/');
      name.push_str(&component.as_os_str().to_string_lossy());
    }

    if entry.file_type().is_dir() {
      zip.add_directory(format!("{}/", name), base_options).map_err(zip_err)?;
      continue;
    }

    let options = with_permissions(base_options, entry.path());
    zip.start_file(name, options).map_err(zip_err)?;
    let mut input = File::open(entry.path()).map_err(|source| ArchiveError::Read {
      path: entry.path().to_path_buf(),
      source,
    })?;
    io::copy(&mut input, &mut zip).map_err(|source| ArchiveError::Read {
      path: entry.path().to_path_buf(),
      source,
    })?;
    count += 1;
  }

  zip.finish().map_err(zip_err)?;
  debug!(archive = %dest.display(), files = count, "wrote archive");
  Ok(())
}

#[cfg(unix)]
fn with_permissions(options: SimpleFileOptions, path: &Path) -> SimpleFileOptions {
  use std::os::unix::fs::PermissionsExt;
  match fs::metadata(path) {
    Ok(meta) => options.unix_permissions(meta.permissions().mode() & 0o777),
    Err(_) => options,
  }
}

#[cfg(not(unix))]
fn with_permissions(options: SimpleFileOptions, _path: &Path) -> SimpleFileOptions {
  options
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Read;
  use tempfile::TempDir;
  use zip::ZipArchive;

  fn entry_names(path: &Path) -> Vec<String> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
      .map(|i| archive.by_index(i).unwrap().name().to_string())
      .collect()
  }

  fn sample_tree(temp: &TempDir) -> PathBuf {
    let src = temp.path().join("foo-1.0.0");
    fs::create_dir_all(src.join("resources")).unwrap();
    fs::write(src.join("addon.xml"), "<addon/>").unwrap();
    fs::write(src.join("resources/settings.xml"), "<settings/>").unwrap();
    src
  }

  #[test]
  fn entries_are_rooted_and_sorted() {
    let temp = TempDir::new().unwrap();
    let src = sample_tree(&temp);
    let dest = temp.path().join("foo-1.0.0.zip");

    create_zip(&src, "foo-1.0.0", &dest, &[]).unwrap();

    assert_eq!(
      entry_names(&dest),
      vec![
        "foo-1.0.0/",
        "foo-1.0.0/addon.xml",
        "foo-1.0.0/resources/",
        "foo-1.0.0/resources/settings.xml",
      ]
    );

    let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
    let mut content = String::new();
    archive
      .by_name("foo-1.0.0/resources/settings.xml")
      .unwrap()
      .read_to_string(&mut content)
      .unwrap();
    assert_eq!(content, "<settings/>");
  }

  #[test]
  fn same_tree_gives_identical_bytes() {
    let temp = TempDir::new().unwrap();
    let src = sample_tree(&temp);
    let first = temp.path().join("first.zip");
    let second = temp.path().join("second.zip");

    create_zip(&src, "foo-1.0.0", &first, &[]).unwrap();
    create_zip(&src, "foo-1.0.0", &second, &[]).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
  }

  #[test]
  fn excluded_paths_are_skipped() {
    let temp = TempDir::new().unwrap();
    let src = sample_tree(&temp);
    let dest = src.join("foo-1.0.0.zip");

    create_zip(&src, "foo-1.0.0", &dest, &[dest.as_path()]).unwrap();

    let names = entry_names(&dest);
    assert!(!names.iter().any(|n| n.ends_with(".zip")));
    assert!(names.contains(&"foo-1.0.0/addon.xml".to_string()));
  }
}
