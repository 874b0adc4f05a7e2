//! Filesystem helpers for the build tree.
//!
//! Everything here operates on plain directories inside the build output and
//! fails fast; nothing is rolled back on error.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Errors that can occur during filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
  /// Failed to create a directory.
  #[error("failed to create directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to list a directory.
  #[error("failed to read directory '{path}': {source}")]
  ReadDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to walk a directory tree.
  #[error("failed to walk '{path}': {message}")]
  Walk { path: PathBuf, message: String },

  /// Failed to copy a file or symlink.
  #[error("failed to copy '{from}' to '{to}': {source}")]
  Copy {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to move a file or directory.
  #[error("failed to move '{from}' to '{to}': {source}")]
  Move {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to remove a file or directory.
  #[error("failed to remove '{path}': {source}")]
  Remove {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Returns true for names that belong to git rather than to the plugin
/// (`.git`, `.gitignore`, `.gitattributes`, `.github`, ...).
pub fn is_vcs_metadata(name: &OsStr) -> bool {
  name.to_string_lossy().starts_with(".git")
}

/// Create a directory and its parents if missing.
pub fn ensure_dir(path: &Path) -> Result<(), FsError> {
  fs::create_dir_all(path).map_err(|source| FsError::CreateDir {
    path: path.to_path_buf(),
    source,
  })
}

/// List the entries of a directory, sorted by file name.
pub fn sorted_entries(dir: &Path) -> Result<Vec<fs::DirEntry>, FsError> {
  let read_err = |source| FsError::ReadDir {
    path: dir.to_path_buf(),
    source,
  };

  let mut entries = fs::read_dir(dir)
    .map_err(read_err)?
    .collect::<Result<Vec<_>, _>>()
    .map_err(read_err)?;
  entries.sort_by_key(|e| e.file_name());
  Ok(entries)
}

/// Recursively copy `src` to `dst`, skipping any entry (at any depth) whose
/// name matches `skip`.
///
/// Symlinks are recreated as symlinks on Unix and copied by content elsewhere.
pub fn copy_dir_filtered(src: &Path, dst: &Path, skip: impl Fn(&OsStr) -> bool) -> Result<(), FsError> {
  let walker = WalkDir::new(src)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|e| e.depth() == 0 || !skip(e.file_name()));

  for entry in walker {
    let entry = entry.map_err(|e| FsError::Walk {
      path: src.to_path_buf(),
      message: e.to_string(),
    })?;

    let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
    let target = dst.join(rel);
    let file_type = entry.file_type();

    if file_type.is_dir() {
      ensure_dir(&target)?;
    } else if file_type.is_symlink() {
      copy_symlink(entry.path(), &target)?;
    } else {
      trace!(from = %entry.path().display(), to = %target.display(), "copying file");
      fs::copy(entry.path(), &target).map_err(|source| FsError::Copy {
        from: entry.path().to_path_buf(),
        to: target.clone(),
        source,
      })?;
    }
  }

  Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<(), FsError> {
  let copy_err = |source| FsError::Copy {
    from: from.to_path_buf(),
    to: to.to_path_buf(),
    source,
  };
  let link_target = fs::read_link(from).map_err(copy_err)?;
  std::os::unix::fs::symlink(link_target, to).map_err(copy_err)
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> Result<(), FsError> {
  fs::copy(from, to).map(|_| ()).map_err(|source| FsError::Copy {
    from: from.to_path_buf(),
    to: to.to_path_buf(),
    source,
  })
}

/// Remove a path (file, directory, or symlink).
pub fn remove_path(path: &Path) -> Result<(), FsError> {
  let is_symlink = path
    .symlink_metadata()
    .map(|m| m.file_type().is_symlink())
    .unwrap_or(false);

  if path.is_dir() && !is_symlink {
    fs::remove_dir_all(path)
  } else {
    fs::remove_file(path)
  }
  .map_err(|source| FsError::Remove {
    path: path.to_path_buf(),
    source,
  })
}

/// Remove a path if it exists. Returns whether anything was removed.
pub fn remove_if_exists(path: &Path) -> Result<bool, FsError> {
  if path.symlink_metadata().is_err() {
    return Ok(false);
  }
  remove_path(path)?;
  Ok(true)
}

/// Rename `from` to `to`.
pub fn move_path(from: &Path, to: &Path) -> Result<(), FsError> {
  fs::rename(from, to).map_err(|source| FsError::Move {
    from: from.to_path_buf(),
    to: to.to_path_buf(),
    source,
  })
}

/// Merge a versioned package directory into its stable directory.
///
/// If `stable` does not exist, `versioned` is simply renamed to it.
/// Otherwise every entry of `versioned` is moved into `stable`, replacing an
/// entry of the same name, and the emptied `versioned` directory is removed.
/// Entries of `stable` with no counterpart are left alone.
pub fn flatten_into(versioned: &Path, stable: &Path) -> Result<(), FsError> {
  if !stable.is_dir() {
    debug!(from = %versioned.display(), to = %stable.display(), "renaming package directory");
    return move_path(versioned, stable);
  }

  debug!(from = %versioned.display(), to = %stable.display(), "merging package directory");
  for entry in sorted_entries(versioned)? {
    let dest = stable.join(entry.file_name());
    remove_if_exists(&dest)?;
    move_path(&entry.path(), &dest)?;
  }

  remove_path(versioned)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn names(dir: &Path) -> Vec<String> {
    sorted_entries(dir)
      .unwrap()
      .into_iter()
      .map(|e| e.file_name().to_string_lossy().into_owned())
      .collect()
  }

  mod copy {
    use super::*;

    #[test]
    fn skips_vcs_metadata_at_every_depth() {
      let temp = TempDir::new().unwrap();
      let src = temp.path().join("src");
      fs::create_dir_all(src.join(".git/objects")).unwrap();
      fs::create_dir_all(src.join("lib/.github")).unwrap();
      fs::write(src.join(".git/HEAD"), "ref").unwrap();
      fs::write(src.join(".gitignore"), "*.pyc").unwrap();
      fs::write(src.join("addon.xml"), "<addon/>").unwrap();
      fs::write(src.join("lib/main.py"), "print()").unwrap();
      fs::write(src.join("lib/.github/ci.yml"), "on: push").unwrap();

      let dst = temp.path().join("dst");
      copy_dir_filtered(&src, &dst, is_vcs_metadata).unwrap();

      assert_eq!(names(&dst), vec!["addon.xml", "lib"]);
      assert_eq!(names(&dst.join("lib")), vec!["main.py"]);
      assert_eq!(fs::read_to_string(dst.join("lib/main.py")).unwrap(), "print()");
    }

    #[test]
    fn root_name_is_never_filtered() {
      let temp = TempDir::new().unwrap();
      let src = temp.path().join(".github-root");
      fs::create_dir_all(&src).unwrap();
      fs::write(src.join("file.txt"), "x").unwrap();

      let dst = temp.path().join("dst");
      copy_dir_filtered(&src, &dst, is_vcs_metadata).unwrap();

      assert_eq!(names(&dst), vec!["file.txt"]);
    }
  }

  mod flatten {
    use super::*;

    #[test]
    fn renames_when_stable_is_missing() {
      let temp = TempDir::new().unwrap();
      let versioned = temp.path().join("foo-1.0.0");
      fs::create_dir_all(&versioned).unwrap();
      fs::write(versioned.join("addon.xml"), "v1").unwrap();

      let stable = temp.path().join("foo");
      flatten_into(&versioned, &stable).unwrap();

      assert!(!versioned.exists());
      assert_eq!(fs::read_to_string(stable.join("addon.xml")).unwrap(), "v1");
    }

    #[test]
    fn merges_over_existing_stable_directory() {
      let temp = TempDir::new().unwrap();
      let stable = temp.path().join("foo");
      fs::create_dir_all(&stable).unwrap();
      fs::write(stable.join("X"), "old").unwrap();
      fs::write(stable.join("keep.txt"), "kept").unwrap();

      let versioned = temp.path().join("foo-2.0.0");
      fs::create_dir_all(&versioned).unwrap();
      fs::write(versioned.join("X"), "new").unwrap();
      fs::write(versioned.join("Y"), "why").unwrap();

      flatten_into(&versioned, &stable).unwrap();

      assert!(!versioned.exists());
      assert_eq!(fs::read_to_string(stable.join("X")).unwrap(), "new");
      assert_eq!(fs::read_to_string(stable.join("Y")).unwrap(), "why");
      assert_eq!(fs::read_to_string(stable.join("keep.txt")).unwrap(), "kept");
    }

    #[test]
    fn replaces_directories_of_the_same_name() {
      let temp = TempDir::new().unwrap();
      let stable = temp.path().join("foo");
      fs::create_dir_all(stable.join("resources")).unwrap();
      fs::write(stable.join("resources/old.txt"), "old").unwrap();

      let versioned = temp.path().join("foo-2.0.0");
      fs::create_dir_all(versioned.join("resources")).unwrap();
      fs::write(versioned.join("resources/new.txt"), "new").unwrap();

      flatten_into(&versioned, &stable).unwrap();

      assert_eq!(names(&stable.join("resources")), vec!["new.txt"]);
    }
  }

  #[test]
  fn remove_if_exists_reports_what_happened() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("dir");
    fs::create_dir_all(dir.join("nested")).unwrap();

    assert!(remove_if_exists(&dir).unwrap());
    assert!(!dir.exists());
    assert!(!remove_if_exists(&dir).unwrap());
  }
}
