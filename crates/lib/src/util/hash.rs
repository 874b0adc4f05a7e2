//! Checksums for distributable artifacts.
//!
//! This module provides:
//! - `compute_checksum()`: streaming MD5 of a file plus an `md5sum`-style sidecar
//! - `hash_file()`: streaming MD5 of a file without side effects
//! - `hash_bytes()`: MD5 of an in-memory buffer (used for the manifest)
//!
//! The digest only guards against accidental corruption on the way to the
//! client; it is not a security boundary.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use thiserror::Error;
use tracing::debug;

use crate::consts::{CHECKSUM_CHUNK_SIZE, CHECKSUM_EXT};

/// Errors that can occur while hashing.
#[derive(Debug, Error)]
pub enum HashError {
  /// Failed to read the file being hashed.
  #[error("failed to read file '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to write the sidecar file.
  #[error("failed to write checksum file '{path}': {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The file has no name to record in the sidecar.
  #[error("cannot checksum '{0}': path has no file name")]
  NoFileName(PathBuf),
}

/// A hex digest together with the sidecar that records it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
  /// Lowercase hexadecimal MD5 digest (32 characters).
  pub digest: String,
  /// Path of the written `<file>.md5` sidecar.
  pub sidecar_path: PathBuf,
}

/// Hash `path` and write a sidecar next to it.
///
/// The sidecar is `<path>.md5` and contains a single line in the `md5sum`
/// binary-mode format, `<digest> *<relative-path>\n`. The recorded path is
/// relative to the sidecar's own directory, so the pair stays valid when the
/// directory is moved as a unit.
pub fn compute_checksum(path: &Path) -> Result<Checksum, HashError> {
  let file_name = path
    .file_name()
    .ok_or_else(|| HashError::NoFileName(path.to_path_buf()))?;

  let digest = hash_file(path)?;

  let mut sidecar_name = file_name.to_os_string();
  sidecar_name.push(".");
  sidecar_name.push(CHECKSUM_EXT);
  let sidecar_path = path.with_file_name(sidecar_name);

  // Sidecar and file share a directory, so the relative path is the bare name.
  let record = format!("{} *{}\n", digest, file_name.to_string_lossy());
  fs::write(&sidecar_path, record).map_err(|source| HashError::Write {
    path: sidecar_path.clone(),
    source,
  })?;

  debug!(file = %path.display(), %digest, "wrote checksum");
  Ok(Checksum { digest, sidecar_path })
}

/// Hash a file's contents.
///
/// The file is read in fixed-size chunks and never loaded whole.
pub fn hash_file(path: &Path) -> Result<String, HashError> {
  let mut file = fs::File::open(path).map_err(|source| HashError::Read {
    path: path.to_path_buf(),
    source,
  })?;

  let mut hasher = Md5::new();
  let mut buffer = [0u8; CHECKSUM_CHUNK_SIZE];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(|source| HashError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(hex::encode(hasher.finalize()))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> String {
  let mut hasher = Md5::new();
  hasher.update(data);
  hex::encode(hasher.finalize())
}
