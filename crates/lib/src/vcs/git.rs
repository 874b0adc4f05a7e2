//! [`SourceControl`] backed by gitoxide.
//!
//! Working copies are cloned with their `.git` directory intact so later runs
//! only fetch what changed. Checking out a tag clears the working tree first,
//! so neither local edits nor untracked files survive into a package.

use std::path::{Path, PathBuf};

use gix::remote::Direction;
use gix::remote::fetch::Tags;
use tracing::{debug, info};

use super::{SourceControl, VcsError};
use crate::util::fs::{remove_if_exists, remove_path, sorted_entries};

/// Tags are force-updated so a moved upstream tag wins over the local one.
const TAG_REFSPEC: &str = "+refs/tags/*:refs/tags/*";

/// Git access through the `gix` library; no `git` binary is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitSource;

impl GitSource {
  pub fn new() -> Self {
    Self
  }
}

impl SourceControl for GitSource {
  fn sync(&self, url: &str, dest: &Path) -> Result<(), VcsError> {
    if dest.join(".git").exists() {
      debug!(path = %dest.display(), "opening existing working copy");
      let repo = open(dest)?;
      return fetch_updates(&repo, url);
    }

    // A leftover directory that is not a working copy would make the clone fail.
    if remove_if_exists(dest)? {
      debug!(path = %dest.display(), "removed stale directory");
    }

    info!(url, path = %dest.display(), "cloning repository");
    clone_repo(url, dest)
  }

  fn tags(&self, dest: &Path) -> Result<Vec<String>, VcsError> {
    let repo = open(dest)?;
    let tags_err = |source: Box<dyn std::error::Error + Send + Sync>| VcsError::Tags {
      path: dest.to_path_buf(),
      source,
    };

    let platform = repo.references().map_err(|e| tags_err(Box::new(e)))?;
    let mut tags = Vec::new();
    for reference in platform.tags().map_err(|e| tags_err(Box::new(e)))? {
      let reference = reference.map_err(tags_err)?;
      tags.push(reference.name().shorten().to_string());
    }
    Ok(tags)
  }

  fn checkout_tag(&self, dest: &Path, tag: &str) -> Result<(), VcsError> {
    let repo = open(dest)?;
    let tree_id = resolve_tag_tree(&repo, dest, tag)?;

    clear_worktree(dest)?;
    materialize(&repo, dest, tag, &tree_id)?;

    debug!(path = %dest.display(), tag, tree = %tree_id, "checked out tag");
    Ok(())
  }
}

fn open(path: &Path) -> Result<gix::Repository, VcsError> {
  gix::open(path).map_err(|e| VcsError::Open {
    path: path.to_path_buf(),
    source: Box::new(e),
  })
}

/// Clone `url` into `dest` with every tag.
fn clone_repo(url: &str, dest: &Path) -> Result<(), VcsError> {
  let clone_err = |source: Box<dyn std::error::Error + Send + Sync>| VcsError::Clone {
    url: url.to_string(),
    source,
  };

  let mut prepared = gix::prepare_clone(url, dest)
    .map_err(|e| clone_err(Box::new(e)))?
    .configure_remote(|remote| Ok(remote.with_fetch_tags(Tags::All)));

  let (mut checkout, _outcome) = prepared
    .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| clone_err(Box::new(e)))?;

  checkout
    .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| clone_err(Box::new(e)))?;

  Ok(())
}

/// Fetch branches and force-update tags from the default remote.
fn fetch_updates(repo: &gix::Repository, url: &str) -> Result<(), VcsError> {
  debug!(url, "fetching updates");
  let fetch_err = |source: Box<dyn std::error::Error + Send + Sync>| VcsError::Fetch {
    url: url.to_string(),
    source,
  };

  let remote = repo
    .find_default_remote(Direction::Fetch)
    .ok_or_else(|| VcsError::NoRemote(repo.path().to_path_buf()))?
    .map_err(|e| fetch_err(Box::new(e)))?
    .with_refspecs(Some(TAG_REFSPEC), Direction::Fetch)
    .map_err(|e| fetch_err(Box::new(e)))?
    .with_fetch_tags(Tags::All);

  let connection = remote.connect(Direction::Fetch).map_err(|e| fetch_err(Box::new(e)))?;

  connection
    .prepare_fetch(gix::progress::Discard, Default::default())
    .map_err(|e| fetch_err(Box::new(e)))?
    .receive(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| fetch_err(Box::new(e)))?;

  Ok(())
}

/// The root tree of `tag`, peeling annotated tags and their commit.
fn resolve_tag_tree(repo: &gix::Repository, dest: &Path, tag: &str) -> Result<gix::ObjectId, VcsError> {
  let not_found = || VcsError::TagNotFound {
    tag: tag.to_string(),
    path: dest.to_path_buf(),
  };
  let checkout_err = |source: Box<dyn std::error::Error + Send + Sync>| VcsError::Checkout {
    tag: tag.to_string(),
    source,
  };

  let spec = format!("refs/tags/{}", tag);
  let id = repo
    .rev_parse(spec.as_str())
    .map_err(|_| not_found())?
    .single()
    .ok_or_else(not_found)?;

  let object = id.object().map_err(|e| checkout_err(Box::new(e)))?;
  let tree = object.peel_to_tree().map_err(|e| checkout_err(Box::new(e)))?;
  Ok(tree.id)
}

/// Remove everything in the working tree except git's own metadata.
fn clear_worktree(dest: &Path) -> Result<(), VcsError> {
  for entry in sorted_entries(dest)? {
    if entry.file_name() != ".git" {
      remove_path(&entry.path())?;
    }
  }
  Ok(())
}

/// Write the files of `tree_id` into the (cleared) working tree and make the
/// index match it.
fn materialize(repo: &gix::Repository, dest: &Path, tag: &str, tree_id: &gix::ObjectId) -> Result<(), VcsError> {
  let checkout_err = |source: Box<dyn std::error::Error + Send + Sync>| VcsError::Checkout {
    tag: tag.to_string(),
    source,
  };

  let mut index = repo.index_from_tree(tree_id).map_err(|e| checkout_err(Box::new(e)))?;
  let mut options = repo
    .checkout_options(gix::worktree::stack::state::attributes::Source::IdMapping)
    .map_err(|e| checkout_err(Box::new(e)))?;
  options.destination_is_initially_empty = true;
  options.overwrite_existing = true;

  let objects = repo.objects.clone().into_arc().map_err(|e| checkout_err(Box::new(e)))?;
  let outcome = gix::worktree::state::checkout(
    &mut index,
    PathBuf::from(dest),
    objects,
    &gix::progress::Discard,
    &gix::progress::Discard,
    &gix::interrupt::IS_INTERRUPTED,
    options,
  )
  .map_err(|e| checkout_err(Box::new(e)))?;

  index
    .write(Default::default())
    .map_err(|e| checkout_err(Box::new(e)))?;

  debug!(files = outcome.files_updated, "materialized tree");
  Ok(())
}
