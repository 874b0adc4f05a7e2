//! Implementation of the default build command.
//!
//! Runs a full build in the current directory: fetch every configured plugin,
//! package what changed, rewrite the manifest, assemble the repository addon
//! and optionally render directory listings.

use std::env;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info};

use repoforge_lib::config::Layout;
use repoforge_lib::manifest::Outcome;
use repoforge_lib::pipeline::{BuildOptions, run};
use repoforge_lib::vcs::GitSource;

use crate::output::{format_duration, outcome_symbol, print_info, print_stat, print_success};

pub fn cmd_build(gh_pages: bool) -> Result<()> {
  let root = env::current_dir().context("Failed to determine current directory")?;
  info!(root = %root.display(), gh_pages, "starting build");
  let layout = Layout::new(root);
  let started = Instant::now();

  let summary = run(&layout, &GitSource::new(), &BuildOptions { gh_pages }).context("Build failed")?;

  for report in &summary.plugins {
    println!("  {} {} {}", outcome_symbol(&report.outcome), report.name, report.outcome);
    if let Some(packaged) = &report.packaged {
      debug!(plugin = %report.name, archive = %packaged.archive_path.display(), digest = %packaged.digest, "published");
    }
  }
  if summary.plugins.is_empty() {
    print_info("No plugins configured");
  }

  println!();
  let unchanged = summary
    .plugins
    .iter()
    .filter(|p| matches!(p.outcome, Outcome::Unchanged { .. }))
    .count();
  print_success("Build complete");
  print_stat("Changed", &summary.changed().to_string());
  print_stat("Unchanged", &unchanged.to_string());
  print_stat(
    "Manifest",
    if summary.manifest_written { "written" } else { "unchanged" },
  );
  if let Some(listings) = summary.listings {
    print_stat("Listings", &listings.to_string());
  }
  print_stat("Repository", &summary.repository_package.display().to_string());
  print_stat("Elapsed", &format_duration(started.elapsed()));

  Ok(())
}
