//! CLI output formatting utilities.
//!
//! Colored status lines and symbols for terminal output.

use std::time::Duration;

use owo_colors::{OwoColorize, Stream};
use repoforge_lib::manifest::Outcome;

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
  pub const ADD: &str = "+";
  pub const MODIFY: &str = "~";
  pub const UNCHANGED: &str = "=";
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

/// Colored marker for a plugin's outcome.
pub fn outcome_symbol(outcome: &Outcome) -> String {
  match outcome {
    Outcome::Added { .. } => symbols::ADD
      .if_supports_color(Stream::Stdout, |s| s.green())
      .to_string(),
    Outcome::Updated { .. } => symbols::MODIFY
      .if_supports_color(Stream::Stdout, |s| s.yellow())
      .to_string(),
    Outcome::Unchanged { .. } => symbols::UNCHANGED
      .if_supports_color(Stream::Stdout, |s| s.dimmed())
      .to_string(),
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}
