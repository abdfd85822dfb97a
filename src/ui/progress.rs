//! Progress indicator for plan runs
//!
//! Uses `linya`; bars draw to stderr so stdout stays parseable.

use linya::{Bar, Progress};

/// Progress bar over the modules of a validation plan
pub struct ModuleProgress {
  progress: Progress,
  bar: Bar,
}

impl ModuleProgress {
  /// Create a new progress bar for `total` modules
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
