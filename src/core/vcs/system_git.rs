//! System git backend
//!
//! Shells out to the `git` binary with an isolated environment. Only the
//! plumbing needed to list changed paths lives here.

use crate::core::error::{ChangeSourceError, ImpactError, ImpactResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git
pub struct SystemGit {
  /// Directory git is run from
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open the git repository containing `path`
  ///
  /// This performs ONE subprocess call to get the repository metadata.
  pub fn open(path: &Path) -> ImpactResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(ImpactError::ChangeSource(ChangeSourceError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(ImpactError::ChangeSource(ChangeSourceError::CommandFailed {
        command: "git rev-parse --show-toplevel".to_string(),
        stderr: stderr.to_string(),
      }));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = stdout.trim();

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(work_tree),
    })
  }

  /// Working tree root
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Files that differ between `base` and the working tree
  ///
  /// Paths are relative to the working tree root.
  pub fn changed_files_since(&self, base: &str) -> ImpactResult<Vec<String>> {
    self.diff_name_only(&[base])
  }

  /// Files that differ between two commits
  pub fn changed_files_between(&self, from: &str, to: &str) -> ImpactResult<Vec<String>> {
    self.diff_name_only(&[from, to])
  }

  fn diff_name_only(&self, refs: &[&str]) -> ImpactResult<Vec<String>> {
    let mut cmd = self.git_cmd();
    // -z: raw NUL-separated paths, never C-quoted
    cmd.args(["diff", "--name-only", "-z"]).args(refs).arg("--");

    let command = format!("git diff --name-only {}", refs.join(" "));
    tracing::debug!(command = %command, "listing changed files");
    let output = cmd.output().with_context(|| format!("Failed to execute {}", command))?;

    if !output.status.success() {
      return Err(ImpactError::ChangeSource(ChangeSourceError::CommandFailed {
        command,
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    Ok(parse_name_only(&String::from_utf8_lossy(&output.stdout)))
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII

    cmd
  }
}

/// Split `--name-only -z` output into paths, dropping empty entries
fn parse_name_only(stdout: &str) -> Vec<String> {
  stdout
    .split('\0')
    .filter(|path| !path.is_empty())
    .map(str::to_string)
    .collect()
}
