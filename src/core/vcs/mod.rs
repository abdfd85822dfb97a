pub mod system_git;

pub use system_git::SystemGit;

use crate::core::error::{ChangeSourceError, ImpactError, ImpactResult};
use crate::utils::{normalize_rel, path_to_slash};
use std::path::Path;

/// Environment variable GitHub sets to the target branch of a pull request
pub const BASE_REF_VAR: &str = "GITHUB_BASE_REF";

/// Where the change set comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSource {
  /// `git diff --name-only <base>` against the working tree
  Since(String),
  /// `git diff --name-only <from> <to>`
  Range { from: String, to: String },
  /// Paths given on the command line, relative to the repository root
  Explicit(Vec<String>),
}

impl ChangeSource {
  /// Pick a source from CLI flags, falling back to `origin/$GITHUB_BASE_REF`
  pub fn from_args(
    since: Option<String>,
    from: Option<String>,
    to: Option<String>,
    files: Vec<String>,
  ) -> ImpactResult<Self> {
    if !files.is_empty() {
      return Ok(ChangeSource::Explicit(files));
    }
    if let Some(from) = from {
      return Ok(ChangeSource::Range {
        from,
        to: to.unwrap_or_else(|| "HEAD".to_string()),
      });
    }
    if let Some(since) = since {
      return Ok(ChangeSource::Since(since));
    }
    match std::env::var(BASE_REF_VAR) {
      Ok(branch) if !branch.trim().is_empty() => Ok(ChangeSource::Since(format!("origin/{}", branch.trim()))),
      _ => Err(ImpactError::ChangeSource(ChangeSourceError::MissingBaseRef {
        variable: BASE_REF_VAR.to_string(),
      })),
    }
  }

  /// Short description for output headers
  pub fn describe(&self) -> String {
    match self {
      ChangeSource::Since(base) => format!("since {}", base),
      ChangeSource::Range { from, to } => format!("{}..{}", from, to),
      ChangeSource::Explicit(files) => format!("{} file(s) from the command line", files.len()),
    }
  }

  /// Collect changed files relative to `repo_root`.
  ///
  /// Git reports paths relative to the work tree; when the Terragrunt tree is a
  /// subdirectory, paths are re-rooted and files outside it are dropped.
  pub fn collect(&self, repo_root: &Path) -> ImpactResult<Vec<String>> {
    let (git, files) = match self {
      ChangeSource::Explicit(files) => return Ok(files.iter().map(|f| normalize_rel(f)).collect()),
      ChangeSource::Since(base) => {
        let git = SystemGit::open(repo_root)?;
        let files = git.changed_files_since(base)?;
        (git, files)
      }
      ChangeSource::Range { from, to } => {
        let git = SystemGit::open(repo_root)?;
        let files = git.changed_files_between(from, to)?;
        (git, files)
      }
    };

    let prefix = subtree_prefix(git.work_tree(), repo_root);
    Ok(reroot(files, &prefix))
  }
}

/// Path of `repo_root` inside `work_tree`, in slash form (empty when equal)
fn subtree_prefix(work_tree: &Path, repo_root: &Path) -> String {
  let work_tree = work_tree.canonicalize().unwrap_or_else(|_| work_tree.to_path_buf());
  let repo_root = repo_root.canonicalize().unwrap_or_else(|_| repo_root.to_path_buf());
  match repo_root.strip_prefix(&work_tree) {
    Ok(rel) => normalize_rel(&path_to_slash(rel)),
    Err(_) => String::new(),
  }
}

fn reroot(files: Vec<String>, prefix: &str) -> Vec<String> {
  if prefix.is_empty() {
    return files.into_iter().map(|f| normalize_rel(&f)).collect();
  }
  files
    .into_iter()
    .filter_map(|f| {
      let f = normalize_rel(&f);
      f.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(str::to_string)
    })
    .collect()
}
