//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A throwaway Terragrunt tree
pub struct TerraTree {
  _root: TempDir,
  pub path: PathBuf,
}

impl TerraTree {
  /// Create an empty tree with a root `terragrunt.hcl`
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    std::fs::write(
      path.join("terragrunt.hcl"),
      r#"remote_state {
  backend = "s3"
}
"#,
    )?;

    Ok(Self { _root: root, path })
  }

  /// Two accounts sharing an `_envcommon` vpc module:
  ///
  /// ```text
  /// live/acct-a/account.hcl
  /// live/acct-a/us-east-1/dev/vpc   include "_envcommon/modules/vpc"
  /// live/acct-b/account.hcl
  /// live/acct-b/eu-west-1/stg/vpc   include "_envcommon/modules/vpc"
  /// live/acct-b/eu-west-1/stg/db    include "root"
  /// _envcommon/modules/vpc/main.tf
  /// ```
  pub fn sample() -> Result<Self> {
    let tree = Self::new()?;
    tree.account("live/acct-a")?;
    tree.account("live/acct-b")?;
    tree.module("live/acct-a/us-east-1/dev/vpc", &["_envcommon/modules/vpc"])?;
    tree.module("live/acct-b/eu-west-1/stg/vpc", &["_envcommon/modules/vpc"])?;
    tree.module("live/acct-b/eu-west-1/stg/db", &["root"])?;
    tree.write("_envcommon/modules/vpc/main.tf", "resource \"null_resource\" \"vpc\" {}\n")?;
    Ok(tree)
  }

  /// Write a file, creating parent directories
  pub fn write(&self, rel: &str, content: &str) -> Result<()> {
    let file = self.path.join(rel);
    if let Some(parent) = file.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&file, content).with_context(|| format!("Failed to write {}", file.display()))
  }

  /// Add a module directory whose declaration includes `includes`
  pub fn module(&self, rel: &str, includes: &[&str]) -> Result<()> {
    let mut hcl = String::new();
    for include in includes {
      hcl.push_str(&format!("include \"{}\" {{\n  path = find_in_parent_folders()\n}}\n\n", include));
    }
    hcl.push_str("inputs = {}\n");
    self.write(&format!("{}/terragrunt.hcl", rel), &hcl)?;
    self.write(&format!("{}/main.tf", rel), "# module\n")
  }

  /// Mark `rel` as an account directory
  pub fn account(&self, rel: &str) -> Result<()> {
    self.write(&format!("{}/account.hcl", rel), "locals {\n  account_id = \"000000000000\"\n}\n")
  }

  /// Turn the tree into a git repo with everything committed
  pub fn init_git(&self) -> Result<()> {
    self.git(&["init", "--initial-branch=main"])?;
    self.git(&["config", "user.name", "Test User"])?;
    self.git(&["config", "user.email", "test@example.com"])?;
    self.commit("Initial tree")?;
    Ok(())
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<String> {
    self.git(&["add", "."])?;
    self.git(&["commit", "-m", message])?;

    let output = self.git(&["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Run git inside the tree
  pub fn git(&self, args: &[&str]) -> Result<Output> {
    git(&self.path, args)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the tg-impact binary; `env` entries with `None` are removed
pub fn run_tg_impact(cwd: &Path, args: &[&str], env: &[(&str, Option<&str>)]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_tg-impact");

  let mut command = Command::new(bin);
  command.current_dir(cwd).args(args).env_remove("RUST_LOG");
  for (key, value) in env {
    match value {
      Some(value) => command.env(key, value),
      None => command.env_remove(key),
    };
  }

  command.output().context("Failed to run tg-impact")
}

/// Run the tg-impact binary and fail on a non-zero exit
pub fn run_tg_impact_ok(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_tg_impact(cwd, args, &[("GITHUB_BASE_REF", None)])?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "tg-impact command failed: tg-impact {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}
