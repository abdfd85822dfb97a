//! Integration tests for `tg-impact plan`
//!
//! The plan tool is swapped for `sh -c` so no Terragrunt install is needed.

#![cfg(unix)]

use crate::helpers::{TerraTree, run_tg_impact, run_tg_impact_ok};
use anyhow::Result;
use serde_json::Value;

fn use_shell_tool(tree: &TerraTree, script: &str) -> Result<()> {
  let config = serde_json::json!({
    "plan": {
      "command": "sh",
      "args": ["-c", script],
      "working_dir_flag": ""
    }
  });
  tree.write(".tg-impact.json", &serde_json::to_string_pretty(&config)?)
}

#[test]
fn test_plan_json_lists_affected_steps() -> Result<()> {
  let tree = TerraTree::sample()?;

  let output = run_tg_impact_ok(&tree.path, &["plan", "--json", "--files", "live/acct-b/account.hcl"])?;
  let plan: Value = serde_json::from_slice(&output.stdout)?;

  let steps = plan["steps"].as_array().expect("steps array");
  let modules: Vec<&str> = steps.iter().filter_map(|s| s["module"].as_str()).collect();
  assert_eq!(modules, vec!["live/acct-b/eu-west-1/stg/db", "live/acct-b/eu-west-1/stg/vpc"]);

  let argv: Vec<&str> = steps[0]["argv"]
    .as_array()
    .expect("argv array")
    .iter()
    .filter_map(|a| a.as_str())
    .collect();
  assert_eq!(&argv[..3], &["terragrunt", "plan", "--terragrunt-working-dir"]);
  assert!(argv[3].ends_with("live/acct-b/eu-west-1/stg/db"));
  assert_eq!(steps[0]["reasons"][0], "account");
  assert_eq!(plan["changed_files"], 1);
  Ok(())
}

#[test]
fn test_plan_id_is_stable_for_same_input() -> Result<()> {
  let tree = TerraTree::sample()?;
  let args = ["plan", "--json", "--files", "_envcommon/modules/vpc/main.tf"];

  let first: Value = serde_json::from_slice(&run_tg_impact_ok(&tree.path, &args)?.stdout)?;
  let second: Value = serde_json::from_slice(&run_tg_impact_ok(&tree.path, &args)?.stdout)?;

  assert_eq!(first["id"], second["id"]);
  Ok(())
}

#[test]
fn test_plan_dry_run_does_not_execute() -> Result<()> {
  let tree = TerraTree::sample()?;
  use_shell_tool(&tree, "exit 9")?;

  let output = run_tg_impact_ok(
    &tree.path,
    &["plan", "--dry-run", "--files", "live/acct-a/us-east-1/dev/vpc/main.tf"],
  )?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("DRY RUN: Would execute:"));
  assert!(stdout.contains("live/acct-a/us-east-1/dev/vpc [direct]"));
  Ok(())
}

#[test]
fn test_plan_runs_tool_per_module() -> Result<()> {
  let tree = TerraTree::sample()?;
  use_shell_tool(&tree, "echo planned \"$0\"")?;

  let output = run_tg_impact_ok(&tree.path, &["plan", "--files", "live/acct-b/account.hcl"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert_eq!(stdout.matches("planned ").count(), 2, "got: {}", stdout);
  assert!(stdout.contains("Planned 2 module(s) successfully"));
  Ok(())
}

#[test]
fn test_plan_with_nothing_affected() -> Result<()> {
  let tree = TerraTree::sample()?;
  use_shell_tool(&tree, "exit 9")?;

  let output = run_tg_impact_ok(&tree.path, &["plan", "--files", "docs/README.md"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("No modules affected"));
  Ok(())
}

#[test]
fn test_plan_failure_exits_with_validation_code() -> Result<()> {
  let tree = TerraTree::sample()?;
  use_shell_tool(&tree, "echo boom; exit 1")?;

  let output = run_tg_impact(&tree.path, &["plan", "--quiet", "--files", "live/acct-b/account.hcl"], &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(3));
  assert!(stderr.contains("live/acct-b/eu-west-1/stg/db"), "got: {}", stderr);
  // Stops at the first failing module
  assert!(!stderr.contains("live/acct-b/eu-west-1/stg/vpc"), "got: {}", stderr);
  Ok(())
}

#[test]
fn test_plan_keep_going_reports_every_failure() -> Result<()> {
  let tree = TerraTree::sample()?;
  use_shell_tool(&tree, "exit 1")?;

  let output = run_tg_impact(
    &tree.path,
    &["plan", "--quiet", "--keep-going", "--files", "live/acct-b/account.hcl"],
    &[],
  )?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(3));
  assert!(stderr.contains("live/acct-b/eu-west-1/stg/db"), "got: {}", stderr);
  assert!(stderr.contains("live/acct-b/eu-west-1/stg/vpc"), "got: {}", stderr);
  Ok(())
}

#[test]
fn test_plan_all_covers_every_module() -> Result<()> {
  let tree = TerraTree::sample()?;

  let output = run_tg_impact_ok(&tree.path, &["plan", "--all", "--json"])?;
  let plan: Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(plan["steps"].as_array().map(Vec::len), Some(3));
  assert_eq!(plan["source"], "all modules");
  Ok(())
}
