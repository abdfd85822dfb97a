//! Integration tests for `tg-impact affected`

use crate::helpers::{TerraTree, run_tg_impact, run_tg_impact_ok};
use anyhow::Result;
use serde_json::Value;

fn affected_paths(tree: &TerraTree, files: &[&str]) -> Result<Vec<String>> {
  let mut args = vec!["affected", "--format", "paths-only", "--files"];
  args.extend_from_slice(files);
  let output = run_tg_impact_ok(&tree.path, &args)?;
  Ok(
    String::from_utf8_lossy(&output.stdout)
      .lines()
      .map(String::from)
      .collect(),
  )
}

#[test]
fn test_direct_change_hits_containing_module() -> Result<()> {
  let tree = TerraTree::sample()?;

  let paths = affected_paths(&tree, &["live/acct-a/us-east-1/dev/vpc/main.tf"])?;

  assert_eq!(paths, vec!["live/acct-a/us-east-1/dev/vpc"]);
  Ok(())
}

#[test]
fn test_shared_module_change_hits_including_modules() -> Result<()> {
  let tree = TerraTree::sample()?;

  let paths = affected_paths(&tree, &["_envcommon/modules/vpc/main.tf"])?;

  assert!(paths.contains(&"live/acct-a/us-east-1/dev/vpc".to_string()));
  assert!(paths.contains(&"live/acct-b/eu-west-1/stg/vpc".to_string()));
  assert!(!paths.iter().any(|p| p.ends_with("/db")), "db does not include vpc: {:?}", paths);
  Ok(())
}

#[test]
fn test_account_marker_hits_every_module_of_account() -> Result<()> {
  let tree = TerraTree::sample()?;

  let paths = affected_paths(&tree, &["live/acct-b/account.hcl"])?;

  assert_eq!(
    paths,
    vec!["live/acct-b/eu-west-1/stg/db", "live/acct-b/eu-west-1/stg/vpc"]
  );
  Ok(())
}

#[test]
fn test_unrelated_change_affects_nothing() -> Result<()> {
  let tree = TerraTree::sample()?;

  let paths = affected_paths(&tree, &["docs/README.md"])?;

  assert!(paths.is_empty(), "expected no modules, got {:?}", paths);
  Ok(())
}

#[test]
fn test_sibling_name_prefix_is_not_containment() -> Result<()> {
  let tree = TerraTree::sample()?;
  tree.module("live/acct-a/us-east-1/dev/vpc-peering", &[])?;

  let paths = affected_paths(&tree, &["live/acct-a/us-east-1/dev/vpc-peering/main.tf"])?;

  assert_eq!(paths, vec!["live/acct-a/us-east-1/dev/vpc-peering"]);
  Ok(())
}

#[test]
fn test_affected_modules_are_deduplicated() -> Result<()> {
  let tree = TerraTree::sample()?;

  let paths = affected_paths(
    &tree,
    &[
      "live/acct-a/us-east-1/dev/vpc/main.tf",
      "live/acct-a/us-east-1/dev/vpc/variables.tf",
      "live/acct-a/account.hcl",
    ],
  )?;

  assert_eq!(paths, vec!["live/acct-a/us-east-1/dev/vpc"]);
  Ok(())
}

#[test]
fn test_json_output_carries_classification_and_reasons() -> Result<()> {
  let tree = TerraTree::sample()?;

  let output = run_tg_impact_ok(
    &tree.path,
    &["affected", "--format", "json", "--files", "_envcommon/modules/vpc/main.tf"],
  )?;
  let json: Value = serde_json::from_slice(&output.stdout)?;

  let affected = json["affected"].as_array().expect("affected array");
  let vpc = affected
    .iter()
    .find(|m| m["path"] == "live/acct-b/eu-west-1/stg/vpc")
    .expect("acct-b vpc affected");
  assert_eq!(vpc["account"], "acct-b");
  assert_eq!(vpc["region"], "eu-west-1");
  assert_eq!(vpc["sub_environment"], "stg");

  let rules: Vec<&str> = vpc["reasons"]
    .as_array()
    .expect("reasons array")
    .iter()
    .filter_map(|r| r["rule"].as_str())
    .collect();
  assert!(rules.contains(&"dependency"));
  assert!(rules.contains(&"shared"));

  // Each of the two modules matched both rules
  assert_eq!(json["summary"]["affected_count"], 2);
  assert_eq!(json["summary"]["match_count"], 4);
  Ok(())
}

#[test]
fn test_text_output_lists_rules() -> Result<()> {
  let tree = TerraTree::sample()?;

  let output = run_tg_impact_ok(&tree.path, &["affected", "--files", "live/acct-a/account.hcl"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("Affected modules: 1"), "got: {}", stdout);
  assert!(stdout.contains("live/acct-a/us-east-1/dev/vpc [account]"), "got: {}", stdout);
  Ok(())
}

#[test]
fn test_text_output_lists_each_rule_once() -> Result<()> {
  let tree = TerraTree::sample()?;

  let output = run_tg_impact_ok(
    &tree.path,
    &[
      "affected",
      "--files",
      "live/acct-a/us-east-1/dev/vpc/main.tf",
      "live/acct-a/account.hcl",
      "live/acct-a/us-east-1/dev/vpc/vars.tf",
    ],
  )?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("live/acct-a/us-east-1/dev/vpc [direct, account]\n"), "got: {}", stdout);
  Ok(())
}

#[test]
fn test_excluded_directories_are_not_modules() -> Result<()> {
  let tree = TerraTree::sample()?;
  tree.module("live/acct-a/us-east-1/dev/vpc/.terragrunt-cache/abc", &[])?;

  let output = run_tg_impact_ok(&tree.path, &["modules", "--json"])?;
  let json: Value = serde_json::from_slice(&output.stdout)?;

  let paths: Vec<&str> = json["modules"]
    .as_array()
    .expect("modules array")
    .iter()
    .filter_map(|m| m["path"].as_str())
    .collect();
  assert!(!paths.iter().any(|p| p.contains(".terragrunt-cache")), "got {:?}", paths);
  assert!(!paths.contains(&""), "root declaration is never a module");
  assert_eq!(json["summary"]["module_count"], 3);
  Ok(())
}

#[test]
fn test_nearest_account_marker_wins() -> Result<()> {
  let tree = TerraTree::sample()?;
  tree.account("live/acct-a/us-east-1")?;

  let output = run_tg_impact_ok(&tree.path, &["modules", "--json"])?;
  let json: Value = serde_json::from_slice(&output.stdout)?;

  let vpc = json["modules"]
    .as_array()
    .expect("modules array")
    .iter()
    .find(|m| m["path"] == "live/acct-a/us-east-1/dev/vpc")
    .cloned()
    .expect("vpc module");
  assert_eq!(vpc["account"], "us-east-1");
  Ok(())
}

#[test]
fn test_dry_run_lists_changes_only() -> Result<()> {
  let tree = TerraTree::sample()?;

  let output = run_tg_impact_ok(
    &tree.path,
    &["affected", "--dry-run", "--files", "live/acct-a/us-east-1/dev/vpc/main.tf"],
  )?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("DRY RUN: Would analyze 1 changed files"));
  assert!(!stdout.contains("Affected modules"));
  Ok(())
}

#[test]
fn test_watch_paths_filter_changes() -> Result<()> {
  let tree = TerraTree::sample()?;
  tree.write(".tg-impact.json", r#"{ "watch_paths": ["live/acct-b"] }"#)?;

  let paths = affected_paths(&tree, &["live/acct-a/us-east-1/dev/vpc/main.tf"])?;

  assert!(paths.is_empty(), "acct-a is outside the watch paths: {:?}", paths);
  Ok(())
}

#[test]
fn test_since_reads_git_diff() -> Result<()> {
  let tree = TerraTree::sample()?;
  tree.init_git()?;
  tree.git(&["branch", "base"])?;

  tree.write("live/acct-b/eu-west-1/stg/db/main.tf", "# resize\n")?;
  tree.commit("Resize db")?;

  let output = run_tg_impact_ok(&tree.path, &["affected", "--format", "paths-only", "--since", "base"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert_eq!(stdout.trim(), "live/acct-b/eu-west-1/stg/db");
  Ok(())
}

#[cfg(unix)]
#[test]
fn test_since_handles_quoted_file_names() -> Result<()> {
  let tree = TerraTree::sample()?;
  tree.init_git()?;
  tree.git(&["branch", "base"])?;

  tree.write("live/acct-a/us-east-1/dev/vpc/notes \"v2\".tf", "# renamed\n")?;
  tree.commit("Add quoted file")?;

  let output = run_tg_impact_ok(&tree.path, &["affected", "--format", "paths-only", "--since", "base"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert_eq!(stdout.trim(), "live/acct-a/us-east-1/dev/vpc");
  Ok(())
}

#[test]
fn test_missing_base_ref_is_an_error() -> Result<()> {
  let tree = TerraTree::sample()?;

  let output = run_tg_impact(&tree.path, &["affected"], &[("GITHUB_BASE_REF", None)])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert!(!output.status.success());
  assert!(stderr.contains("GITHUB_BASE_REF"), "got: {}", stderr);
  Ok(())
}

#[test]
fn test_unknown_format_is_rejected() -> Result<()> {
  let tree = TerraTree::sample()?;

  let output = run_tg_impact(&tree.path, &["affected", "--format", "yaml", "--files", "x.tf"], &[])?;

  assert_eq!(output.status.code(), Some(1));
  Ok(())
}

#[test]
fn test_modules_on_empty_tree() -> Result<()> {
  let tree = TerraTree::new()?;

  let output = run_tg_impact_ok(&tree.path, &["modules"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("No directories with terragrunt.hcl found"), "got: {}", stdout);
  Ok(())
}
