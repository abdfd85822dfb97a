//! `tg-impact affected` - Show which modules are affected by changes
//!
//! Reads the change set (git or `--files`), applies the watch/trigger filters
//! and prints the affected modules with the rules that selected them.

use crate::core::context::RepoContext;
use crate::core::error::{ImpactError, ImpactResult};
use crate::core::vcs::ChangeSource;
use crate::graph::affected::{self, ImpactReport};

/// Output format for affected command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
  Text,
  Json,
  PathsOnly,
}

impl OutputFormat {
  pub fn parse(s: &str) -> ImpactResult<Self> {
    match s.to_lowercase().as_str() {
      "text" => Ok(Self::Text),
      "json" => Ok(Self::Json),
      "paths" | "paths-only" => Ok(Self::PathsOnly),
      _ => Err(ImpactError::with_help(
        format!("Unknown format '{}'", s),
        "Valid formats: text, json, paths-only",
      )),
    }
  }
}

/// Run the affected command
pub fn run_affected(ctx: &RepoContext, source: ChangeSource, format: String, dry_run: bool) -> ImpactResult<()> {
  let output_format = OutputFormat::parse(&format)?;
  let changed_files = collect_changes(ctx, &source)?;

  if dry_run {
    println!("DRY RUN: Would analyze {} changed files", changed_files.len());
    for file in &changed_files {
      println!("  - {}", file);
    }
    return Ok(());
  }

  let report = affected::analyze(&ctx.graph, &changed_files, &ctx.config.resolve_options());
  display_results(&report, &source, output_format)
}

/// Collect and filter the change set for `source`
pub(crate) fn collect_changes(ctx: &RepoContext, source: &ChangeSource) -> ImpactResult<Vec<String>> {
  let files = source.collect(ctx.repo_root())?;
  let total = files.len();
  let files = ctx.config.filter_changes(files);
  tracing::debug!(total, kept = files.len(), source = %source.describe(), "change set collected");
  Ok(files)
}

fn display_results(report: &ImpactReport, source: &ChangeSource, format: OutputFormat) -> ImpactResult<()> {
  match format {
    OutputFormat::Text => display_text(report, source),
    OutputFormat::Json => display_json(report, source)?,
    OutputFormat::PathsOnly => display_paths_only(report),
  }
  Ok(())
}

/// Display results in human-readable text format
fn display_text(report: &ImpactReport, source: &ChangeSource) {
  println!("Affected Analysis ({})", source.describe());
  println!("=================");
  println!();

  println!("Changed files: {}", report.changed_files.len());
  if !report.changed_files.is_empty() && report.changed_files.len() <= 20 {
    for file in &report.changed_files {
      println!("  {}", file);
    }
    println!();
  }

  if report.is_empty() {
    println!("Affected modules: 0 (nothing to plan)");
    return;
  }

  println!("Affected modules: {}", report.len());
  for affected in report.modules() {
    let module = &affected.module;
    println!("  📦 {} [{}]", module.path, affected.rule_labels().join(", "));
    if !module.account.is_empty() || !module.region.is_empty() || !module.sub_environment.is_empty() {
      println!(
        "     account: {}  region: {}  env: {}",
        dash(&module.account),
        dash(&module.region),
        dash(&module.sub_environment)
      );
    }
  }

  if !report.matches.is_empty() {
    println!();
    let counts: Vec<String> = report
      .rule_counts()
      .into_iter()
      .map(|(rule, n)| format!("{} {}", n, rule))
      .collect();
    println!("Rule matches: {}", counts.join(", "));
  }
}

/// Display results in JSON format
fn display_json(report: &ImpactReport, source: &ChangeSource) -> ImpactResult<()> {
  use serde_json::json;

  let output = json!({
      "source": source.describe(),
      "changed_files": report.changed_files,
      "affected": report.modules(),
      "matches": report.matches,
      "summary": {
          "changed_files_count": report.changed_files.len(),
          "affected_count": report.len(),
          "match_count": report.matches.len()
      }
  });

  println!("{}", serde_json::to_string_pretty(&output)?);
  Ok(())
}

/// Display only module paths, one per line
fn display_paths_only(report: &ImpactReport) {
  for path in report.paths() {
    println!("{}", path);
  }
}

fn dash(value: &str) -> &str {
  if value.is_empty() { "-" } else { value }
}
