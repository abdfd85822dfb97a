//! `tg-impact plan` - Run `terragrunt plan` for affected modules
//!
//! Supports:
//! - `--dry-run` to print the plan without executing
//! - `--json` to print the plan as JSON (implies no execution)
//! - `--keep-going` to plan every module even after a failure
//! - `--all` to plan every discovered module, ignoring the change set

use super::affected::collect_changes;
use crate::core::context::RepoContext;
use crate::core::error::ImpactResult;
use crate::core::executor::PlanExecutor;
use crate::core::plan::ValidationPlan;
use crate::core::vcs::ChangeSource;
use crate::graph::affected;

/// Options for the plan command
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
  pub all: bool,
  pub dry_run: bool,
  pub json: bool,
  pub keep_going: bool,
  pub quiet: bool,
}

/// Run the plan command; `source` is ignored with `--all`
pub fn run_plan(ctx: &RepoContext, source: Option<ChangeSource>, options: PlanOptions) -> ImpactResult<()> {
  let (changed_files, description) = match (options.all, source) {
    (false, Some(source)) => (collect_changes(ctx, &source)?, source.describe()),
    _ => {
      // Every module directory counts as changed
      let files: Vec<String> = ctx.graph.iter().map(|m| m.path.clone()).collect();
      (files, "all modules".to_string())
    }
  };

  let report = affected::analyze(&ctx.graph, &changed_files, &ctx.config.resolve_options());
  let plan = ValidationPlan::from_report(&report, ctx.repo_root(), &ctx.config.plan, description);

  if options.json {
    println!("{}", plan.to_json()?);
    return Ok(());
  }

  if plan.is_empty() {
    println!("✅ No modules affected ({})", plan.source);
    println!("   Changed files: {}", plan.changed_files);
    println!("   Nothing to plan");
    return Ok(());
  }

  print!("{}", plan.to_human_readable());

  if options.dry_run {
    println!("\nDRY RUN: Would execute:");
    for step in &plan.steps {
      println!("  {}", step.command_line());
    }
    return Ok(());
  }

  println!("\nExecuting plans...\n");
  let executor = PlanExecutor {
    keep_going: options.keep_going,
    show_progress: !options.quiet,
    echo_output: !options.quiet,
  };
  let summary = executor.execute(&plan)?;

  println!("\n✅ Planned {} module(s) successfully", summary.succeeded());
  Ok(())
}
