//! Validation plans: the ordered list of `terragrunt plan` invocations
//!
//! Every run produces a `ValidationPlan` before anything executes, enabling:
//!
//! - **Dry-run mode**: show which modules would be planned and why
//! - **Idempotency**: same graph + same change set → same plan ID
//! - **Auditability**: plans are JSON-serializable for CI logs
//!
//! ```text
//! ImpactReport
//!   ↓
//! ValidationPlan (what to run, in order)
//!   ↓
//! PlanExecutor (run it, stop at first failure)
//! ```

use crate::core::config::PlanConfig;
use crate::core::error::ImpactResult;
use crate::graph::affected::ImpactReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// Plan identifier (SHA256 hash of the steps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanId(String);

impl PlanId {
  /// Create a plan ID from plan contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// One plan tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
  /// Repository-relative module path
  pub module: String,
  pub account: String,
  pub region: String,
  pub sub_environment: String,
  /// Directory handed to the plan tool
  pub working_dir: String,
  /// Full argv, program first
  pub argv: Vec<String>,
  /// Rule labels that selected this module, deduplicated
  pub reasons: Vec<String>,
}

impl PlanStep {
  /// Command line as a single display string
  pub fn command_line(&self) -> String {
    self.argv.join(" ")
  }
}

/// Ordered set of modules to validate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationPlan {
  pub id: PlanId,
  pub generated_at: DateTime<Utc>,
  /// Where the change set came from
  pub source: String,
  pub changed_files: usize,
  pub steps: Vec<PlanStep>,
}

impl ValidationPlan {
  /// Build a plan with one step per affected module, in report order.
  pub fn from_report(report: &ImpactReport, repo_root: &Path, tool: &PlanConfig, source: impl Into<String>) -> Self {
    let steps: Vec<PlanStep> = report
      .modules()
      .iter()
      .map(|affected| {
        let module = &affected.module;
        let working_dir = repo_root.join(&module.path).display().to_string();

        let mut argv = Vec::with_capacity(tool.args.len() + 3);
        argv.push(tool.command.clone());
        argv.extend(tool.args.iter().cloned());
        if !tool.working_dir_flag.is_empty() {
          argv.push(tool.working_dir_flag.clone());
        }
        argv.push(working_dir.clone());

        PlanStep {
          module: module.path.clone(),
          account: module.account.clone(),
          region: module.region.clone(),
          sub_environment: module.sub_environment.clone(),
          working_dir,
          argv,
          reasons: affected.rule_labels(),
        }
      })
      .collect();

    let json = serde_json::to_vec(&steps).unwrap_or_default();

    Self {
      id: PlanId::from_contents(&json),
      generated_at: Utc::now(),
      source: source.into(),
      changed_files: report.changed_files.len(),
      steps,
    }
  }

  /// Serialize to JSON
  pub fn to_json(&self) -> ImpactResult<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Get human-readable representation
  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();

    output.push_str(&format!("📋 Plan {} ({})\n", self.id, self.source));
    output.push_str(&format!("   Changed files: {}\n", self.changed_files));
    output.push_str(&format!("\n   Modules ({}):\n", self.steps.len()));

    for (i, step) in self.steps.iter().enumerate() {
      output.push_str(&format!("   {}. {} [{}]\n", i + 1, step.module, step.reasons.join(", ")));
      output.push_str(&format!(
        "      account: {}  region: {}  env: {}\n",
        or_dash(&step.account),
        or_dash(&step.region),
        or_dash(&step.sub_environment)
      ));
    }

    output
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }
}

fn or_dash(value: &str) -> &str {
  if value.is_empty() { "-" } else { value }
}
