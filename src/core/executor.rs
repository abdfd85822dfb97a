//! Plan execution engine
//!
//! Steps run one at a time, in plan order. By default the first failing module
//! aborts the batch and its combined stdout/stderr is reported; `keep_going`
//! runs every step and reports all failures together.

use crate::core::error::{ImpactError, ImpactResult, ValidationError};
use crate::core::plan::{PlanStep, ValidationPlan};
use crate::ui::progress::ModuleProgress;
use std::process::Command;

/// Outcome of one step
#[derive(Debug, Clone)]
pub struct StepOutcome {
  pub module: String,
  pub success: bool,
  pub exit_code: Option<i32>,
  /// stdout followed by stderr
  pub output: String,
}

/// Summary of a finished run
#[derive(Debug, Clone, Default)]
pub struct ExecutionSummary {
  pub outcomes: Vec<StepOutcome>,
}

impl ExecutionSummary {
  pub fn succeeded(&self) -> usize {
    self.outcomes.iter().filter(|o| o.success).count()
  }
}

/// Runs validation plans
#[derive(Debug, Clone, Default)]
pub struct PlanExecutor {
  /// Keep running after a failed module
  pub keep_going: bool,
  /// Draw a progress bar on stderr
  pub show_progress: bool,
  /// Echo each module's output after it finishes
  pub echo_output: bool,
}

impl PlanExecutor {
  /// Execute every step of `plan`.
  ///
  /// Returns `ImpactError::Validation` if any step fails.
  pub fn execute(&self, plan: &ValidationPlan) -> ImpactResult<ExecutionSummary> {
    let mut summary = ExecutionSummary::default();
    let mut failures = Vec::new();
    let mut progress = (self.show_progress && !plan.is_empty()).then(|| ModuleProgress::new(plan.len(), "Planning modules"));

    for step in &plan.steps {
      tracing::info!(
        module = %step.module,
        account = %step.account,
        region = %step.region,
        sub_env = %step.sub_environment,
        "running plan"
      );

      let outcome = run_step(step)?;
      if let Some(progress) = progress.as_mut() {
        progress.inc();
      }

      if self.echo_output && !outcome.output.trim().is_empty() {
        println!("{}", outcome.output.trim_end());
      }

      if outcome.success {
        tracing::info!(module = %step.module, "plan succeeded");
      } else {
        tracing::warn!(module = %step.module, exit_code = ?outcome.exit_code, "plan failed");
        let failure = ValidationError::PlanFailed {
          module: outcome.module.clone(),
          exit_code: outcome.exit_code,
          output: outcome.output.clone(),
        };
        if !self.keep_going {
          return Err(ImpactError::Validation(failure));
        }
        failures.push(failure);
      }

      summary.outcomes.push(outcome);
    }

    match failures.len() {
      0 => Ok(summary),
      1 => Err(ImpactError::Validation(failures.remove(0))),
      _ => Err(ImpactError::Validation(ValidationError::Multiple { failures })),
    }
  }
}

fn run_step(step: &PlanStep) -> ImpactResult<StepOutcome> {
  let Some((program, args)) = step.argv.split_first() else {
    return Err(ImpactError::message(format!("Empty command for module {}", step.module)));
  };

  let output = Command::new(program).args(args).output().map_err(|e| {
    ImpactError::Validation(ValidationError::Spawn {
      command: step.command_line(),
      reason: e.to_string(),
    })
  })?;

  let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
  combined.push_str(&String::from_utf8_lossy(&output.stderr));

  Ok(StepOutcome {
    module: step.module.clone(),
    success: output.status.success(),
    exit_code: output.status.code(),
    output: combined,
  })
}
