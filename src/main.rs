mod commands;
mod core;
mod graph;
mod ui;
mod utils;

use clap::{Args, Parser, Subcommand};
use core::config::MonitorConfig;
use core::context::RepoContext;
use core::error::{ImpactError, ImpactResult, print_error};
use core::vcs::ChangeSource;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Plan only the Terragrunt modules a change actually touches
#[derive(Parser)]
#[command(name = "tg-impact")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Config file (default: terragrunt_monitor_config.json, .tg-impact.json, .config/tg-impact.json)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Terragrunt tree root, overrides `repo_path` from the config
  #[arg(long, global = true)]
  repo: Option<PathBuf>,

  /// Log filter (e.g. warn, info, tg_impact=debug); RUST_LOG takes precedence
  #[arg(long, global = true, default_value = "warn")]
  log_level: String,

  #[command(subcommand)]
  command: Commands,
}

/// Where changed files come from
#[derive(Args, Debug, Clone)]
struct ChangeArgs {
  /// Git ref to diff the working tree against (default: origin/$GITHUB_BASE_REF)
  #[arg(long, conflicts_with_all = ["from", "files"])]
  since: Option<String>,
  /// Start ref (for SHA pair mode)
  #[arg(long, conflicts_with = "files")]
  from: Option<String>,
  /// End ref (for SHA pair mode, default: HEAD)
  #[arg(long, requires = "from")]
  to: Option<String>,
  /// Changed files given directly, relative to the repository root
  #[arg(long, num_args = 1..)]
  files: Vec<String>,
}

impl ChangeArgs {
  fn into_source(self) -> ImpactResult<ChangeSource> {
    ChangeSource::from_args(self.since, self.from, self.to, self.files)
  }
}

#[derive(Subcommand)]
enum Commands {
  /// Show which modules are affected by changes
  Affected {
    #[command(flatten)]
    changes: ChangeArgs,
    /// Output format: text (default), json, paths-only
    #[arg(long, default_value = "text")]
    format: String,
    /// List the change set without analyzing it
    #[arg(long)]
    dry_run: bool,
  },

  /// Run the plan tool for affected modules
  Plan {
    #[command(flatten)]
    changes: ChangeArgs,
    /// Plan every discovered module instead of affected ones
    #[arg(long)]
    all: bool,
    /// Show the plan without executing it
    #[arg(long)]
    dry_run: bool,
    /// Print the plan as JSON without executing it
    #[arg(long)]
    json: bool,
    /// Keep planning after a module fails and report every failure
    #[arg(long)]
    keep_going: bool,
    /// Hide the progress bar and per-module tool output
    #[arg(short, long)]
    quiet: bool,
  },

  /// List discovered modules and their dependency edges
  Modules {
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Print the effective configuration as JSON
  Config,
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_logging(level: &str) {
  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(level))
    .unwrap_or_else(|_| EnvFilter::new("warn"));

  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr),
    )
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_logging(&cli.log_level);

  let cwd = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  if let Err(err) = run(cli, &cwd) {
    handle_error(err);
  }
}

fn run(cli: Cli, cwd: &Path) -> ImpactResult<()> {
  let config_path = cli.config.as_deref();

  match cli.command {
    Commands::Config => commands::run_config(cwd, config_path),
    Commands::Modules { json } => {
      let ctx = build_context(cwd, config_path, cli.repo)?;
      commands::run_modules(&ctx, json)
    }
    Commands::Affected {
      changes,
      format,
      dry_run,
    } => {
      // Resolve the change source first so a missing base ref fails before the scan
      let source = changes.into_source()?;
      let ctx = build_context(cwd, config_path, cli.repo)?;
      commands::run_affected(&ctx, source, format, dry_run)
    }
    Commands::Plan {
      changes,
      all,
      dry_run,
      json,
      keep_going,
      quiet,
    } => {
      let source = if all { None } else { Some(changes.into_source()?) };
      let ctx = build_context(cwd, config_path, cli.repo)?;
      let options = commands::PlanOptions {
        all,
        dry_run,
        json,
        keep_going,
        quiet,
      };
      commands::run_plan(&ctx, source, options)
    }
  }
}

/// Load config, apply `--repo`, and scan the module tree
fn build_context(cwd: &Path, config_path: Option<&Path>, repo: Option<PathBuf>) -> ImpactResult<RepoContext> {
  let Some(repo) = repo else {
    return RepoContext::build(cwd, config_path);
  };
  let mut config = MonitorConfig::load(config_path, cwd)?;
  config.repo_path = repo;
  RepoContext::with_config(cwd, config)
}

fn handle_error(err: ImpactError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
