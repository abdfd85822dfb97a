//! Error types for tg-impact with contextual messages and exit codes
//!
//! Every failure in a run is fatal: errors propagate to `main`, get printed
//! once with an optional help line, and the process exits with the code of
//! the error category.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for tg-impact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args)
  User = 1,
  /// System error (git, filesystem, I/O)
  System = 2,
  /// The plan tool rejected at least one module
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for tg-impact
#[derive(Debug)]
pub enum ImpactError {
  /// Malformed or invalid configuration
  Config(ConfigError),

  /// Changed files could not be obtained
  ChangeSource(ChangeSourceError),

  /// The module tree could not be read
  Traversal(TraversalError),

  /// The plan tool failed for a module
  Validation(ValidationError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ImpactError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ImpactError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ImpactError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ImpactError::Message { message, context, help } => ImpactError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ImpactError::Io(e) => ImpactError::Message {
        message: ctx_str,
        context: Some(format!("I/O error: {}", e)),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ImpactError::Config(_) => ExitCode::User,
      ImpactError::ChangeSource(_) => ExitCode::System,
      ImpactError::Traversal(_) => ExitCode::System,
      ImpactError::Validation(_) => ExitCode::Validation,
      ImpactError::Io(_) => ExitCode::System,
      ImpactError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ImpactError::Config(e) => e.help_message(),
      ImpactError::ChangeSource(e) => e.help_message(),
      ImpactError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for ImpactError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ImpactError::Config(e) => write!(f, "{}", e),
      ImpactError::ChangeSource(e) => write!(f, "{}", e),
      ImpactError::Traversal(e) => write!(f, "{}", e),
      ImpactError::Validation(e) => write!(f, "{}", e),
      ImpactError::Io(e) => write!(f, "I/O error: {}", e),
      ImpactError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ImpactError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ImpactError::Io(e) => Some(e),
      ImpactError::Traversal(TraversalError::Unreadable { source, .. }) => Some(source),
      _ => None,
    }
  }
}

impl From<io::Error> for ImpactError {
  fn from(err: io::Error) -> Self {
    ImpactError::Io(err)
  }
}

impl From<String> for ImpactError {
  fn from(msg: String) -> Self {
    ImpactError::message(msg)
  }
}

impl From<&str> for ImpactError {
  fn from(msg: &str) -> Self {
    ImpactError::message(msg)
  }
}

impl From<serde_json::Error> for ImpactError {
  fn from(err: serde_json::Error) -> Self {
    ImpactError::message(format!("JSON error: {}", err))
  }
}

impl From<walkdir::Error> for ImpactError {
  fn from(err: walkdir::Error) -> Self {
    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
    match err.into_io_error() {
      Some(source) => ImpactError::Traversal(TraversalError::Unreadable { path, source }),
      None => ImpactError::Traversal(TraversalError::Loop { path }),
    }
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Explicitly requested config file does not exist
  NotFound { path: PathBuf },

  /// Config file is not valid JSON for `MonitorConfig`
  Malformed { path: PathBuf, reason: String },

  /// A field holds a value that cannot be used
  InvalidField { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Omit --config to fall back to terragrunt_monitor_config.json or the built-in defaults.".to_string())
      }
      ConfigError::Malformed { .. } => {
        Some("Run `tg-impact config` to print the effective configuration as a starting point.".to_string())
      }
      ConfigError::InvalidField { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => {
        write!(f, "Configuration file not found: {}", path.display())
      }
      ConfigError::Malformed { path, reason } => {
        write!(f, "Failed to parse configuration {}: {}", path.display(), reason)
      }
      ConfigError::InvalidField { field, reason } => {
        write!(f, "Invalid configuration field '{}': {}", field, reason)
      }
    }
  }
}

/// Errors obtaining the change set
#[derive(Debug)]
pub enum ChangeSourceError {
  /// No base ref was given and none could be derived from the environment
  MissingBaseRef { variable: String },

  /// The path is not inside a git work tree
  RepoNotFound { path: PathBuf },

  /// Git command failed
  CommandFailed { command: String, stderr: String },
}

impl ChangeSourceError {
  fn help_message(&self) -> Option<String> {
    match self {
      ChangeSourceError::MissingBaseRef { variable } => Some(format!(
        "Pass --since <ref>, list files with --files, or set {} (done automatically in GitHub pull request jobs).",
        variable
      )),
      ChangeSourceError::RepoNotFound { .. } => Some("Use --files to supply changed paths outside a git checkout.".to_string()),
      ChangeSourceError::CommandFailed { .. } => {
        Some("Make sure the base ref has been fetched (e.g. `git fetch origin <branch>`).".to_string())
      }
    }
  }
}

impl fmt::Display for ChangeSourceError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ChangeSourceError::MissingBaseRef { variable } => {
        write!(f, "No base ref to diff against: {} is not set", variable)
      }
      ChangeSourceError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      ChangeSourceError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
    }
  }
}

/// Errors while building the module graph
#[derive(Debug)]
pub enum TraversalError {
  /// A directory or declaration file could not be read
  Unreadable { path: PathBuf, source: io::Error },

  /// Symlink loop detected during the walk
  Loop { path: PathBuf },
}

impl fmt::Display for TraversalError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TraversalError::Unreadable { path, source } => {
        write!(f, "Failed to read {}: {}", path.display(), source)
      }
      TraversalError::Loop { path } => {
        write!(f, "Filesystem loop detected at {}", path.display())
      }
    }
  }
}

/// The plan tool rejected one or more modules
#[derive(Debug)]
pub enum ValidationError {
  /// The plan tool could not be started at all
  Spawn { command: String, reason: String },

  /// The plan tool exited nonzero for a module
  PlanFailed {
    module: String,
    exit_code: Option<i32>,
    output: String,
  },

  /// Several modules failed (keep-going mode)
  Multiple { failures: Vec<ValidationError> },
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::Spawn { command, reason } => {
        write!(f, "Failed to execute {}: {}", command, reason)
      }
      ValidationError::PlanFailed {
        module,
        exit_code,
        output,
      } => {
        match exit_code {
          Some(code) => write!(f, "Plan failed for {} (exit code {})", module, code)?,
          None => write!(f, "Plan failed for {} (terminated by signal)", module)?,
        }
        if !output.trim().is_empty() {
          write!(f, "\nOutput:\n{}", output.trim_end())?;
        }
        Ok(())
      }
      ValidationError::Multiple { failures } => {
        write!(f, "Plan failed for {} module(s)", failures.len())?;
        for failure in failures {
          write!(f, "\n\n{}", failure)?;
        }
        Ok(())
      }
    }
  }
}

/// Result type alias for tg-impact
pub type ImpactResult<T> = Result<T, ImpactError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ImpactResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ImpactResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ImpactError>,
{
  fn context(self, ctx: impl Into<String>) -> ImpactResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ImpactResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ImpactError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
