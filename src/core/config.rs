use crate::core::error::{ConfigError, ImpactError, ImpactResult, ResultExt};
use crate::graph::affected::ResolveOptions;
use crate::graph::module_graph::DiscoveryOptions;
use crate::utils::{PathMatching, base_name, normalize_rel};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names searched in the working directory, in order.
pub const CONFIG_CANDIDATES: [&str; 3] = [
  "terragrunt_monitor_config.json",
  ".tg-impact.json",
  ".config/tg-impact.json",
];

/// Configuration for tg-impact
///
/// Every field is optional in the JSON file; missing fields take the defaults
/// below.
///
/// # Example
///
/// ```json
/// {
///   "repo_path": "infra",
///   "exclude_paths": [".git", ".terraform", "sandbox"],
///   "path_matching": "segment",
///   "plan": { "command": "terragrunt", "args": ["plan", "-lock=false"] }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
  /// Root of the Terragrunt tree (relative to the working directory)
  pub repo_path: PathBuf,

  /// Changed files outside all of these are ignored; "." watches everything
  pub watch_paths: Vec<String>,

  /// Directories whose path contains any of these substrings are pruned
  pub exclude_paths: Vec<String>,

  /// File names that count as plan triggers
  pub trigger_files: Vec<String>,

  /// Extensions that count as plan triggers
  pub trigger_extensions: Vec<String>,

  /// Drop changed files that match neither `trigger_files` nor `trigger_extensions`
  pub filter_triggers: bool,

  /// File that marks a directory as a module
  pub module_file: String,

  /// File that marks a directory as an account
  pub account_file: String,

  /// Substring identifying the shared/common modules area
  pub shared_marker: String,

  /// Line prefixes in `module_file` that declare a dependency path
  pub dependency_keywords: Vec<String>,

  /// Region vocabulary for module classification
  pub regions: Vec<String>,

  /// Sub-environment vocabulary for module classification
  pub environments: Vec<String>,

  /// Path containment semantics used by the impact rules
  pub path_matching: PathMatching,

  /// Also affect modules that reach an affected module through resolved dependencies
  pub transitive_dependents: bool,

  /// How the plan tool is invoked
  pub plan: PlanConfig,
}

/// Plan tool invocation: `<command> <args...> <working_dir_flag> <module dir>`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanConfig {
  pub command: String,
  pub args: Vec<String>,
  pub working_dir_flag: String,
}

impl Default for PlanConfig {
  fn default() -> Self {
    Self {
      command: "terragrunt".to_string(),
      args: vec!["plan".to_string()],
      working_dir_flag: "--terragrunt-working-dir".to_string(),
    }
  }
}

fn strings(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| s.to_string()).collect()
}

fn default_regions() -> Vec<String> {
  strings(&[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "ca-central-1",
    "sa-east-1",
    "eu-central-1",
    "eu-central-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-north-1",
    "eu-south-1",
    "eu-south-2",
    "ap-south-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-east-1",
    "me-south-1",
    "me-central-1",
    "af-south-1",
  ])
}

impl Default for MonitorConfig {
  fn default() -> Self {
    Self {
      repo_path: PathBuf::from("."),
      watch_paths: strings(&["."]),
      exclude_paths: strings(&[".git", ".terraform", ".terragrunt-cache"]),
      trigger_files: strings(&["terragrunt.hcl", "terraform.tfvars", "account.hcl"]),
      trigger_extensions: strings(&[".tf", ".hcl", ".tfvars", ".json", ".yaml", ".yml"]),
      filter_triggers: false,
      module_file: "terragrunt.hcl".to_string(),
      account_file: "account.hcl".to_string(),
      shared_marker: "_envcommon/modules".to_string(),
      dependency_keywords: strings(&["include"]),
      regions: default_regions(),
      environments: strings(&["dev", "test", "stg", "prod"]),
      path_matching: PathMatching::default(),
      transitive_dependents: false,
      plan: PlanConfig::default(),
    }
  }
}

impl MonitorConfig {
  /// Find the first existing config file in `dir`
  pub fn find_config_path(dir: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES.iter().map(|name| dir.join(name)).find(|p| p.is_file())
  }

  /// Load configuration.
  ///
  /// An explicit path must exist. Without one, the working directory is
  /// searched and the defaults are used when nothing is found.
  pub fn load(explicit: Option<&Path>, cwd: &Path) -> ImpactResult<Self> {
    let path = match explicit {
      Some(path) => {
        if !path.is_file() {
          return Err(ImpactError::Config(ConfigError::NotFound {
            path: path.to_path_buf(),
          }));
        }
        path.to_path_buf()
      }
      None => match Self::find_config_path(cwd) {
        Some(path) => path,
        None => {
          tracing::debug!("no config file found, using defaults");
          return Ok(Self::default());
        }
      },
    };

    tracing::debug!(path = %path.display(), "loading config");
    let content = fs::read_to_string(&path).with_context(|| format!("Failed to read config from {}", path.display()))?;
    Self::from_json(&content, &path)
  }

  /// Parse and validate configuration text; `origin` is used in error messages
  pub fn from_json(content: &str, origin: &Path) -> ImpactResult<Self> {
    let config: MonitorConfig = serde_json::from_str(content).map_err(|e| {
      ImpactError::Config(ConfigError::Malformed {
        path: origin.to_path_buf(),
        reason: e.to_string(),
      })
    })?;
    config.validate()?;
    Ok(config)
  }

  /// Reject values the engine cannot work with
  pub fn validate(&self) -> ImpactResult<()> {
    let invalid = |field: &str, reason: &str| -> ImpactResult<()> {
      Err(ImpactError::Config(ConfigError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
      }))
    };

    if self.module_file.is_empty() || self.module_file.contains('/') {
      return invalid("module_file", "must be a plain file name");
    }
    if self.account_file.is_empty() || self.account_file.contains('/') {
      return invalid("account_file", "must be a plain file name");
    }
    if self.regions.is_empty() {
      return invalid("regions", "must list at least one region");
    }
    if self.environments.is_empty() {
      return invalid("environments", "must list at least one environment");
    }
    if self.dependency_keywords.iter().any(|k| k.trim().is_empty()) {
      return invalid("dependency_keywords", "keywords must not be empty");
    }
    if self.exclude_paths.iter().any(|p| p.is_empty()) {
      return invalid("exclude_paths", "an empty pattern would exclude everything");
    }
    if self.plan.command.trim().is_empty() {
      return invalid("plan.command", "must name an executable");
    }
    Ok(())
  }

  /// Repository root resolved against the working directory
  pub fn repo_root(&self, cwd: &Path) -> PathBuf {
    if self.repo_path.is_absolute() {
      self.repo_path.clone()
    } else {
      cwd.join(&self.repo_path)
    }
  }

  /// Options for the module graph builder
  pub fn discovery_options(&self) -> DiscoveryOptions {
    DiscoveryOptions {
      module_file: self.module_file.clone(),
      account_file: self.account_file.clone(),
      exclude_paths: self.exclude_paths.clone(),
      dependency_keywords: self.dependency_keywords.clone(),
      regions: self.regions.clone(),
      environments: self.environments.clone(),
    }
  }

  /// Options for the impact resolver
  pub fn resolve_options(&self) -> ResolveOptions {
    ResolveOptions {
      account_file: self.account_file.clone(),
      shared_marker: self.shared_marker.clone(),
      matching: self.path_matching,
      transitive: self.transitive_dependents,
    }
  }

  /// Whether a changed file lies inside one of the watch paths
  pub fn is_watched(&self, file: &str) -> bool {
    self.watch_paths.iter().any(|watch| {
      let watch = normalize_rel(watch);
      watch.is_empty() || self.path_matching.is_under(file, &watch)
    })
  }

  /// Whether a changed file is a trigger by name or extension
  pub fn is_trigger(&self, file: &str) -> bool {
    let name = base_name(file);
    self.trigger_files.iter().any(|t| t == name) || self.trigger_extensions.iter().any(|ext| name.ends_with(ext.as_str()))
  }

  /// Apply the watch and trigger filters to a change set, keeping order
  pub fn filter_changes(&self, files: Vec<String>) -> Vec<String> {
    files
      .into_iter()
      .filter(|f| {
        let keep = self.is_watched(f) && (!self.filter_triggers || self.is_trigger(f));
        if !keep {
          tracing::debug!(file = %f, "changed file filtered out");
        }
        keep
      })
      .collect()
  }
}
