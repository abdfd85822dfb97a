//! Unified repository context - build once, pass everywhere
//!
//! Config is loaded and the module graph is scanned once in `main`, then
//! passed by reference to the command that runs.

use crate::core::config::MonitorConfig;
use crate::core::error::ImpactResult;
use crate::graph::module_graph::ModuleGraph;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a command needs about the repository.
#[derive(Clone)]
pub struct RepoContext {
  /// Root of the Terragrunt tree
  pub root: PathBuf,

  /// Effective configuration
  pub config: Arc<MonitorConfig>,

  /// Module graph scanned from `root`
  pub graph: Arc<ModuleGraph>,
}

impl RepoContext {
  /// Load config (explicit path or search in `cwd`) and build the graph.
  pub fn build(cwd: &Path, config_path: Option<&Path>) -> ImpactResult<Self> {
    let config = MonitorConfig::load(config_path, cwd)?;
    Self::with_config(cwd, config)
  }

  /// Build the graph for an already loaded config.
  pub fn with_config(cwd: &Path, config: MonitorConfig) -> ImpactResult<Self> {
    let root = config.repo_root(cwd);
    let graph = ModuleGraph::build(&root, &config.discovery_options())?;

    Ok(Self {
      root,
      config: Arc::new(config),
      graph: Arc::new(graph),
    })
  }

  /// Repository root as Path reference (convenience)
  pub fn repo_root(&self) -> &Path {
    &self.root
  }
}
