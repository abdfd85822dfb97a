//! `tg-impact config` - Print the effective configuration as JSON

use crate::core::config::MonitorConfig;
use crate::core::error::ImpactResult;
use std::path::Path;

/// Run the config command
///
/// Loads config without scanning the tree, so it works on a broken checkout.
pub fn run_config(cwd: &Path, config_path: Option<&Path>) -> ImpactResult<()> {
  let config = MonitorConfig::load(config_path, cwd)?;
  println!("{}", serde_json::to_string_pretty(&config)?);
  Ok(())
}
