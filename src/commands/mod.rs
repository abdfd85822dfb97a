//! CLI commands for tg-impact
//!
//! - **affected**: find modules affected by changes
//! - **plan**: run the plan tool for affected modules only
//! - **modules**: list discovered modules and dependency edges
//! - **config**: print the effective configuration
//!
//! Commands that need the module graph accept `&RepoContext` so the tree is
//! scanned once.

pub mod affected;
pub mod config;
pub mod modules;
pub mod plan;

pub use affected::run_affected;
pub use config::run_config;
pub use modules::run_modules;
pub use plan::{PlanOptions, run_plan};
