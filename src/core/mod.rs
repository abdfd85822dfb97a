//! Core engine for tg-impact
//!
//! - **config**: monitor configuration (JSON) loading and validation
//! - **context**: config + module graph, built once per invocation
//! - **error**: error types with contextual help messages and exit codes
//! - **executor**: runs validation plans one module at a time
//! - **plan**: ordered, content-addressed validation plans
//! - **vcs**: change sets from git (SystemGit) or the command line

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod plan;
pub mod vcs;
