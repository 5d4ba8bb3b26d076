//! CLI command implementations.
//!
//! Each submodule implements one top-level CLI command (evaluate, cache,
//! config).

pub mod cache;
pub mod config;
pub mod evaluate;

pub use cache::cmd_cache;
pub use config::cmd_config;
pub use evaluate::{cmd_evaluate, EvaluateOpts};
