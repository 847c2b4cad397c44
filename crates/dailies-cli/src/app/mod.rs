//! Application-level utilities for the Dailies CLI.
//!
//! This module provides:
//! - Path resolution for config and database files
//! - The per-invocation application context

mod context;
mod resolver;

// Re-export public API
pub use context::AppContext;
pub use resolver::resolve_config_path;
