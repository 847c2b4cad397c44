//! Output formatting helpers for the CLI.
//!
//! This module provides formatting utilities for displaying entities,
//! events, and progress in JSON or as text tables.

mod json;
mod text;

// Re-export public API
pub use json::{entity_detail_json, print_json};
pub use text::{
    describe_details, format_timestamp, print_entity, print_entity_table, print_event_list,
    print_status,
};
