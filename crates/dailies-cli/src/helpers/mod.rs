//! Input and parsing helper functions for the CLI.

mod lookup;
mod parsing;

// Re-export public API
pub use lookup::{require_entity, require_event};
pub use parsing::{parse_event_fields, parse_timestamp};
