//! # Dailies Core
//!
//! Core library for Dailies - completion accounting for recurring daily and
//! weekly habits.
//!
//! This crate provides the accounting logic, domain models, and storage
//! abstractions independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **time_window**: Day and week window boundaries
//! - **entity** / **event**: Trackable habits and their logged events
//! - **aggregation**: Per-entity completion for the active window
//! - **category**: Category-level completion ratios
//! - **progress**: Full reports across an owner's entities
//! - **storage**: Storage trait and the SQLite implementation

pub mod aggregation;
pub mod category;
pub mod entity;
pub mod error;
pub mod event;
pub mod progress;
pub mod storage;
pub mod time_window;

pub use aggregation::{completion_ratio_for, is_done, ConfigurationIssue, EntityCompletion};
pub use category::{aggregate_ratios, category_completion_ratio, CategoryMember};
pub use entity::{
    Entity, EntityCategory, EntityType, EntityUpdate, EventField, NewEntity, ResetInterval,
};
pub use error::{DailiesError, Result};
pub use event::{Event, EventDetails, NewEvent};
pub use progress::{load_progress, CategoryProgress, EntityProgress, ProgressReport};
pub use storage::{SqliteStorage, Storage};
pub use time_window::{current_timestamp, TimeWindow};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
