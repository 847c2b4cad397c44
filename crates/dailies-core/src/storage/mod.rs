//! Storage abstractions and the SQLite backend.

pub mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::SqliteStorage;
pub use traits::Storage;
pub use types::{EntityFilter, StoreMetadata, UpsertOutcome, User};
