//! Storage trait definition.
//!
//! The `Storage` trait is the persistence collaborator of the accounting
//! module. Every entity and event operation is scoped to an owner id; rows
//! that belong to another owner behave exactly like rows that do not exist.

use std::path::Path;
use uuid::Uuid;

use super::types::{EntityFilter, StoreMetadata, UpsertOutcome, User};
use crate::entity::{Entity, EntityUpdate, NewEntity};
use crate::error::Result;
use crate::event::{Event, EventDetails, NewEvent};
use crate::time_window::TimeWindow;

/// Owner-scoped storage for users, entities, and events.
///
/// All implementations must ensure:
/// - At most one event per entity per active window (upsert-by-window)
/// - Events in closed windows are never modified or removed
/// - Entities are never deleted and never change category or type
pub trait Storage: Send + Sync {
    /// Create a new, empty database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `DailiesError::Storage` if the file already exists or cannot
    /// be written.
    fn create(path: &Path) -> Result<Self>
    where
        Self: Sized;

    /// Open an existing database.
    ///
    /// # Errors
    ///
    /// Returns `DailiesError::Storage` if the file is missing or is not a
    /// Dailies database.
    fn open(path: &Path) -> Result<Self>
    where
        Self: Sized;

    /// Get database metadata.
    fn metadata(&self) -> Result<StoreMetadata>;

    // --- User operations ---

    /// Resolve the owner for an identity token, creating it on first use.
    ///
    /// If the user exists and `name` differs from the stored name, the name
    /// is updated.
    fn ensure_user(&mut self, token_identifier: &str, name: Option<&str>) -> Result<User>;

    /// Look up the owner for an identity token.
    fn get_user_by_token(&self, token_identifier: &str) -> Result<Option<User>>;

    // --- Entity operations ---

    /// Create an entity for `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns `DailiesError::InvalidCategoryOrType` or
    /// `DailiesError::Validation` if the entity breaks a creation invariant.
    /// Nothing is written in that case.
    fn create_entity(&mut self, owner_id: &Uuid, entity: &NewEntity) -> Result<Uuid>;

    /// Get an entity by ID, or `None` if it does not exist for this owner.
    fn get_entity(&self, owner_id: &Uuid, id: &Uuid) -> Result<Option<Entity>>;

    /// List the owner's entities matching the filter, in creation order.
    fn list_entities(&self, owner_id: &Uuid, filter: &EntityFilter) -> Result<Vec<Entity>>;

    /// Update the mutable attributes of an entity and return the result.
    ///
    /// # Errors
    ///
    /// Returns `DailiesError::InvalidCategoryOrType` for a category or type
    /// change, and `DailiesError::Validation` for a reset interval change on
    /// an entity that already has events.
    fn update_entity(&mut self, owner_id: &Uuid, id: &Uuid, update: &EntityUpdate)
        -> Result<Entity>;

    // --- Event operations ---

    /// List all events for an entity, newest first.
    fn list_events(&self, owner_id: &Uuid, entity_id: &Uuid) -> Result<Vec<Event>>;

    /// Get an event by ID, or `None` if it does not exist for this owner.
    fn get_event(&self, owner_id: &Uuid, id: &Uuid) -> Result<Option<Event>>;

    /// The entity's event inside `window` (both ends inclusive), if any.
    fn current_event(
        &self,
        owner_id: &Uuid,
        entity_id: &Uuid,
        window: &TimeWindow,
    ) -> Result<Option<Event>>;

    /// Log an event at an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Returns `DailiesError::Validation` if the entity's window at that
    /// timestamp already holds an event.
    fn insert_event(&mut self, owner_id: &Uuid, event: &NewEvent) -> Result<Uuid>;

    /// Write `details` as the entity's event for the window active at `now`.
    ///
    /// Replaces the window's existing event (timestamp and details) or
    /// inserts a new one.
    fn upsert_current_event(
        &mut self,
        owner_id: &Uuid,
        entity_id: &Uuid,
        now: i64,
        details: &EventDetails,
    ) -> Result<UpsertOutcome>;

    /// Replace an event's details.
    ///
    /// # Errors
    ///
    /// Returns `DailiesError::WindowClosed` if the event's window ended
    /// before `now`.
    fn update_event(
        &mut self,
        owner_id: &Uuid,
        id: &Uuid,
        details: &EventDetails,
        now: i64,
    ) -> Result<()>;

    /// Remove an event from a window that is still open at `now`.
    fn delete_event(&mut self, owner_id: &Uuid, id: &Uuid, now: i64) -> Result<()>;

    // --- Maintenance operations ---

    /// Check database integrity.
    ///
    /// Verifies:
    /// - SQLite page integrity and foreign keys
    /// - Metadata keys
    /// - Event details match the type of their entity
    fn check_integrity(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_definition_compiles() {
        fn _accepts_storage<T: Storage>(_storage: T) {}
        fn _accepts_dyn(_storage: &dyn Storage) {}
    }
}
