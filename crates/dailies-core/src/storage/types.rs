//! Storage-level records and query builders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{EntityCategory, EntityType};

/// Metadata for a Dailies database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMetadata {
    /// Format version (e.g., "0.1")
    pub format_version: String,

    /// When this database was created
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp (informational)
    pub last_modified: DateTime<Utc>,
}

/// An owner of entities and events, resolved from an identity token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub token_identifier: String,
}

/// What an upsert-by-window write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No event existed for the window; a new one was created
    Inserted(Uuid),

    /// The window's existing event was replaced in place
    Replaced(Uuid),
}

impl UpsertOutcome {
    pub fn event_id(&self) -> Uuid {
        match self {
            UpsertOutcome::Inserted(id) | UpsertOutcome::Replaced(id) => *id,
        }
    }

    pub fn was_replaced(&self) -> bool {
        matches!(self, UpsertOutcome::Replaced(_))
    }
}

/// Filter for listing entities.
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    /// Filter by entity type
    pub entity_type: Option<EntityType>,

    /// Filter by category
    pub category: Option<EntityCategory>,
}

impl EntityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_type(mut self, entity_type: EntityType) -> Self {
        self.entity_type = Some(entity_type);
        self
    }

    pub fn category(mut self, category: EntityCategory) -> Self {
        self.category = Some(category);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_filter_builder() {
        let filter = EntityFilter::new()
            .entity_type(EntityType::Workout)
            .category(EntityCategory::Exercise);

        assert_eq!(filter.entity_type, Some(EntityType::Workout));
        assert_eq!(filter.category, Some(EntityCategory::Exercise));
    }

    #[test]
    fn test_upsert_outcome_accessors() {
        let id = Uuid::new_v4();
        assert_eq!(UpsertOutcome::Inserted(id).event_id(), id);
        assert!(UpsertOutcome::Replaced(id).was_replaced());
        assert!(!UpsertOutcome::Inserted(id).was_replaced());
    }
}
