//! Row types for entity and event queries.

use rusqlite::Row;
use uuid::Uuid;

use crate::entity::{Entity, EventField};
use crate::error::{DailiesError, Result};
use crate::event::Event;

pub const ENTITY_COLUMNS: &str = "id, owner_id, name, category, entity_type, is_required, \
     reset_after_interval, num_required_completions, included_event_fields_json";

pub const EVENT_COLUMNS: &str = "id, owner_id, entity_id, timestamp, details_json";

/// Raw row data from the entities table, before parsing into domain types.
#[derive(Debug)]
pub struct EntityRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub category: String,
    pub entity_type: String,
    pub is_required: bool,
    pub reset_after_interval: String,
    pub num_required_completions: Option<u32>,
    pub included_event_fields_json: String,
}

impl EntityRow {
    /// Read a row selected with [`ENTITY_COLUMNS`].
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            category: row.get(3)?,
            entity_type: row.get(4)?,
            is_required: row.get(5)?,
            reset_after_interval: row.get(6)?,
            num_required_completions: row.get(7)?,
            included_event_fields_json: row.get(8)?,
        })
    }
}

impl TryFrom<EntityRow> for Entity {
    type Error = DailiesError;

    fn try_from(row: EntityRow) -> Result<Self> {
        let id = parse_uuid(&row.id, "entity")?;
        let owner_id = parse_uuid(&row.owner_id, "owner")?;
        let category = row
            .category
            .parse()
            .map_err(|e| DailiesError::Storage(format!("Invalid stored category: {}", e)))?;
        let entity_type = row
            .entity_type
            .parse()
            .map_err(|e| DailiesError::Storage(format!("Invalid stored entity type: {}", e)))?;
        let reset_after_interval = row
            .reset_after_interval
            .parse()
            .map_err(|e| DailiesError::Storage(format!("Invalid stored interval: {}", e)))?;
        let field_names: Vec<String> = serde_json::from_str(&row.included_event_fields_json)
            .map_err(|e| DailiesError::Storage(format!("Invalid event fields JSON: {}", e)))?;
        let included_event_fields = field_names
            .iter()
            .map(|name| name.parse::<EventField>())
            .collect::<Result<Vec<_>>>()
            .map_err(|e| DailiesError::Storage(format!("Invalid stored event field: {}", e)))?;

        Ok(Entity {
            id,
            owner_id,
            name: row.name,
            category,
            entity_type,
            is_required: row.is_required,
            reset_after_interval,
            num_required_completions: row.num_required_completions,
            included_event_fields,
        })
    }
}

/// Raw row data from the events table.
#[derive(Debug)]
pub struct EventRow {
    pub id: String,
    pub owner_id: String,
    pub entity_id: String,
    pub timestamp: i64,
    pub details_json: String,
}

impl EventRow {
    /// Read a row selected with [`EVENT_COLUMNS`].
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            entity_id: row.get(2)?,
            timestamp: row.get(3)?,
            details_json: row.get(4)?,
        })
    }
}

impl TryFrom<EventRow> for Event {
    type Error = DailiesError;

    fn try_from(row: EventRow) -> Result<Self> {
        let details = serde_json::from_str(&row.details_json)
            .map_err(|e| DailiesError::Storage(format!("Invalid event details JSON: {}", e)))?;

        Ok(Event {
            id: parse_uuid(&row.id, "event")?,
            owner_id: parse_uuid(&row.owner_id, "owner")?,
            entity_id: parse_uuid(&row.entity_id, "entity")?,
            timestamp: row.timestamp,
            details,
        })
    }
}

pub fn parse_uuid(value: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| DailiesError::Storage(format!("Invalid {} UUID: {}", what, e)))
}
