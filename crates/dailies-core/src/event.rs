//! Events: timestamped occurrences logged against an entity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{EntityType, EventField};
use crate::error::{DailiesError, Result};

/// Per-set weight that differs from the workout's headline weight.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_sets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weight_overrides: Vec<WeightOverride>,
}

impl WorkoutPayload {
    pub fn has_field(&self, field: EventField) -> bool {
        match field {
            EventField::Weight => self.weight.is_some(),
            EventField::NumReps => self.num_reps.is_some(),
            EventField::NumSets => self.num_sets.is_some(),
            EventField::Distance => self.distance.is_some(),
            EventField::DurationSeconds => self.duration_seconds.is_some(),
        }
    }

    /// Fields the entity asks for that this workout did not record.
    pub fn missing_fields(&self, included: &[EventField]) -> Vec<EventField> {
        included
            .iter()
            .copied()
            .filter(|field| !self.has_field(*field))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashCardsPayload {
    pub num_reviewed: u32,
    pub num_correct: u32,
}

impl FlashCardsPayload {
    /// Share of reviewed cards answered correctly, 0 when nothing was reviewed.
    pub fn accuracy(&self) -> f64 {
        if self.num_reviewed == 0 {
            return 0.0;
        }
        f64::from(self.num_correct) / f64::from(self.num_reviewed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericCompletionPayload {
    pub num_completions: u32,
    pub num_required_completions: u32,
}

/// Type-specific event data, tagged by the entity type it belongs to.
///
/// Serialized as `{"type": "...", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum EventDetails {
    Workout(WorkoutPayload),
    FlashCards(FlashCardsPayload),
    GenericCompletion(GenericCompletionPayload),
}

impl EventDetails {
    pub fn entity_type(&self) -> EntityType {
        match self {
            EventDetails::Workout(_) => EntityType::Workout,
            EventDetails::FlashCards(_) => EntityType::FlashCards,
            EventDetails::GenericCompletion(_) => EntityType::GenericCompletion,
        }
    }

    /// Check payload consistency and that it belongs to an entity of `entity_type`.
    pub fn validate_for(&self, entity_type: EntityType) -> Result<()> {
        if self.entity_type() != entity_type {
            return Err(DailiesError::Validation(format!(
                "Event details of type {} cannot be logged against a {} entity",
                self.entity_type(),
                entity_type
            )));
        }

        match self {
            EventDetails::Workout(payload) => {
                let measurements = [payload.weight, payload.distance]
                    .into_iter()
                    .flatten()
                    .chain(payload.weight_overrides.iter().filter_map(|o| o.weight));
                for value in measurements {
                    if !value.is_finite() || value < 0.0 {
                        return Err(DailiesError::Validation(format!(
                            "Workout measurements must be non-negative numbers (got {})",
                            value
                        )));
                    }
                }
            }
            EventDetails::FlashCards(payload) => {
                if payload.num_correct > payload.num_reviewed {
                    return Err(DailiesError::Validation(format!(
                        "Correct count ({}) exceeds reviewed count ({})",
                        payload.num_correct, payload.num_reviewed
                    )));
                }
            }
            EventDetails::GenericCompletion(_) => {}
        }
        Ok(())
    }
}

/// A persisted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub entity_id: Uuid,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub details: EventDetails,
}

/// Builder for logging a new event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub entity_id: Uuid,
    pub timestamp: i64,
    pub details: EventDetails,
}

impl NewEvent {
    pub fn new(entity_id: Uuid, timestamp: i64, details: EventDetails) -> Self {
        Self {
            entity_id,
            timestamp,
            details,
        }
    }
}
