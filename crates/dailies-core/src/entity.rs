//! Entities: the habits and activities a user tracks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DailiesError, Result};

/// Grouping used for aggregate progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityCategory {
    Exercise,
    Learning,
    Care,
    Thinking,
    Tidying,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 5] = [
        EntityCategory::Exercise,
        EntityCategory::Learning,
        EntityCategory::Care,
        EntityCategory::Thinking,
        EntityCategory::Tidying,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCategory::Exercise => "exercise",
            EntityCategory::Learning => "learning",
            EntityCategory::Care => "care",
            EntityCategory::Thinking => "thinking",
            EntityCategory::Tidying => "tidying",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EntityCategory::Exercise => "Exercise",
            EntityCategory::Learning => "Learning",
            EntityCategory::Care => "Care",
            EntityCategory::Thinking => "Thinking",
            EntityCategory::Tidying => "Tidying",
        }
    }

    /// Hex colour used when rendering the category.
    pub fn color_hex(&self) -> &'static str {
        match self {
            EntityCategory::Exercise => "#af52de",
            EntityCategory::Learning => "#34c759",
            EntityCategory::Care => "#007aff",
            EntityCategory::Thinking => "#ff3b30",
            EntityCategory::Tidying => "#fc9500",
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityCategory {
    type Err = DailiesError;

    fn from_str(value: &str) -> Result<Self> {
        EntityCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| DailiesError::InvalidInput(format!("Unknown category: {}", value)))
    }
}

/// How completion is measured for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityType {
    Workout,
    FlashCards,
    GenericCompletion,
}

impl EntityType {
    pub const ALL: [EntityType; 3] = [
        EntityType::Workout,
        EntityType::FlashCards,
        EntityType::GenericCompletion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Workout => "workout",
            EntityType::FlashCards => "flashCards",
            EntityType::GenericCompletion => "genericCompletion",
        }
    }

    /// The only category this type may be filed under, if it is restricted.
    pub fn required_category(&self) -> Option<EntityCategory> {
        match self {
            EntityType::Workout => Some(EntityCategory::Exercise),
            EntityType::FlashCards => Some(EntityCategory::Learning),
            EntityType::GenericCompletion => None,
        }
    }

    /// Whether accounting needs `num_required_completions` on the entity.
    pub fn needs_required_completions(&self) -> bool {
        matches!(self, EntityType::GenericCompletion)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = DailiesError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().replace(['-', '_'], "");
        EntityType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| DailiesError::InvalidInput(format!("Unknown entity type: {}", value)))
    }
}

/// Recurrence after which an entity's completion state resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResetInterval {
    Daily,
    Weekly,
}

impl ResetInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetInterval::Daily => "daily",
            ResetInterval::Weekly => "weekly",
        }
    }
}

impl fmt::Display for ResetInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResetInterval {
    type Err = DailiesError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(ResetInterval::Daily),
            "weekly" => Ok(ResetInterval::Weekly),
            _ => Err(DailiesError::InvalidInput(format!(
                "Unknown reset interval: {} (use daily or weekly)",
                value
            ))),
        }
    }
}

/// Workout measurements an entity asks to be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventField {
    Weight,
    NumReps,
    NumSets,
    Distance,
    DurationSeconds,
}

impl EventField {
    pub const ALL: [EventField; 5] = [
        EventField::Weight,
        EventField::NumReps,
        EventField::NumSets,
        EventField::Distance,
        EventField::DurationSeconds,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventField::Weight => "weight",
            EventField::NumReps => "numReps",
            EventField::NumSets => "numSets",
            EventField::Distance => "distance",
            EventField::DurationSeconds => "durationSeconds",
        }
    }
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventField {
    type Err = DailiesError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().replace(['-', '_'], "");
        EventField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| DailiesError::InvalidInput(format!("Unknown event field: {}", value)))
    }
}

/// A persisted entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub category: EntityCategory,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub is_required: bool,
    pub reset_after_interval: ResetInterval,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_required_completions: Option<u32>,
    #[serde(default)]
    pub included_event_fields: Vec<EventField>,
}

/// Builder for creating new entities.
#[derive(Debug, Clone)]
pub struct NewEntity {
    pub name: String,
    pub category: EntityCategory,
    pub entity_type: EntityType,
    pub is_required: bool,
    pub reset_after_interval: ResetInterval,
    pub num_required_completions: Option<u32>,
    pub included_event_fields: Vec<EventField>,
}

impl NewEntity {
    pub fn new(name: impl Into<String>, category: EntityCategory, entity_type: EntityType) -> Self {
        Self {
            name: name.into(),
            category,
            entity_type,
            is_required: false,
            reset_after_interval: ResetInterval::Daily,
            num_required_completions: None,
            included_event_fields: Vec::new(),
        }
    }

    pub fn required(mut self, is_required: bool) -> Self {
        self.is_required = is_required;
        self
    }

    pub fn reset_after(mut self, interval: ResetInterval) -> Self {
        self.reset_after_interval = interval;
        self
    }

    pub fn with_required_completions(mut self, count: u32) -> Self {
        self.num_required_completions = Some(count);
        self
    }

    pub fn with_event_fields(mut self, fields: Vec<EventField>) -> Self {
        self.included_event_fields = fields;
        self
    }

    /// Check creation invariants and return the normalized form to persist.
    ///
    /// # Errors
    ///
    /// Returns `DailiesError::InvalidCategoryOrType` when the type is filed
    /// under a category it does not belong to, and `DailiesError::Validation`
    /// for an empty name or a zero completion count.
    pub fn validate(&self) -> Result<NewEntity> {
        validate_category_for_type(self.category, self.entity_type)?;
        let name = validate_name(&self.name)?;
        validate_required_completions(self.num_required_completions)?;

        Ok(NewEntity {
            name,
            included_event_fields: normalize_event_fields(&self.included_event_fields),
            ..self.clone()
        })
    }
}

/// Changes to the mutable attributes of an existing entity.
///
/// Category and type are fixed at creation; passing a different value is
/// rejected rather than silently ignored.
#[derive(Debug, Clone, Default)]
pub struct EntityUpdate {
    pub name: Option<String>,
    pub category: Option<EntityCategory>,
    pub entity_type: Option<EntityType>,
    pub is_required: Option<bool>,
    pub reset_after_interval: Option<ResetInterval>,
    /// `Some(None)` clears the value.
    pub num_required_completions: Option<Option<u32>>,
    pub included_event_fields: Option<Vec<EventField>>,
}

impl EntityUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.entity_type.is_none()
            && self.is_required.is_none()
            && self.reset_after_interval.is_none()
            && self.num_required_completions.is_none()
            && self.included_event_fields.is_none()
    }

    /// Apply the update to `entity`, returning the updated copy.
    pub fn apply_to(&self, entity: &Entity) -> Result<Entity> {
        if let Some(category) = self.category {
            if category != entity.category {
                return Err(DailiesError::InvalidCategoryOrType(format!(
                    "Category of \"{}\" cannot change after creation",
                    entity.name
                )));
            }
        }
        if let Some(entity_type) = self.entity_type {
            if entity_type != entity.entity_type {
                return Err(DailiesError::InvalidCategoryOrType(format!(
                    "Type of \"{}\" cannot change after creation",
                    entity.name
                )));
            }
        }

        let mut updated = entity.clone();
        if let Some(ref name) = self.name {
            updated.name = validate_name(name)?;
        }
        if let Some(is_required) = self.is_required {
            updated.is_required = is_required;
        }
        if let Some(interval) = self.reset_after_interval {
            updated.reset_after_interval = interval;
        }
        if let Some(count) = self.num_required_completions {
            validate_required_completions(count)?;
            updated.num_required_completions = count;
        }
        if let Some(ref fields) = self.included_event_fields {
            updated.included_event_fields = normalize_event_fields(fields);
        }
        Ok(updated)
    }
}

/// Reject type/category combinations that accounting does not support.
pub fn validate_category_for_type(category: EntityCategory, entity_type: EntityType) -> Result<()> {
    match entity_type.required_category() {
        Some(required) if required != category => Err(DailiesError::InvalidCategoryOrType(format!(
            "{} entities must use the {} category (got {})",
            entity_type, required, category
        ))),
        _ => Ok(()),
    }
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DailiesError::Validation(
            "Entity name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_required_completions(count: Option<u32>) -> Result<()> {
    if count == Some(0) {
        return Err(DailiesError::Validation(
            "Required completions must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn normalize_event_fields(fields: &[EventField]) -> Vec<EventField> {
    let mut normalized = fields.to_vec();
    normalized.sort();
    normalized.dedup();
    normalized
}
