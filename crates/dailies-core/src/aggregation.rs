//! Per-entity completion accounting.
//!
//! Given an entity and the event that is authoritative for its active window,
//! decide how complete the entity is (a ratio in `[0, 1]`) and whether it is
//! done. Missing or mismatched event data counts as "not done".

use std::fmt;

use chrono::{Local, TimeZone};
use serde::Serialize;
use uuid::Uuid;

use crate::entity::{Entity, EntityType};
use crate::error::DailiesError;
use crate::event::{Event, EventDetails};
use crate::time_window::window_for_in;

/// Reviews needed in one window for a flash-card entity to count as done.
pub const FLASH_CARD_REVIEW_TARGET: u32 = 100;

/// An entity whose configuration prevents meaningful accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationIssue {
    pub entity_id: Uuid,
    pub entity_name: String,
    pub reason: String,
}

impl ConfigurationIssue {
    fn missing_required_completions(entity: &Entity) -> Self {
        Self {
            entity_id: entity.id,
            entity_name: entity.name.clone(),
            reason: format!(
                "{} entity has no required completion count",
                entity.entity_type
            ),
        }
    }
}

impl fmt::Display for ConfigurationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\": {}", self.entity_name, self.reason)
    }
}

impl From<ConfigurationIssue> for DailiesError {
    fn from(issue: ConfigurationIssue) -> Self {
        DailiesError::Configuration(issue.to_string())
    }
}

/// Completion of one entity for its active window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCompletion {
    /// Always within `[0, 1]`
    pub ratio: f64,

    /// Set when the ratio is 0 because the entity is misconfigured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_issue: Option<ConfigurationIssue>,
}

impl EntityCompletion {
    fn ratio(ratio: f64) -> Self {
        Self {
            ratio: ratio.clamp(0.0, 1.0),
            configuration_issue: None,
        }
    }

    fn misconfigured(issue: ConfigurationIssue) -> Self {
        Self {
            ratio: 0.0,
            configuration_issue: Some(issue),
        }
    }

    pub fn is_done(&self) -> bool {
        self.ratio >= 1.0
    }
}

/// Completion ratio of `entity` given its current event, if any.
pub fn completion_ratio_for(entity: &Entity, current_event: Option<&Event>) -> EntityCompletion {
    match entity.entity_type {
        EntityType::GenericCompletion => {
            let required = match entity.num_required_completions {
                Some(required) if required > 0 => required,
                _ => {
                    return EntityCompletion::misconfigured(
                        ConfigurationIssue::missing_required_completions(entity),
                    )
                }
            };
            match current_event.map(|event| &event.details) {
                Some(EventDetails::GenericCompletion(payload)) => EntityCompletion::ratio(
                    f64::from(payload.num_completions) / f64::from(required),
                ),
                _ => EntityCompletion::ratio(0.0),
            }
        }
        EntityType::FlashCards => match current_event.map(|event| &event.details) {
            Some(EventDetails::FlashCards(payload))
                if payload.num_reviewed >= FLASH_CARD_REVIEW_TARGET =>
            {
                EntityCompletion::ratio(1.0)
            }
            _ => EntityCompletion::ratio(0.0),
        },
        EntityType::Workout => {
            EntityCompletion::ratio(if current_event.is_some() { 1.0 } else { 0.0 })
        }
    }
}

pub fn is_done(entity: &Entity, current_event: Option<&Event>) -> bool {
    completion_ratio_for(entity, current_event).is_done()
}

/// The event for `entity` inside its active window at `now` (local zone).
pub fn current_event<'a>(entity: &Entity, events: &'a [Event], now: i64) -> Option<&'a Event> {
    current_event_in(&Local, entity, events, now)
}

/// The event for `entity` inside its active window at `now`.
///
/// Upsert-by-window keeps one event per window; if a list still holds several
/// (for example after an import), the latest one is authoritative.
pub fn current_event_in<'a, Tz: TimeZone>(
    tz: &Tz,
    entity: &Entity,
    events: &'a [Event],
    now: i64,
) -> Option<&'a Event> {
    let window = window_for_in(tz, entity.reset_after_interval, now);
    events
        .iter()
        .filter(|event| event.entity_id == entity.id && window.contains(event.timestamp))
        .max_by_key(|event| event.timestamp)
}

/// The latest event for `entity` logged before its active window.
pub fn most_recent_past_event<'a>(
    entity: &Entity,
    events: &'a [Event],
    now: i64,
) -> Option<&'a Event> {
    most_recent_past_event_in(&Local, entity, events, now)
}

pub fn most_recent_past_event_in<'a, Tz: TimeZone>(
    tz: &Tz,
    entity: &Entity,
    events: &'a [Event],
    now: i64,
) -> Option<&'a Event> {
    let window = window_for_in(tz, entity.reset_after_interval, now);
    events
        .iter()
        .filter(|event| event.entity_id == entity.id && event.timestamp < window.start_timestamp)
        .max_by_key(|event| event.timestamp)
}
