//! Progress reports across all of an owner's entities.

use std::collections::HashMap;

use chrono::{Local, TimeZone};
use serde::Serialize;
use uuid::Uuid;

use crate::aggregation::{completion_ratio_for, current_event_in, ConfigurationIssue};
use crate::category::category_completion_ratio;
use crate::entity::{Entity, EntityCategory};
use crate::error::Result;
use crate::event::Event;
use crate::storage::{EntityFilter, Storage};
use crate::time_window::{window_for_in, TimeWindow};

/// One entity's state for its active window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityProgress {
    pub entity: Entity,
    pub window: TimeWindow,
    pub current_event: Option<Event>,
    pub ratio: f64,
    pub is_done: bool,
}

/// Aggregate completion of one category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProgress {
    pub category: EntityCategory,
    pub ratio: f64,
    pub entity_ids: Vec<Uuid>,
}

impl CategoryProgress {
    pub fn is_complete(&self) -> bool {
        self.ratio >= 1.0
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    /// Milliseconds since the Unix epoch the report was computed for
    pub now: i64,
    pub entities: Vec<EntityProgress>,
    /// Every category, in display order, including empty ones
    pub categories: Vec<CategoryProgress>,
    pub configuration_issues: Vec<ConfigurationIssue>,
}

impl ProgressReport {
    /// Build a report in the local time zone.
    pub fn build(entities: &[Entity], events: &[Event], now: i64) -> Self {
        Self::build_in(&Local, entities, events, now)
    }

    pub fn build_in<Tz: TimeZone>(tz: &Tz, entities: &[Entity], events: &[Event], now: i64) -> Self {
        let mut progress = Vec::with_capacity(entities.len());
        let mut ratios = HashMap::with_capacity(entities.len());
        let mut configuration_issues = Vec::new();

        for entity in entities {
            let current = current_event_in(tz, entity, events, now);
            let completion = completion_ratio_for(entity, current);
            if let Some(issue) = &completion.configuration_issue {
                tracing::debug!(
                    entity_id = %issue.entity_id,
                    reason = %issue.reason,
                    "entity misconfigured"
                );
                configuration_issues.push(issue.clone());
            }
            ratios.insert(entity.id, completion.ratio);
            progress.push(EntityProgress {
                entity: entity.clone(),
                window: window_for_in(tz, entity.reset_after_interval, now),
                current_event: current.cloned(),
                ratio: completion.ratio,
                is_done: completion.is_done(),
            });
        }

        let categories = EntityCategory::ALL
            .iter()
            .map(|&category| CategoryProgress {
                category,
                ratio: category_completion_ratio(entities, &ratios, category),
                entity_ids: entities
                    .iter()
                    .filter(|entity| entity.category == category)
                    .map(|entity| entity.id)
                    .collect(),
            })
            .collect();

        Self {
            now,
            entities: progress,
            categories,
            configuration_issues,
        }
    }

    /// Entity id to done flag.
    pub fn done_by_entity(&self) -> HashMap<Uuid, bool> {
        self.entities
            .iter()
            .map(|progress| (progress.entity.id, progress.is_done))
            .collect()
    }

    /// Entity id to completion ratio.
    pub fn ratio_by_entity(&self) -> HashMap<Uuid, f64> {
        self.entities
            .iter()
            .map(|progress| (progress.entity.id, progress.ratio))
            .collect()
    }

    pub fn category(&self, category: EntityCategory) -> Option<&CategoryProgress> {
        self.categories
            .iter()
            .find(|progress| progress.category == category)
    }
}

/// Load every entity and event for `owner_id` and build a report at `now`.
pub fn load_progress<S: Storage + ?Sized>(
    storage: &S,
    owner_id: &Uuid,
    now: i64,
) -> Result<ProgressReport> {
    let entities = storage.list_entities(owner_id, &EntityFilter::new())?;
    let mut events = Vec::new();
    for entity in &entities {
        events.extend(storage.list_events(owner_id, &entity.id)?);
    }
    tracing::debug!(
        entities = entities.len(),
        events = events.len(),
        "building progress report"
    );
    Ok(ProgressReport::build(&entities, &events, now))
}
