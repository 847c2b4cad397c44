use dailies_core::aggregation::completion_ratio_for;
use dailies_core::event::{FlashCardsPayload, GenericCompletionPayload, WorkoutPayload};
use dailies_core::storage::{SqliteStorage, Storage};
use dailies_core::time_window::{current_timestamp, window_for};
use dailies_core::{Entity, EntityType, EventDetails, NewEvent};
use uuid::Uuid;

use crate::app::AppContext;
use crate::cli::{EventsArgs, EventsCommands, LogArgs};
use crate::constants::DEFAULT_EVENT_LIMIT;
use crate::errors::CliError;
use crate::helpers::{parse_timestamp, require_entity, require_event};
use crate::output::{describe_details, format_timestamp, print_event_list, print_json};

pub fn handle_log(ctx: &AppContext<'_>, args: &LogArgs) -> anyhow::Result<()> {
    let now = current_timestamp();
    let timestamp = match args.at.as_ref() {
        Some(value) => parse_timestamp(value)?,
        None => now,
    };
    if timestamp > now {
        return Err(CliError::invalid_input("Cannot log events in the future").into());
    }

    let (mut storage, owner) = ctx.open_storage()?;
    let entity = require_entity(&storage, &owner.id, &args.entity)?;
    reject_foreign_flags(&entity, args)?;

    let details = build_details(&storage, &owner.id, &entity, timestamp, args)?;

    let window = window_for(entity.reset_after_interval, timestamp);
    let (event_id, replaced) = if window.is_closed_at(now) {
        let id = storage.insert_event(&owner.id, &NewEvent::new(entity.id, timestamp, details))?;
        (id, false)
    } else {
        let outcome = storage.upsert_current_event(&owner.id, &entity.id, timestamp, &details)?;
        (outcome.event_id(), outcome.was_replaced())
    };

    if !ctx.quiet() {
        let event = require_event(&storage, &owner.id, &event_id.to_string())?;
        let completion = completion_ratio_for(&entity, Some(&event));
        println!(
            "{} {}: {} ({:.0}%{})",
            if replaced { "Updated" } else { "Logged" },
            entity.name,
            describe_details(&event.details),
            completion.ratio * 100.0,
            if completion.is_done() { ", done" } else { "" }
        );
        if let Some(issue) = &completion.configuration_issue {
            eprintln!("Warning: {}", issue);
        }
    }
    Ok(())
}

pub fn handle_events(ctx: &AppContext<'_>, args: &EventsArgs) -> anyhow::Result<()> {
    if let Some(EventsCommands::Delete { id }) = args.command.as_ref() {
        return handle_delete(ctx, id);
    }

    let reference = args.entity.as_ref().ok_or_else(|| {
        CliError::invalid_input("Specify an entity: dailies events <ENTITY>")
    })?;

    let (storage, owner) = ctx.open_storage()?;
    let entity = require_entity(&storage, &owner.id, reference)?;
    let mut events = storage.list_events(&owner.id, &entity.id)?;
    events.truncate(args.limit.unwrap_or(DEFAULT_EVENT_LIMIT));

    if args.json {
        print_json(&events)
    } else {
        print_event_list(&events);
        Ok(())
    }
}

fn handle_delete(ctx: &AppContext<'_>, reference: &str) -> anyhow::Result<()> {
    let (mut storage, owner) = ctx.open_storage()?;
    let event = require_event(&storage, &owner.id, reference)?;
    storage.delete_event(&owner.id, &event.id, current_timestamp())?;

    if !ctx.quiet() {
        println!(
            "Deleted event {} logged at {}",
            event.id,
            format_timestamp(event.timestamp)
        );
    }
    Ok(())
}

fn given_flags(args: &LogArgs) -> Vec<(&'static str, EntityType)> {
    let mut flags = Vec::new();
    if args.completions.is_some() {
        flags.push(("--completions", EntityType::GenericCompletion));
    }
    if args.reviewed.is_some() {
        flags.push(("--reviewed", EntityType::FlashCards));
    }
    if args.correct.is_some() {
        flags.push(("--correct", EntityType::FlashCards));
    }
    if args.weight.is_some() {
        flags.push(("--weight", EntityType::Workout));
    }
    if args.reps.is_some() {
        flags.push(("--reps", EntityType::Workout));
    }
    if args.sets.is_some() {
        flags.push(("--sets", EntityType::Workout));
    }
    if args.distance.is_some() {
        flags.push(("--distance", EntityType::Workout));
    }
    if args.duration.is_some() {
        flags.push(("--duration", EntityType::Workout));
    }
    flags
}

fn reject_foreign_flags(entity: &Entity, args: &LogArgs) -> anyhow::Result<()> {
    match given_flags(args)
        .into_iter()
        .find(|(_, entity_type)| *entity_type != entity.entity_type)
    {
        Some((flag, entity_type)) => Err(CliError::invalid_input(format!(
            "{} applies to {} entities, but \"{}\" is {}",
            flag, entity_type, entity.name, entity.entity_type
        ))
        .into()),
        None => Ok(()),
    }
}

fn build_details(
    storage: &SqliteStorage,
    owner_id: &Uuid,
    entity: &Entity,
    timestamp: i64,
    args: &LogArgs,
) -> anyhow::Result<EventDetails> {
    match entity.entity_type {
        EntityType::GenericCompletion => {
            let num_completions = match args.completions {
                Some(count) => count,
                None => {
                    let window = window_for(entity.reset_after_interval, timestamp);
                    let logged = match storage.current_event(owner_id, &entity.id, &window)? {
                        Some(event) => match event.details {
                            EventDetails::GenericCompletion(payload) => payload.num_completions,
                            _ => 0,
                        },
                        None => 0,
                    };
                    logged.saturating_add(1)
                }
            };
            Ok(EventDetails::GenericCompletion(GenericCompletionPayload {
                num_completions,
                num_required_completions: entity.num_required_completions.unwrap_or(0),
            }))
        }
        EntityType::FlashCards => {
            let num_reviewed = args.reviewed.ok_or_else(|| {
                CliError::invalid_input(format!(
                    "\"{}\" is a flashCards entity; pass --reviewed N",
                    entity.name
                ))
            })?;
            Ok(EventDetails::FlashCards(FlashCardsPayload {
                num_reviewed,
                num_correct: args.correct.unwrap_or(0),
            }))
        }
        EntityType::Workout => {
            let payload = WorkoutPayload {
                weight: args.weight,
                num_reps: args.reps,
                num_sets: args.sets,
                distance: args.distance,
                duration_seconds: args.duration,
                weight_overrides: Vec::new(),
            };
            let missing = payload.missing_fields(&entity.included_event_fields);
            if !missing.is_empty() {
                let names: Vec<&str> = missing.iter().map(|field| field.as_str()).collect();
                eprintln!(
                    "Warning: \"{}\" usually records {}; logging without it.",
                    entity.name,
                    names.join(", ")
                );
            }
            Ok(EventDetails::Workout(payload))
        }
    }
}
