use dailies_core::aggregation::{completion_ratio_for, current_event, most_recent_past_event};
use dailies_core::storage::{EntityFilter, Storage};
use dailies_core::time_window::{current_timestamp, window_for};
use dailies_core::{EntityCategory, EntityType, EntityUpdate, NewEntity, ResetInterval};

use crate::app::AppContext;
use crate::cli::{EntityAddArgs, EntityCommands, EntityEditArgs, EntityListArgs};
use crate::errors::CliError;
use crate::helpers::{parse_event_fields, require_entity};
use crate::output::{entity_detail_json, print_entity, print_entity_table, print_json};

pub fn handle_entity(ctx: &AppContext<'_>, command: &EntityCommands) -> anyhow::Result<()> {
    match command {
        EntityCommands::Add(args) => handle_add(ctx, args),
        EntityCommands::List(args) => handle_list(ctx, args),
        EntityCommands::Show { entity, json } => handle_show(ctx, entity, *json),
        EntityCommands::Edit(args) => handle_edit(ctx, args),
    }
}

fn handle_add(ctx: &AppContext<'_>, args: &EntityAddArgs) -> anyhow::Result<()> {
    let category: EntityCategory = args.category.parse()?;
    let entity_type: EntityType = args.entity_type.parse()?;
    let interval: ResetInterval = args.interval.parse()?;

    let mut new_entity = NewEntity::new(args.name.clone(), category, entity_type)
        .required(args.required)
        .reset_after(interval)
        .with_event_fields(parse_event_fields(&args.fields)?);
    if let Some(count) = args.required_completions {
        new_entity = new_entity.with_required_completions(count);
    }

    let (mut storage, owner) = ctx.open_storage()?;
    let id = storage.create_entity(&owner.id, &new_entity)?;

    if entity_type.needs_required_completions() && args.required_completions.is_none() {
        eprintln!(
            "Warning: \"{}\" has no required completion count and will stay at 0%.",
            args.name.trim()
        );
        eprintln!("Hint: Run `dailies entity edit {} --required-completions N`.", id);
    }
    if !ctx.quiet() {
        println!("Added entity {}", id);
    }
    Ok(())
}

fn handle_list(ctx: &AppContext<'_>, args: &EntityListArgs) -> anyhow::Result<()> {
    let mut filter = EntityFilter::new();
    if let Some(value) = args.entity_type.as_ref() {
        filter = filter.entity_type(value.parse()?);
    }
    if let Some(value) = args.category.as_ref() {
        filter = filter.category(value.parse()?);
    }

    let (storage, owner) = ctx.open_storage()?;
    let entities = storage.list_entities(&owner.id, &filter)?;

    if args.json {
        print_json(&entities)
    } else {
        print_entity_table(&entities);
        Ok(())
    }
}

fn handle_show(ctx: &AppContext<'_>, reference: &str, json: bool) -> anyhow::Result<()> {
    let (storage, owner) = ctx.open_storage()?;
    let entity = require_entity(&storage, &owner.id, reference)?;
    let events = storage.list_events(&owner.id, &entity.id)?;

    let now = current_timestamp();
    let window = window_for(entity.reset_after_interval, now);
    let current = current_event(&entity, &events, now);
    let completion = completion_ratio_for(&entity, current);
    let previous = most_recent_past_event(&entity, &events, now);

    if json {
        print_json(&entity_detail_json(
            &entity,
            &window,
            current,
            &completion,
            previous,
        ))
    } else {
        print_entity(&entity, &window, current, &completion, previous);
        Ok(())
    }
}

fn handle_edit(ctx: &AppContext<'_>, args: &EntityEditArgs) -> anyhow::Result<()> {
    let mut update = EntityUpdate::new();
    update.name = args.name.clone();
    if args.required {
        update.is_required = Some(true);
    } else if args.optional {
        update.is_required = Some(false);
    }
    if let Some(value) = args.interval.as_ref() {
        update.reset_after_interval = Some(value.parse()?);
    }
    if let Some(count) = args.required_completions {
        update.num_required_completions = Some(Some(count));
    } else if args.clear_required_completions {
        update.num_required_completions = Some(None);
    }
    if !args.fields.is_empty() {
        update.included_event_fields = Some(parse_event_fields(&args.fields)?);
    }
    if let Some(value) = args.category.as_ref() {
        update.category = Some(value.parse()?);
    }
    if let Some(value) = args.entity_type.as_ref() {
        update.entity_type = Some(value.parse()?);
    }
    if update.is_empty() {
        return Err(CliError::invalid_input("Nothing to change").into());
    }

    let (mut storage, owner) = ctx.open_storage()?;
    let entity = require_entity(&storage, &owner.id, &args.entity)?;
    let updated = storage.update_entity(&owner.id, &entity.id, &update)?;

    if !ctx.quiet() {
        println!("Updated entity {}", updated.id);
    }
    Ok(())
}
