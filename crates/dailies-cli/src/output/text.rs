//! Text and table output formatting.

use std::io::IsTerminal;

use chrono::{Local, TimeZone};
use comfy_table::presets::NOTHING;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use owo_colors::OwoColorize;

use dailies_core::progress::ProgressReport;
use dailies_core::{Entity, EntityCategory, EntityCompletion, Event, EventDetails, TimeWindow};

const SHORT_ID_LEN: usize = 8;
const BAR_WIDTH: usize = 10;

/// Format epoch milliseconds in the local zone.
pub fn format_timestamp(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(local) => local.format("%Y-%m-%d %H:%M").to_string(),
        None => millis.to_string(),
    }
}

fn format_percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

fn progress_bar(ratio: f64) -> String {
    let filled = (ratio.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn short_id(entity: &Entity) -> String {
    entity.id.to_string()[..SHORT_ID_LEN].to_string()
}

fn category_rgb(category: EntityCategory) -> (u8, u8, u8) {
    let hex = category.color_hex().trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|part| u8::from_str_radix(part, 16).ok())
            .unwrap_or(255)
    };
    (channel(0..2), channel(2..4), channel(4..6))
}

fn category_cell(category: EntityCategory, color: bool) -> Cell {
    let cell = Cell::new(category.display_name());
    if color {
        let (r, g, b) = category_rgb(category);
        cell.fg(Color::Rgb { r, g, b })
    } else {
        cell
    }
}

fn base_table(color: bool, headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|header| {
            let cell = Cell::new(header);
            if color {
                cell.add_attribute(Attribute::Dim)
            } else {
                cell
            }
        })
        .collect();
    table.set_header(header_cells);
    for i in 0..headers.len() {
        if let Some(column) = table.column_mut(i) {
            column.set_padding((0, 2));
        }
    }
    table
}

fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// One-line description of an event's details.
pub fn describe_details(details: &EventDetails) -> String {
    match details {
        EventDetails::GenericCompletion(payload) => format!(
            "{}/{} completions",
            payload.num_completions, payload.num_required_completions
        ),
        EventDetails::FlashCards(payload) => format!(
            "{} reviewed, {} correct ({:.0}%)",
            payload.num_reviewed,
            payload.num_correct,
            payload.accuracy() * 100.0
        ),
        EventDetails::Workout(payload) => {
            let mut parts = Vec::new();
            if let Some(weight) = payload.weight {
                parts.push(format!("weight {}", weight));
            }
            if let Some(sets) = payload.num_sets {
                parts.push(format!("{} sets", sets));
            }
            if let Some(reps) = payload.num_reps {
                parts.push(format!("{} reps", reps));
            }
            if let Some(distance) = payload.distance {
                parts.push(format!("distance {}", distance));
            }
            if let Some(seconds) = payload.duration_seconds {
                parts.push(format!("{}s", seconds));
            }
            if !payload.weight_overrides.is_empty() {
                parts.push(format!("{} weight overrides", payload.weight_overrides.len()));
            }
            if parts.is_empty() {
                "workout logged".to_string()
            } else {
                parts.join(", ")
            }
        }
    }
}

/// Print entities as a table.
pub fn print_entity_table(entities: &[Entity]) {
    if entities.is_empty() {
        println!("No entities.");
        return;
    }

    let color = use_color();
    let mut table = base_table(
        color,
        &["ID", "NAME", "CATEGORY", "TYPE", "REQUIRED", "RESETS", "TARGET"],
    );
    for entity in entities {
        let target = match entity.num_required_completions {
            Some(count) => count.to_string(),
            None => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(short_id(entity)),
            Cell::new(&entity.name),
            category_cell(entity.category, color),
            Cell::new(entity.entity_type.as_str()),
            Cell::new(if entity.is_required { "yes" } else { "no" }),
            Cell::new(entity.reset_after_interval.as_str()),
            Cell::new(target),
        ]);
    }
    println!("{}", table);
}

/// Print a single entity with its state for the active window.
pub fn print_entity(
    entity: &Entity,
    window: &TimeWindow,
    current_event: Option<&Event>,
    completion: &EntityCompletion,
    previous_event: Option<&Event>,
) {
    println!("ID: {}", entity.id);
    println!("Name: {}", entity.name);
    println!("Category: {}", entity.category.display_name());
    println!("Type: {}", entity.entity_type);
    println!("Required: {}", if entity.is_required { "yes" } else { "no" });
    println!("Resets: {}", entity.reset_after_interval);
    if let Some(count) = entity.num_required_completions {
        println!("Required completions: {}", count);
    }
    if !entity.included_event_fields.is_empty() {
        let fields: Vec<&str> = entity
            .included_event_fields
            .iter()
            .map(|field| field.as_str())
            .collect();
        println!("Fields: {}", fields.join(", "));
    }
    println!(
        "Window: {} to {}",
        format_timestamp(window.start_timestamp),
        format_timestamp(window.end_timestamp)
    );
    println!(
        "Progress: {} {}{}",
        progress_bar(completion.ratio),
        format_percent(completion.ratio),
        if completion.is_done() { " (done)" } else { "" }
    );
    match current_event {
        Some(event) => println!(
            "Current: {} at {}",
            describe_details(&event.details),
            format_timestamp(event.timestamp)
        ),
        None => println!("Current: nothing logged"),
    }
    if let Some(event) = previous_event {
        println!(
            "Previous: {} at {}",
            describe_details(&event.details),
            format_timestamp(event.timestamp)
        );
    }
    if let Some(issue) = &completion.configuration_issue {
        println!("Warning: {}", issue);
    }
}

/// Print events newest first.
pub fn print_event_list(events: &[Event]) {
    if events.is_empty() {
        println!("No events.");
        return;
    }

    let mut table = base_table(use_color(), &["ID", "LOGGED", "DETAILS"]);
    for event in events {
        table.add_row(vec![
            event.id.to_string(),
            format_timestamp(event.timestamp),
            describe_details(&event.details),
        ]);
    }
    println!("{}", table);
}

/// Print per-category progress followed by the entities of each category.
pub fn print_status(report: &ProgressReport) {
    let color = use_color();
    for category in &report.categories {
        let name = category.category.display_name();
        let heading = format!(
            "{:<10} {} {}",
            name,
            progress_bar(category.ratio),
            format_percent(category.ratio)
        );
        if color {
            let (r, g, b) = category_rgb(category.category);
            println!("{}", heading.truecolor(r, g, b).bold());
        } else {
            println!("{}", heading);
        }

        let members: Vec<_> = report
            .entities
            .iter()
            .filter(|progress| progress.entity.category == category.category)
            .collect();
        if members.is_empty() {
            println!("  (no entities)");
            continue;
        }
        for progress in members {
            let mark = if progress.is_done { "x" } else { " " };
            let required = if progress.entity.is_required {
                ""
            } else {
                " (optional)"
            };
            println!(
                "  [{}] {}{} {}",
                mark,
                progress.entity.name,
                required,
                format_percent(progress.ratio)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dailies_core::event::{FlashCardsPayload, GenericCompletionPayload, WorkoutPayload};

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0.0), "[----------]");
        assert_eq!(progress_bar(0.5), "[#####-----]");
        assert_eq!(progress_bar(1.0), "[##########]");
    }

    #[test]
    fn test_describe_details() {
        let generic = EventDetails::GenericCompletion(GenericCompletionPayload {
            num_completions: 1,
            num_required_completions: 3,
        });
        assert_eq!(describe_details(&generic), "1/3 completions");

        let cards = EventDetails::FlashCards(FlashCardsPayload {
            num_reviewed: 100,
            num_correct: 75,
        });
        assert_eq!(describe_details(&cards), "100 reviewed, 75 correct (75%)");

        let workout = EventDetails::Workout(WorkoutPayload {
            num_sets: Some(3),
            num_reps: Some(10),
            ..WorkoutPayload::default()
        });
        assert_eq!(describe_details(&workout), "3 sets, 10 reps");
        assert_eq!(
            describe_details(&EventDetails::Workout(WorkoutPayload::default())),
            "workout logged"
        );
    }
}
