//! JSON output formatting.

use serde::Serialize;

use dailies_core::{Entity, EntityCompletion, Event, TimeWindow};

/// Print any serializable value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// An entity together with its state in the active window.
pub fn entity_detail_json(
    entity: &Entity,
    window: &TimeWindow,
    current_event: Option<&Event>,
    completion: &EntityCompletion,
    previous_event: Option<&Event>,
) -> serde_json::Value {
    serde_json::json!({
        "entity": entity,
        "window": window,
        "currentEvent": current_event,
        "completionRatio": completion.ratio,
        "isDone": completion.is_done(),
        "configurationIssue": completion.configuration_issue,
        "previousEvent": previous_event,
    })
}
