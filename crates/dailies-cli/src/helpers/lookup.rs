//! Resolve user-supplied entity and event references.

use uuid::Uuid;

use dailies_core::storage::{EntityFilter, Storage};
use dailies_core::{Entity, Event};

use crate::errors::CliError;

/// Shortest ID prefix accepted in place of a full UUID.
const MIN_PREFIX_LEN: usize = 4;

/// Look up an entity by full ID, unique ID prefix, or case-insensitive name.
pub fn require_entity<S: Storage + ?Sized>(
    storage: &S,
    owner_id: &Uuid,
    reference: &str,
) -> anyhow::Result<Entity> {
    let reference = reference.trim();
    if let Ok(id) = Uuid::parse_str(reference) {
        return storage
            .get_entity(owner_id, &id)?
            .ok_or_else(|| entity_not_found(reference).into());
    }

    let entities = storage.list_entities(owner_id, &EntityFilter::new())?;
    let by_name: Vec<&Entity> = entities
        .iter()
        .filter(|entity| entity.name.eq_ignore_ascii_case(reference))
        .collect();
    let candidates = if !by_name.is_empty() {
        by_name
    } else if reference.len() >= MIN_PREFIX_LEN {
        let prefix = reference.to_ascii_lowercase();
        entities
            .iter()
            .filter(|entity| entity.id.to_string().starts_with(&prefix))
            .collect()
    } else {
        Vec::new()
    };

    match candidates.as_slice() {
        [entity] => Ok((*entity).clone()),
        [] => Err(entity_not_found(reference).into()),
        many => Err(CliError::invalid_input(format!(
            "\"{}\" matches {} entities; use the full ID",
            reference,
            many.len()
        ))
        .into()),
    }
}

/// Look up an event by full ID.
pub fn require_event<S: Storage + ?Sized>(
    storage: &S,
    owner_id: &Uuid,
    reference: &str,
) -> anyhow::Result<Event> {
    let id = Uuid::parse_str(reference.trim())
        .map_err(|e| CliError::invalid_input(format!("Invalid event ID: {}", e)))?;
    storage.get_event(owner_id, &id)?.ok_or_else(|| {
        CliError::not_found(
            format!("Event not found: {}", id),
            "Hint: Run `dailies events <ENTITY>` to find event IDs.",
        )
        .into()
    })
}

fn entity_not_found(reference: &str) -> CliError {
    CliError::not_found(
        format!("Entity \"{}\" not found", reference),
        "Hint: Run `dailies entity list` to see your entities.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dailies_core::storage::SqliteStorage;
    use dailies_core::{EntityCategory, EntityType, NewEntity};

    fn setup() -> (SqliteStorage, Uuid, Uuid) {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let owner = storage.ensure_user("local", None).unwrap();
        let id = storage
            .create_entity(
                &owner.id,
                &NewEntity::new("Water", EntityCategory::Care, EntityType::GenericCompletion)
                    .with_required_completions(2),
            )
            .unwrap();
        (storage, owner.id, id)
    }

    #[test]
    fn test_require_entity_by_id_prefix_and_name() {
        let (storage, owner, id) = setup();

        assert_eq!(require_entity(&storage, &owner, &id.to_string()).unwrap().id, id);
        assert_eq!(
            require_entity(&storage, &owner, &id.to_string()[..8]).unwrap().id,
            id
        );
        assert_eq!(require_entity(&storage, &owner, "water").unwrap().id, id);
    }

    #[test]
    fn test_require_entity_missing_is_not_found() {
        let (storage, owner, _) = setup();
        let err = require_entity(&storage, &owner, "Floss").unwrap_err();
        assert_eq!(crate::errors::exit_code_for(&err), 3);
    }

    #[test]
    fn test_require_event_rejects_bad_id() {
        let (storage, owner, _) = setup();
        let err = require_event(&storage, &owner, "not-a-uuid").unwrap_err();
        assert_eq!(crate::errors::exit_code_for(&err), 4);
    }
}
