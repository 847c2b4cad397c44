use dailies_core::progress::{load_progress, ProgressReport};
use dailies_core::time_window::current_timestamp;
use dailies_core::EntityCategory;

use crate::app::AppContext;
use crate::cli::StatusArgs;
use crate::helpers::parse_timestamp;
use crate::output::{print_json, print_status};

pub fn handle_status(ctx: &AppContext<'_>, args: &StatusArgs) -> anyhow::Result<()> {
    let category: Option<EntityCategory> = match args.category.as_ref() {
        Some(value) => Some(value.parse()?),
        None => None,
    };
    let now = match args.at.as_ref() {
        Some(value) => parse_timestamp(value)?,
        None => current_timestamp(),
    };

    let (storage, owner) = ctx.open_storage()?;
    let mut report = load_progress(&storage, &owner.id, now)?;
    if let Some(category) = category {
        retain_category(&mut report, category);
    }

    for issue in &report.configuration_issues {
        eprintln!("Warning: {}", issue);
    }

    if args.json {
        print_json(&report)
    } else {
        print_status(&report);
        Ok(())
    }
}

fn retain_category(report: &mut ProgressReport, category: EntityCategory) {
    report
        .entities
        .retain(|progress| progress.entity.category == category);
    report
        .categories
        .retain(|progress| progress.category == category);
    let kept: Vec<_> = report.entities.iter().map(|p| p.entity.id).collect();
    report
        .configuration_issues
        .retain(|issue| kept.contains(&issue.entity_id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use dailies_core::{Entity, EntityType, ResetInterval};
    use uuid::Uuid;

    fn entity(name: &str, category: EntityCategory) -> Entity {
        Entity {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            name: name.to_string(),
            category,
            entity_type: EntityType::GenericCompletion,
            is_required: true,
            reset_after_interval: ResetInterval::Daily,
            num_required_completions: None,
            included_event_fields: Vec::new(),
        }
    }

    #[test]
    fn test_retain_category_prunes_report() {
        let entities = vec![
            entity("Journal", EntityCategory::Thinking),
            entity("Water", EntityCategory::Care),
        ];
        let mut report = ProgressReport::build(&entities, &[], 1_704_888_000_000);
        assert_eq!(report.configuration_issues.len(), 2);

        retain_category(&mut report, EntityCategory::Care);
        assert_eq!(report.categories.len(), 1);
        assert_eq!(report.categories[0].category, EntityCategory::Care);
        assert_eq!(report.entities.len(), 1);
        assert_eq!(report.entities[0].entity.name, "Water");
        assert_eq!(report.configuration_issues.len(), 1);
        assert_eq!(report.configuration_issues[0].entity_name, "Water");
    }
}
