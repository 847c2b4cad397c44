//! Category-level completion.
//!
//! Required entities gate full completion. Optional entities never hold a
//! category back, but a partially-done optional entity still shows up as
//! progress.

use std::collections::HashMap;

use uuid::Uuid;

use crate::entity::{Entity, EntityCategory};

/// One entity's contribution to its category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryMember {
    pub is_required: bool,
    pub ratio: f64,
}

impl CategoryMember {
    pub fn required(ratio: f64) -> Self {
        Self {
            is_required: true,
            ratio,
        }
    }

    pub fn optional(ratio: f64) -> Self {
        Self {
            is_required: false,
            ratio,
        }
    }
}

/// Combine member ratios into a single category ratio in `[0, 1]`.
pub fn aggregate_ratios(members: &[CategoryMember]) -> f64 {
    let mut any_done = false;
    let mut any_required_not_done = false;
    let mut has_optional = false;
    let mut required_count = 0usize;
    let mut required_total = 0.0;
    let mut optional_fully_done = 0usize;
    let mut max_optional = 0.0f64;

    for member in members {
        if member.is_required {
            required_count += 1;
            required_total += member.ratio;
            if member.ratio < 1.0 {
                any_required_not_done = true;
            }
        } else {
            has_optional = true;
            max_optional = max_optional.max(member.ratio);
            if member.ratio == 1.0 {
                optional_fully_done += 1;
            }
        }
        if member.ratio == 1.0 {
            any_done = true;
        }
    }

    if any_done && !any_required_not_done {
        return 1.0;
    }

    if required_count > 0 {
        // A partially-done optional entity takes one slot; fully-done
        // optional entities add equally to both sides.
        let (optional_numerator, optional_denominator) =
            if max_optional > 0.0 && max_optional < 1.0 {
                (max_optional, 1.0)
            } else {
                (optional_fully_done as f64, optional_fully_done as f64)
            };
        return (required_total + optional_numerator)
            / (required_count as f64 + optional_denominator);
    }

    if has_optional {
        max_optional
    } else {
        0.0
    }
}

/// Completion ratio of `category` across `entities`.
///
/// Entities outside the category are ignored; entities missing from `ratios`
/// count as 0.
pub fn category_completion_ratio(
    entities: &[Entity],
    ratios: &HashMap<Uuid, f64>,
    category: EntityCategory,
) -> f64 {
    let members: Vec<CategoryMember> = entities
        .iter()
        .filter(|entity| entity.category == category)
        .map(|entity| CategoryMember {
            is_required: entity.is_required,
            ratio: ratios.get(&entity.id).copied().unwrap_or(0.0),
        })
        .collect();
    aggregate_ratios(&members)
}
