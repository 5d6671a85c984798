//! Field validation for create/update submissions

use crate::models::{InventoryDraft, InventoryInput};

pub const NAME_REQUIRED: &str = "Name is required";
pub const QUANTITY_REQUIRED: &str = "Valid quantity is required";
pub const LOCATION_REQUIRED: &str = "Hospital location is required";
pub const CATEGORY_REQUIRED: &str = "Category is required";

/// Validate a submission, collecting every problem.
///
/// On success the returned draft has a trimmed name and location, an
/// integral quantity, and the default status when none was given.
pub fn validate_input(input: &InventoryInput) -> Result<InventoryDraft, Vec<String>> {
    let mut errors = Vec::new();

    let name = input
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if name.is_none() {
        errors.push(NAME_REQUIRED.to_string());
    }

    let quantity = input.quantity.and_then(quantity_from_f64);
    if quantity.is_none() {
        errors.push(QUANTITY_REQUIRED.to_string());
    }

    let location = input
        .hospital_location
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if location.is_none() {
        errors.push(LOCATION_REQUIRED.to_string());
    }

    if input.category.is_none() {
        errors.push(CATEGORY_REQUIRED.to_string());
    }

    match (name, quantity, location, input.category) {
        (Some(name), Some(quantity), Some(location), Some(category)) if errors.is_empty() => {
            Ok(InventoryDraft {
                name: name.to_string(),
                quantity,
                category,
                hospital_location: location.to_string(),
                is_ventilator: input.is_ventilator,
                status: input.status.unwrap_or_default(),
            })
        }
        _ => Err(errors),
    }
}

fn quantity_from_f64(value: f64) -> Option<u32> {
    let in_range = value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX);
    (in_range && value.fract() == 0.0).then_some(value as u32)
}
