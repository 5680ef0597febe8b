//! Import of the flat JSON files written by earlier versions of the planner.
//!
//! Two layouts exist in the wild:
//!
//! - weekday layout: `{ "Montag": [ { "name", "ingredients", "instructions" } ] }`,
//!   where `ingredients` is free text (or occasionally a list);
//! - name layout: `{ "Pasta": { "rezept": "..." } }`.
//!
//! Neither carries ids or categories, so every record becomes a new meal in
//! the supplied category. Weekday assignments are dropped; plans are not stored.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{CatalogError, Result};
use crate::models::{Category, Day, NewMeal, split_ingredient_list};
use crate::store::CatalogStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub meals_imported: usize,
    pub ingredients_imported: usize,
    /// Records without a usable name.
    pub skipped: usize,
    /// Records whose name was already imported earlier in the same file.
    pub duplicates: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IngredientField {
    Text(String),
    List(Vec<String>),
}

impl IngredientField {
    fn into_names(self) -> Vec<String> {
        match self {
            Self::Text(text) => split_ingredient_list(&text),
            Self::List(items) => items
                .iter()
                .flat_map(|item| split_ingredient_list(item))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DayRecord {
    #[serde(default)]
    name: String,
    ingredients: Option<IngredientField>,
    #[serde(default)]
    instructions: String,
}

#[derive(Debug, Deserialize)]
struct NamedRecord {
    #[serde(default)]
    rezept: String,
}

/// Parsed legacy file: the meals to create and how many records were unusable.
#[derive(Debug)]
pub struct LegacyCatalog {
    pub meals: Vec<NewMeal>,
    pub skipped: usize,
    pub duplicates: usize,
}

pub fn parse_legacy(json: &str, category: Category) -> Result<LegacyCatalog> {
    let root: Value = serde_json::from_str(json)?;
    let Value::Object(entries) = root else {
        return Err(CatalogError::Validation(
            "Legacy file must contain a JSON object at the top level".to_string(),
        ));
    };

    // Weekday keys in week order, meal-name keys after them.
    let mut entries: Vec<(String, Value)> = entries.into_iter().collect();
    entries.sort_by_key(|(key, _)| Day::parse(key).map_or(Day::ALL.len(), Day::index));

    let mut candidates = Vec::new();
    let mut skipped = 0;
    for (key, value) in entries {
        match value {
            Value::Array(_) => {
                let records: Vec<DayRecord> = serde_json::from_value(value)?;
                for record in records {
                    let ingredients = record
                        .ingredients
                        .map(IngredientField::into_names)
                        .unwrap_or_default();
                    candidates.push(
                        NewMeal::new(record.name, category)
                            .with_recipe(record.instructions)
                            .with_ingredients(ingredients),
                    );
                }
            }
            Value::Object(_) => {
                let record: NamedRecord = serde_json::from_value(value)?;
                candidates.push(NewMeal::new(key, category).with_recipe(record.rezept));
            }
            other => {
                return Err(CatalogError::Validation(format!(
                    "Unrecognised legacy entry '{key}': expected a list of meals or a meal object, got {other}"
                )));
            }
        }
    }

    let mut seen = HashSet::new();
    let mut meals = Vec::new();
    let mut duplicates = 0;
    for mut meal in candidates {
        meal.name = meal.name.trim().to_string();
        if meal.name.is_empty() {
            skipped += 1;
        } else if seen.insert(meal.name.clone()) {
            meals.push(meal);
        } else {
            duplicates += 1;
        }
    }

    Ok(LegacyCatalog {
        meals,
        skipped,
        duplicates,
    })
}

/// Add every meal from a legacy file to `store` as one unit: on error nothing
/// from the file is stored. With `dry_run` nothing is written.
pub fn import_legacy(
    store: &mut dyn CatalogStore,
    json: &str,
    category: Category,
    dry_run: bool,
) -> Result<ImportSummary> {
    let parsed = parse_legacy(json, category)?;
    let summary = ImportSummary {
        meals_imported: parsed.meals.len(),
        ingredients_imported: parsed
            .meals
            .iter()
            .map(|meal| meal.cleaned_ingredients().len())
            .sum(),
        skipped: parsed.skipped,
        duplicates: parsed.duplicates,
    };

    if !dry_run {
        let ids = store.add_meals(&parsed.meals)?;
        debug!(first = ?ids.first(), last = ?ids.last(), "imported legacy meals");
    }

    info!(
        meals = summary.meals_imported,
        skipped = summary.skipped,
        duplicates = summary.duplicates,
        dry_run,
        "legacy import finished"
    );
    Ok(summary)
}
