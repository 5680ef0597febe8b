use std::path::Path;

use anyhow::{Context, Result};

use mealplan_core::Planner;
use mealplan_core::models::Category;

pub(crate) fn cmd_import_legacy(
    planner: &mut Planner,
    path: &Path,
    category: &str,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let category = Category::parse(category)?;
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let summary = planner
        .import_legacy(&raw, category, dry_run)
        .with_context(|| format!("Failed to import {}", path.display()))?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "dry_run": dry_run,
                "meals_imported": summary.meals_imported,
                "ingredients_imported": summary.ingredients_imported,
                "skipped": summary.skipped,
                "duplicates": summary.duplicates,
            })
        );
        return Ok(());
    }

    if dry_run {
        println!("Dry run, no changes made.\n");
        println!("  Meals to import:       {}", summary.meals_imported);
        println!("  Ingredients to import: {}", summary.ingredients_imported);
    } else {
        println!("Import complete.\n");
        println!("  Meals imported:       {}", summary.meals_imported);
        println!("  Ingredients imported: {}", summary.ingredients_imported);
    }
    println!("  Skipped (no name):    {}", summary.skipped);
    println!("  Duplicate names:      {}", summary.duplicates);
    Ok(())
}
