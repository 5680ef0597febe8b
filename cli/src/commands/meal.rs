use anyhow::Result;

use mealplan_core::Planner;
use mealplan_core::models::{Category, Language, NewMeal, split_ingredient_list};

use super::helpers::{exit_not_found, print_meal_detail, print_meal_table};

pub(crate) fn cmd_meal_list(planner: &Planner, lang: &str, json: bool) -> Result<()> {
    let lang = Language::parse(lang)?;
    let meals = planner.list_meals()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meals)?);
        return Ok(());
    }
    if meals.is_empty() {
        println!("No meals in the catalog. Add one with `mealplan meal add`.");
        return Ok(());
    }

    let mut rows = Vec::with_capacity(meals.len());
    for meal in meals {
        let count = planner
            .get_meal(meal.id)?
            .map_or(0, |detail| detail.ingredients.len());
        rows.push((meal, count));
    }
    print_meal_table(&rows, lang);
    Ok(())
}

pub(crate) fn cmd_meal_show(planner: &Planner, id: i64, lang: &str, json: bool) -> Result<()> {
    let lang = Language::parse(lang)?;
    let Some(detail) = planner.get_meal(id)? else {
        exit_not_found(&format!("Meal {id} not found"), json);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        print_meal_detail(&detail, lang);
    }
    Ok(())
}

pub(crate) fn cmd_meal_add(
    planner: &mut Planner,
    name: &str,
    category: &str,
    recipe: &str,
    ingredients: Option<&str>,
    json: bool,
) -> Result<()> {
    let category = Category::parse(category)?;
    let ingredients = ingredients.map(split_ingredient_list).unwrap_or_default();
    let meal = NewMeal::new(name, category)
        .with_recipe(recipe)
        .with_ingredients(ingredients);

    let detail = planner.add_meal(&meal)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        let count = detail.ingredients.len();
        println!(
            "Added meal {}: {} ({}, {count} ingredients)",
            detail.meal.id, detail.meal.name, detail.meal.category
        );
    }
    Ok(())
}

pub(crate) fn cmd_meal_delete(planner: &mut Planner, id: i64, json: bool) -> Result<()> {
    planner.delete_meal(id)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted meal {id}");
    }
    Ok(())
}

pub(crate) fn cmd_meal_recipe(planner: &mut Planner, id: i64, text: &str, json: bool) -> Result<()> {
    let detail = match planner.update_recipe(id, text) {
        Ok(detail) => detail,
        Err(e) if e.is_not_found() => exit_not_found(&e.to_string(), json),
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        println!("Updated recipe for meal {id}: {}", detail.meal.name);
    }
    Ok(())
}
