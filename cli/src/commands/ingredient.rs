use anyhow::Result;

use mealplan_core::Planner;

use super::helpers::exit_not_found;

pub(crate) fn cmd_ingredient_add(
    planner: &mut Planner,
    meal_id: i64,
    name: &str,
    json: bool,
) -> Result<()> {
    let ingredient = match planner.add_ingredient(meal_id, name) {
        Ok(ingredient) => ingredient,
        Err(e) if e.is_not_found() => exit_not_found(&e.to_string(), json),
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&ingredient)?);
    } else {
        println!(
            "Added ingredient {}: {} to meal {meal_id}",
            ingredient.id, ingredient.name
        );
    }
    Ok(())
}

pub(crate) fn cmd_ingredient_delete(planner: &mut Planner, id: i64, json: bool) -> Result<()> {
    planner.delete_ingredient(id)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted ingredient {id}");
    }
    Ok(())
}
