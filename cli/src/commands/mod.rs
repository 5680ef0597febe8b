mod helpers;
mod import;
mod ingredient;
mod meal;
mod plan;

pub(crate) use import::cmd_import_legacy;
pub(crate) use ingredient::{cmd_ingredient_add, cmd_ingredient_delete};
pub(crate) use meal::{cmd_meal_add, cmd_meal_delete, cmd_meal_list, cmd_meal_recipe, cmd_meal_show};
pub(crate) use plan::cmd_plan;
