use anyhow::Result;
use chrono::{Datelike, Local};

use mealplan_core::Planner;
use mealplan_core::models::{Day, Language};
use mealplan_core::session::Session;

use super::helpers::print_plan_table;

/// Draw and print one plan. Plans are not kept between runs.
pub(crate) fn cmd_plan(planner: Planner, seed: Option<u64>, lang: &str, json: bool) -> Result<()> {
    let mut planner = match seed {
        Some(seed) => planner.with_seed(seed),
        None => planner,
    };
    let mut session = Session::new(Language::parse(lang)?);
    let days = planner.plan(&mut session)?;
    let today = Day::from(Local::now().weekday());

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "today": today,
                "days": days,
            }))?
        );
        return Ok(());
    }

    if days.iter().all(|d| d.meal_id.is_none()) {
        eprintln!("The catalog is empty. Add meals with `mealplan meal add` first.");
    }
    print_plan_table(&days, today);
    Ok(())
}
