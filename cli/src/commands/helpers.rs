use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use mealplan_core::PlannedDay;
use mealplan_core::models::{Day, Language, Meal, MealDetail};

#[derive(Tabled)]
pub(crate) struct MealRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Ingredients")]
    ingredients: usize,
}

pub(crate) fn meal_rows(meals: &[(Meal, usize)], lang: Language) -> Vec<MealRow> {
    meals
        .iter()
        .map(|(m, count)| MealRow {
            id: m.id,
            name: truncate(&m.name, 40),
            category: m.category.label(lang).to_string(),
            ingredients: *count,
        })
        .collect()
}

pub(crate) fn print_meal_table(meals: &[(Meal, usize)], lang: Language) {
    let table = Table::new(meal_rows(meals, lang))
        .with(Style::rounded())
        .with(Modify::new(Columns::single(3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_meal_detail(detail: &MealDetail, lang: Language) {
    let meal = &detail.meal;
    println!("{}", meal_heading(detail, lang));
    println!();
    if detail.ingredients.is_empty() {
        println!("Ingredients: none");
    } else {
        println!("Ingredients:");
        for ingredient in &detail.ingredients {
            println!("  [{}] {}", ingredient.id, ingredient.name);
        }
    }
    println!();
    if meal.recipe.trim().is_empty() {
        println!("Recipe: none");
    } else {
        println!("Recipe:");
        for line in meal.recipe.lines() {
            println!("  {line}");
        }
    }
}

pub(crate) fn meal_heading(detail: &MealDetail, lang: Language) -> String {
    let meal = &detail.meal;
    format!("{} (#{}, {})", meal.name, meal.id, meal.category.label(lang))
}

#[derive(Tabled)]
pub(crate) struct PlanRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Day")]
    day: &'static str,
    #[tabled(rename = "Meal")]
    meal: String,
    #[tabled(rename = "Category")]
    category: String,
}

pub(crate) fn plan_rows(days: &[PlannedDay], today: Day) -> Vec<PlanRow> {
    days.iter()
        .map(|d| PlanRow {
            marker: if d.day == today { "*" } else { "" },
            day: d.day_label,
            meal: d
                .meal_name
                .as_deref()
                .map_or_else(|| "-".to_string(), |n| truncate(n, 40)),
            category: d.category_label.unwrap_or("-").to_string(),
        })
        .collect()
}

pub(crate) fn print_plan_table(days: &[PlannedDay], today: Day) {
    let table = Table::new(plan_rows(days, today))
        .with(Style::rounded())
        .to_string();
    println!("{table}");
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Report a missing record and exit with status 2.
pub(crate) fn exit_not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealplan_core::models::Category;

    fn planned(day: Day, meal: Option<&str>) -> PlannedDay {
        PlannedDay {
            day,
            day_label: day.label(Language::En),
            meal_id: meal.map(|_| 1),
            meal_name: meal.map(str::to_string),
            category: meal.map(|_| Category::Vegan),
            category_label: meal.map(|_| "Vegan"),
        }
    }

    #[test]
    fn test_plan_rows_mark_today_and_gaps() {
        let days = vec![planned(Day::Monday, Some("Salad")), planned(Day::Tuesday, None)];
        let rows = plan_rows(&days, Day::Tuesday);
        assert_eq!(rows[0].marker, "");
        assert_eq!(rows[0].meal, "Salad");
        assert_eq!(rows[1].marker, "*");
        assert_eq!(rows[1].meal, "-");
        assert_eq!(rows[1].category, "-");
    }

    fn chili() -> Meal {
        Meal {
            id: 3,
            name: "Chili".to_string(),
            category: Category::Meat,
            recipe: String::new(),
        }
    }

    #[test]
    fn test_meal_rows_show_category_label() {
        let rows = meal_rows(&[(chili(), 4)], Language::De);
        assert_eq!(rows[0].category, "Fleisch");
        assert_eq!(rows[0].ingredients, 4);

        let rows = meal_rows(&[(chili(), 4)], Language::En);
        assert_eq!(rows[0].category, "Meat");
    }

    #[test]
    fn test_meal_heading_shows_category_label() {
        let detail = MealDetail {
            meal: chili(),
            ingredients: Vec::new(),
        };
        assert_eq!(meal_heading(&detail, Language::De), "Chili (#3, Fleisch)");
        assert_eq!(meal_heading(&detail, Language::En), "Chili (#3, Meat)");
    }

    #[test]
    fn test_json_error_escapes() {
        let out = json_error("Meal \"x\" not found");
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["error"], "Meal \"x\" not found");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Käsespätzle mit Röstzwiebeln", 12), "Käsespätz...");
        assert_eq!(truncate("Müsli", 10), "Müsli");
    }
}
