use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::debug;

use crate::db::Database;
use crate::error::{CatalogError, Result};
use crate::json_store::JsonStore;
use crate::legacy::{self, ImportSummary};
use crate::models::{Category, Day, Ingredient, Language, Meal, MealDetail, NewMeal};
use crate::plan::WeeklyPlan;
use crate::session::Session;
use crate::store::CatalogStore;

/// One row of a plan as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedDay {
    pub day: Day,
    pub day_label: &'static str,
    pub meal_id: Option<i64>,
    pub meal_name: Option<String>,
    pub category: Option<Category>,
    pub category_label: Option<&'static str>,
}

impl PlannedDay {
    fn build(plan: &WeeklyPlan, catalog: &[Meal], lang: Language) -> Vec<Self> {
        plan.resolve(catalog)
            .into_iter()
            .map(|(day, meal)| PlannedDay {
                day,
                day_label: day.label(lang),
                meal_id: meal.map(|m| m.id),
                meal_name: meal.map(|m| m.name.clone()),
                category: meal.map(|m| m.category),
                category_label: meal.map(|m| m.category.label(lang)),
            })
            .collect()
    }
}

/// Entry point for presentation layers: a catalog store plus the random
/// source used for plan draws. Session state is passed in by the caller.
pub struct Planner {
    store: Box<dyn CatalogStore>,
    rng: StdRng,
}

impl Planner {
    pub fn new(store: Box<dyn CatalogStore>) -> Self {
        Self {
            store,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn open_sqlite(path: &Path) -> Result<Self> {
        Ok(Self::new(Box::new(Database::open(path)?)))
    }

    pub fn open_json(path: &Path) -> Result<Self> {
        Ok(Self::new(Box::new(JsonStore::open(path)?)))
    }

    pub fn new_in_memory() -> Result<Self> {
        Ok(Self::new(Box::new(Database::open_in_memory()?)))
    }

    /// Use a fixed seed so plan draws are reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    // --- Catalog ---

    pub fn list_meals(&self) -> Result<Vec<Meal>> {
        self.store.list_meals()
    }

    pub fn get_meal(&self, id: i64) -> Result<Option<MealDetail>> {
        self.store.get_meal(id)
    }

    pub fn add_meal(&mut self, meal: &NewMeal) -> Result<MealDetail> {
        let id = self.store.add_meal(meal)?;
        self.store
            .get_meal(id)?
            .ok_or_else(|| CatalogError::meal_not_found(id))
    }

    pub fn delete_meal(&mut self, id: i64) -> Result<()> {
        self.store.delete_meal(id)
    }

    pub fn update_recipe(&mut self, id: i64, recipe: &str) -> Result<MealDetail> {
        self.store.update_recipe(id, recipe)?;
        self.store
            .get_meal(id)?
            .ok_or_else(|| CatalogError::meal_not_found(id))
    }

    pub fn add_ingredient(&mut self, meal_id: i64, name: &str) -> Result<Ingredient> {
        self.store.add_ingredient(meal_id, name)
    }

    pub fn delete_ingredient(&mut self, id: i64) -> Result<()> {
        self.store.delete_ingredient(id)
    }

    pub fn import_legacy(
        &mut self,
        json: &str,
        category: Category,
        dry_run: bool,
    ) -> Result<ImportSummary> {
        legacy::import_legacy(self.store.as_mut(), json, category, dry_run)
    }

    // --- Weekly plan ---

    /// The session's plan, drawing one first if the session has none yet.
    pub fn plan(&mut self, session: &mut Session) -> Result<Vec<PlannedDay>> {
        let catalog = self.store.list_meals()?;
        let plan = *session.plan_or_generate(&catalog, &mut self.rng);
        let stale = plan.stale_days(&catalog);
        if stale > 0 {
            debug!(stale, "plan refers to deleted meals");
        }
        Ok(PlannedDay::build(&plan, &catalog, session.language()))
    }

    /// The session's plan resolved against the current catalog, or `None` if
    /// no plan has been drawn yet. Never draws.
    pub fn current_plan(&self, session: &Session) -> Result<Option<Vec<PlannedDay>>> {
        let Some(plan) = session.plan() else {
            return Ok(None);
        };
        let catalog = self.store.list_meals()?;
        Ok(Some(PlannedDay::build(plan, &catalog, session.language())))
    }

    pub fn reroll_day(&mut self, session: &mut Session, day: Day) -> Result<Vec<PlannedDay>> {
        let catalog = self.store.list_meals()?;
        let plan = *session.reroll_day(day, &catalog, &mut self.rng);
        Ok(PlannedDay::build(&plan, &catalog, session.language()))
    }

    pub fn reroll_week(&mut self, session: &mut Session) -> Result<Vec<PlannedDay>> {
        let catalog = self.store.list_meals()?;
        let plan = *session.reroll_week(&catalog, &mut self.rng);
        Ok(PlannedDay::build(&plan, &catalog, session.language()))
    }

    /// Detail of the meal the session has open. If that meal no longer exists
    /// the selection is cleared and `None` is returned.
    pub fn open_meal_detail(&self, session: &mut Session) -> Result<Option<MealDetail>> {
        let Some(id) = session.open_meal() else {
            return Ok(None);
        };
        let detail = self.store.get_meal(id)?;
        if detail.is_none() {
            session.close_meal();
        }
        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner() -> Planner {
        Planner::new_in_memory().unwrap().with_seed(11)
    }

    #[test]
    fn test_add_meal_returns_detail() {
        let mut planner = planner();
        let detail = planner
            .add_meal(
                &NewMeal::new("Risotto", Category::Vegetarian)
                    .with_recipe("Stir.")
                    .with_ingredients(["rice", " ", "parmesan"]),
            )
            .unwrap();
        assert_eq!(detail.meal.name, "Risotto");
        assert_eq!(detail.ingredient_names(), vec!["rice", "parmesan"]);
    }

    #[test]
    fn test_plan_uses_session_language() {
        let mut planner = planner();
        let mut session = Session::new(Language::En);
        let days = planner.plan(&mut session).unwrap();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].day_label, "Monday");
        // Only the seed meal exists.
        assert!(days.iter().all(|d| d.meal_name.as_deref() == Some("Spaghetti Bolognese")));
        assert!(days.iter().all(|d| d.category_label == Some("Meat")));

        session.set_language(Language::De);
        let days = planner.plan(&mut session).unwrap();
        assert_eq!(days[0].day_label, "Montag");
        assert_eq!(days[0].category_label, Some("Fleisch"));
        assert_eq!(days[0].category, Some(Category::Meat));
    }

    #[test]
    fn test_deleted_meal_reads_as_no_meal() {
        let mut planner = planner();
        let mut session = Session::default();
        let days = planner.plan(&mut session).unwrap();
        let seed = days[0].meal_id.unwrap();

        planner.delete_meal(seed).unwrap();
        let days = planner.plan(&mut session).unwrap();
        assert!(days.iter().all(|d| d.meal_id.is_none() && d.meal_name.is_none()));
    }

    #[test]
    fn test_current_plan_does_not_draw_and_hides_deleted_meals() {
        let mut planner = planner();
        let mut session = Session::default();
        assert_eq!(planner.current_plan(&session).unwrap(), None);
        assert!(session.plan().is_none());

        let drawn = planner.plan(&mut session).unwrap();
        assert_eq!(planner.current_plan(&session).unwrap(), Some(drawn));

        let seed = planner.list_meals().unwrap()[0].id;
        planner.delete_meal(seed).unwrap();
        let days = planner.current_plan(&session).unwrap().unwrap();
        assert_eq!(days.len(), 7);
        assert!(days.iter().all(|d| d.meal_id.is_none() && d.category.is_none()));
    }

    #[test]
    fn test_reroll_day_picks_the_other_meal() {
        let mut planner = planner();
        let mut session = Session::default();
        let seed = planner.list_meals().unwrap()[0].id;
        let salad = planner
            .add_meal(&NewMeal::new("Salad", Category::Vegan))
            .unwrap()
            .meal
            .id;

        let days = planner.plan(&mut session).unwrap();
        let before = days[Day::Tuesday.index()].meal_id.unwrap();
        let expected = if before == seed { salad } else { seed };

        let days = planner.reroll_day(&mut session, Day::Tuesday).unwrap();
        assert_eq!(days[Day::Tuesday.index()].meal_id, Some(expected));
    }

    #[test]
    fn test_reroll_week_keeps_plan_in_catalog() {
        let mut planner = planner();
        let mut session = Session::default();
        planner.add_meal(&NewMeal::new("Salad", Category::Vegan)).unwrap();
        let ids = planner.store().meal_ids().unwrap();

        let days = planner.reroll_week(&mut session).unwrap();
        assert!(days.iter().all(|d| ids.contains(&d.meal_id.unwrap())));
    }

    #[test]
    fn test_open_meal_detail_recovers_from_deleted_meal() {
        let mut planner = planner();
        let mut session = Session::default();
        let id = planner.list_meals().unwrap()[0].id;

        session.select_meal(id);
        assert!(planner.open_meal_detail(&mut session).unwrap().is_some());

        planner.delete_meal(id).unwrap();
        assert!(planner.open_meal_detail(&mut session).unwrap().is_none());
        assert_eq!(session.open_meal(), None);
    }

    #[test]
    fn test_update_recipe_of_missing_meal() {
        let mut planner = planner();
        assert!(planner.update_recipe(404, "x").unwrap_err().is_not_found());
    }

    #[test]
    fn test_json_backend_through_planner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let mut planner = Planner::open_json(&path).unwrap().with_seed(5);
        let detail = planner
            .add_meal(&NewMeal::new("Falafel", Category::Vegan).with_ingredients(["chickpeas"]))
            .unwrap();
        planner.add_ingredient(detail.meal.id, "tahini").unwrap();

        let reopened = Planner::open_json(&path).unwrap();
        let names = reopened.get_meal(detail.meal.id).unwrap().unwrap();
        assert_eq!(names.ingredient_names(), vec!["chickpeas", "tahini"]);
    }
}
