use crate::error::Result;
use crate::models::{Category, Ingredient, Meal, MealDetail, NewMeal};

/// Durable storage for meals and the ingredients they own.
///
/// Every mutating call is persisted before it returns. Deletes are
/// idempotent; mutations that target a missing meal fail with
/// [`CatalogError::NotFound`](crate::error::CatalogError::NotFound).
pub trait CatalogStore: Send {
    /// All meals ordered by id.
    fn list_meals(&self) -> Result<Vec<Meal>>;

    /// The meal and its ingredients, or `None` if the id does not exist.
    fn get_meal(&self, id: i64) -> Result<Option<MealDetail>>;

    fn add_meal(&mut self, meal: &NewMeal) -> Result<i64>;

    /// Add several meals as one unit: either all of them are stored or, on
    /// any error, none are. Returns the new ids in input order.
    fn add_meals(&mut self, meals: &[NewMeal]) -> Result<Vec<i64>>;

    fn delete_meal(&mut self, id: i64) -> Result<()>;

    fn update_recipe(&mut self, id: i64, recipe: &str) -> Result<()>;

    fn add_ingredient(&mut self, meal_id: i64, name: &str) -> Result<Ingredient>;

    fn delete_ingredient(&mut self, id: i64) -> Result<()>;

    fn meal_count(&self) -> Result<usize> {
        Ok(self.list_meals()?.len())
    }

    fn meal_ids(&self) -> Result<Vec<i64>> {
        Ok(self.list_meals()?.into_iter().map(|m| m.id).collect())
    }
}

/// The meal inserted into a freshly initialised, empty catalog.
#[must_use]
pub fn seed_meal() -> NewMeal {
    NewMeal::new("Spaghetti Bolognese", Category::Meat)
        .with_recipe(
            "Brown the minced beef, add the tomato sauce and simmer for 20 minutes. \
             Serve over freshly cooked spaghetti.",
        )
        .with_ingredients(["Spaghetti", "Minced beef", "Tomato sauce"])
}

/// Shared checks run by every backend against any [`CatalogStore`].
#[cfg(test)]
pub(crate) mod contract {
    use super::*;

    fn pasta() -> NewMeal {
        NewMeal::new("Pasta", Category::Meat).with_ingredients(["  noodles ", "", "   ", "cheese"])
    }

    pub fn add_then_get_returns_trimmed_ingredients(store: &mut dyn CatalogStore) {
        let id = store.add_meal(&pasta()).unwrap();
        let detail = store.get_meal(id).unwrap().unwrap();
        assert_eq!(detail.meal.name, "Pasta");
        assert_eq!(detail.meal.category, Category::Meat);
        assert_eq!(detail.ingredient_names(), vec!["noodles", "cheese"]);
        assert!(detail.ingredients.iter().all(|i| i.meal_id == id));
    }

    pub fn empty_name_is_rejected(store: &mut dyn CatalogStore) {
        let before = store.meal_count().unwrap();
        let err = store
            .add_meal(&NewMeal::new("   ", Category::Vegan).with_ingredients(["x"]))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.meal_count().unwrap(), before);
    }

    pub fn delete_meal_cascades(store: &mut dyn CatalogStore) {
        let id = store.add_meal(&pasta()).unwrap();
        let extra = store.add_ingredient(id, "basil").unwrap();
        store.delete_meal(id).unwrap();
        assert!(store.get_meal(id).unwrap().is_none());
        // The ingredient id is gone too: deleting it again is a no-op.
        store.delete_ingredient(extra.id).unwrap();
        assert!(!store.meal_ids().unwrap().contains(&id));
    }

    pub fn deletes_of_unknown_ids_are_noops(store: &mut dyn CatalogStore) {
        let before = store.list_meals().unwrap();
        store.delete_meal(9999).unwrap();
        store.delete_ingredient(9999).unwrap();
        assert_eq!(store.list_meals().unwrap(), before);
    }

    pub fn recipe_round_trips_verbatim(store: &mut dyn CatalogStore) {
        let id = store.add_meal(&pasta()).unwrap();
        store.update_recipe(id, "  Boil.\nDrain.  ").unwrap();
        assert_eq!(store.get_meal(id).unwrap().unwrap().meal.recipe, "  Boil.\nDrain.  ");
        store.update_recipe(id, "").unwrap();
        assert_eq!(store.get_meal(id).unwrap().unwrap().meal.recipe, "");
    }

    pub fn update_recipe_of_missing_meal_fails(store: &mut dyn CatalogStore) {
        assert!(store.update_recipe(9999, "text").unwrap_err().is_not_found());
    }

    pub fn add_ingredient_validates(store: &mut dyn CatalogStore) {
        let id = store.add_meal(&pasta()).unwrap();
        assert!(store.add_ingredient(id, " \n").unwrap_err().is_validation());
        assert!(store.add_ingredient(9999, "salt").unwrap_err().is_not_found());

        let salt = store.add_ingredient(id, "  salt ").unwrap();
        assert_eq!(salt.name, "salt");
        assert_eq!(salt.meal_id, id);
        let names = store.get_meal(id).unwrap().unwrap();
        assert_eq!(names.ingredient_names(), vec!["noodles", "cheese", "salt"]);
    }

    pub fn delete_ingredient_keeps_meal(store: &mut dyn CatalogStore) {
        let id = store.add_meal(&pasta()).unwrap();
        let detail = store.get_meal(id).unwrap().unwrap();
        store.delete_ingredient(detail.ingredients[0].id).unwrap();
        let detail = store.get_meal(id).unwrap().unwrap();
        assert_eq!(detail.ingredient_names(), vec!["cheese"]);
    }

    pub fn list_is_ordered_by_id(store: &mut dyn CatalogStore) {
        let a = store.add_meal(&NewMeal::new("Zucchini", Category::Vegan)).unwrap();
        let b = store.add_meal(&NewMeal::new("Apple pie", Category::Vegetarian)).unwrap();
        let ids = store.meal_ids().unwrap();
        let pos_a = ids.iter().position(|&i| i == a).unwrap();
        let pos_b = ids.iter().position(|&i| i == b).unwrap();
        assert!(pos_a < pos_b);
    }

    pub fn add_meals_is_all_or_nothing(store: &mut dyn CatalogStore) {
        let before = store.list_meals().unwrap();
        let batch = [
            NewMeal::new("Soup", Category::Vegan),
            NewMeal::new("  ", Category::Vegan),
        ];
        assert!(store.add_meals(&batch).unwrap_err().is_validation());
        assert_eq!(store.list_meals().unwrap(), before);

        let ids = store
            .add_meals(&[pasta(), NewMeal::new("Soup", Category::Vegan)])
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids[0] < ids[1]);
        let detail = store.get_meal(ids[0]).unwrap().unwrap();
        assert_eq!(detail.ingredient_names(), vec!["noodles", "cheese"]);
        assert_eq!(store.meal_count().unwrap(), before.len() + 2);
    }

    pub fn run_all(make: &mut dyn FnMut() -> Box<dyn CatalogStore>) {
        add_then_get_returns_trimmed_ingredients(make().as_mut());
        empty_name_is_rejected(make().as_mut());
        delete_meal_cascades(make().as_mut());
        deletes_of_unknown_ids_are_noops(make().as_mut());
        recipe_round_trips_verbatim(make().as_mut());
        update_recipe_of_missing_meal_fails(make().as_mut());
        add_ingredient_validates(make().as_mut());
        delete_ingredient_keeps_meal(make().as_mut());
        list_is_ordered_by_id(make().as_mut());
        add_meals_is_all_or_nothing(make().as_mut());
    }
}
