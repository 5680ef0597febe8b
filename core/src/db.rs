use std::path::Path;

use rusqlite::{Connection, Transaction, params};
use tracing::{debug, info};

use crate::error::{CatalogError, Result, require_text};
use crate::models::{Category, Ingredient, Meal, MealDetail, NewMeal};
use crate::store::{CatalogStore, seed_meal};

/// SQLite-backed catalog: a `meal` table and an `ingredient` table that
/// cascades on meal deletion.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened catalog database");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut db = Database { conn };
        if db.migrate()? {
            db.seed_if_empty()?;
        }
        Ok(db)
    }

    /// Bring the schema up to date. Returns true when the schema was created
    /// by this call, i.e. the catalog is being initialised for the first time.
    fn migrate(&self) -> Result<bool> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS meal (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    category TEXT NOT NULL,
                    recipe TEXT
                );

                CREATE TABLE IF NOT EXISTS ingredient (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    meal_id INTEGER REFERENCES meal(id) ON DELETE CASCADE
                );

                CREATE INDEX IF NOT EXISTS idx_ingredient_meal ON ingredient(meal_id);

                PRAGMA user_version = 1;",
            )?;
            info!("created catalog schema (version 1)");
            return Ok(true);
        }

        Ok(false)
    }

    fn seed_if_empty(&mut self) -> Result<()> {
        if self.meal_count()? == 0 {
            let id = self.add_meal(&seed_meal())?;
            info!(meal_id = id, "seeded empty catalog with example meal");
        }
        Ok(())
    }

    // --- Row mapping helpers ---

    fn meal_from_row(row: &rusqlite::Row) -> rusqlite::Result<Meal> {
        let category: String = row.get(2)?;
        let category = Category::parse(&category).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Meal {
            id: row.get(0)?,
            name: row.get(1)?,
            category,
            recipe: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        })
    }

    fn ingredient_from_row(row: &rusqlite::Row) -> rusqlite::Result<Ingredient> {
        Ok(Ingredient {
            id: row.get(0)?,
            name: row.get(1)?,
            meal_id: row.get(2)?,
        })
    }

    fn meal_exists(tx: &Transaction, id: i64) -> Result<bool> {
        let count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM meal WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert_ingredient(tx: &Transaction, meal_id: i64, name: &str) -> Result<Ingredient> {
        tx.execute(
            "INSERT INTO ingredient (name, meal_id) VALUES (?1, ?2)",
            params![name, meal_id],
        )?;
        Ok(Ingredient {
            id: tx.last_insert_rowid(),
            name: name.to_string(),
            meal_id,
        })
    }

    /// Validate and insert one meal with its ingredients. Nothing is visible
    /// until the caller commits `tx`.
    fn insert_meal(tx: &Transaction, meal: &NewMeal) -> Result<i64> {
        let name = require_text(&meal.name, "Meal name")?;
        let ingredients = meal.cleaned_ingredients();

        tx.execute(
            "INSERT INTO meal (name, category, recipe) VALUES (?1, ?2, ?3)",
            params![name, meal.category.as_str(), meal.recipe],
        )?;
        let id = tx.last_insert_rowid();
        for ingredient in &ingredients {
            Self::insert_ingredient(tx, id, ingredient)?;
        }

        debug!(meal_id = id, ingredients = ingredients.len(), "added meal");
        Ok(id)
    }

    pub fn get_ingredients(&self, meal_id: i64) -> Result<Vec<Ingredient>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, meal_id FROM ingredient WHERE meal_id = ?1 ORDER BY id")?;
        let ingredients = stmt
            .query_map(params![meal_id], Self::ingredient_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ingredients)
    }
}

impl CatalogStore for Database {
    fn list_meals(&self) -> Result<Vec<Meal>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, category, recipe FROM meal ORDER BY id")?;
        let meals = stmt
            .query_map([], Self::meal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }

    fn get_meal(&self, id: i64) -> Result<Option<MealDetail>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, category, recipe FROM meal WHERE id = ?1")?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            let meal = Self::meal_from_row(row)?;
            let ingredients = self.get_ingredients(id)?;
            Ok(Some(MealDetail { meal, ingredients }))
        } else {
            Ok(None)
        }
    }

    fn add_meal(&mut self, meal: &NewMeal) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let id = Self::insert_meal(&tx, meal)?;
        tx.commit()?;
        Ok(id)
    }

    fn add_meals(&mut self, meals: &[NewMeal]) -> Result<Vec<i64>> {
        let tx = self.conn.transaction()?;
        let ids = meals
            .iter()
            .map(|meal| Self::insert_meal(&tx, meal))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()?;
        Ok(ids)
    }

    fn delete_meal(&mut self, id: i64) -> Result<()> {
        let tx = self.conn.transaction()?;
        // The foreign key cascades, but connections opened without
        // `foreign_keys = ON` would leave orphans behind.
        let ingredients = tx.execute("DELETE FROM ingredient WHERE meal_id = ?1", params![id])?;
        let meals = tx.execute("DELETE FROM meal WHERE id = ?1", params![id])?;
        tx.commit()?;

        debug!(meal_id = id, deleted = meals > 0, ingredients, "deleted meal");
        Ok(())
    }

    fn update_recipe(&mut self, id: i64, recipe: &str) -> Result<()> {
        let rows = self
            .conn
            .execute("UPDATE meal SET recipe = ?1 WHERE id = ?2", params![recipe, id])?;
        if rows == 0 {
            return Err(CatalogError::meal_not_found(id));
        }
        debug!(meal_id = id, "updated recipe");
        Ok(())
    }

    fn add_ingredient(&mut self, meal_id: i64, name: &str) -> Result<Ingredient> {
        let name = require_text(name, "Ingredient name")?;

        let tx = self.conn.transaction()?;
        if !Self::meal_exists(&tx, meal_id)? {
            return Err(CatalogError::meal_not_found(meal_id));
        }
        let ingredient = Self::insert_ingredient(&tx, meal_id, &name)?;
        tx.commit()?;

        debug!(meal_id, ingredient_id = ingredient.id, "added ingredient");
        Ok(ingredient)
    }

    fn delete_ingredient(&mut self, id: i64) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM ingredient WHERE id = ?1", params![id])?;
        debug!(ingredient_id = id, deleted = rows > 0, "deleted ingredient");
        Ok(())
    }

    fn meal_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM meal", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
