use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{CatalogError, Result, require_text};
use crate::models::{Category, Ingredient, Meal, MealDetail, NewMeal};
use crate::store::{CatalogStore, seed_meal};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogFile {
    version: u32,
    next_meal_id: i64,
    next_ingredient_id: i64,
    meals: Vec<StoredMeal>,
}

impl Default for CatalogFile {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            next_meal_id: 1,
            next_ingredient_id: 1,
            meals: Vec::new(),
        }
    }
}

impl CatalogFile {
    /// Raise the id counters above every id already in the file so a
    /// hand-edited catalog cannot hand out duplicates.
    fn repair_counters(&mut self) {
        let max_meal = self.meals.iter().map(|m| m.id).max().unwrap_or(0);
        let max_ingredient = self
            .meals
            .iter()
            .flat_map(|m| m.ingredients.iter().map(|i| i.id))
            .max()
            .unwrap_or(0);

        if self.next_meal_id <= max_meal {
            warn!(stored = self.next_meal_id, max_meal, "meal id counter behind file contents");
            self.next_meal_id = max_meal + 1;
        }
        if self.next_ingredient_id <= max_ingredient {
            warn!(
                stored = self.next_ingredient_id,
                max_ingredient, "ingredient id counter behind file contents"
            );
            self.next_ingredient_id = max_ingredient + 1;
        }
    }

    /// Validate `meal` and append it with fresh ids.
    fn push_meal(&mut self, meal: &NewMeal) -> Result<i64> {
        let name = require_text(&meal.name, "Meal name")?;
        let id = self.next_meal_id;
        self.next_meal_id += 1;

        let mut ingredients = Vec::new();
        for ingredient in meal.cleaned_ingredients() {
            ingredients.push(StoredIngredient {
                id: self.next_ingredient_id,
                name: ingredient,
            });
            self.next_ingredient_id += 1;
        }
        debug!(meal_id = id, ingredients = ingredients.len(), "added meal");

        self.meals.push(StoredMeal {
            id,
            name,
            category: meal.category,
            recipe: meal.recipe.clone(),
            ingredients,
        });
        Ok(id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMeal {
    id: i64,
    name: String,
    category: Category,
    #[serde(default)]
    recipe: String,
    #[serde(default)]
    ingredients: Vec<StoredIngredient>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredIngredient {
    id: i64,
    name: String,
}

impl StoredMeal {
    fn to_meal(&self) -> Meal {
        Meal {
            id: self.id,
            name: self.name.clone(),
            category: self.category,
            recipe: self.recipe.clone(),
        }
    }

    fn to_detail(&self) -> MealDetail {
        MealDetail {
            meal: self.to_meal(),
            ingredients: self
                .ingredients
                .iter()
                .map(|i| Ingredient {
                    id: i.id,
                    name: i.name.clone(),
                    meal_id: self.id,
                })
                .collect(),
        }
    }
}

/// Catalog kept in a single JSON file, rewritten in full on every change.
///
/// Ingredients are nested inside their meal, so removing a meal removes its
/// ingredients with it.
pub struct JsonStore {
    path: PathBuf,
    data: CatalogFile,
}

impl JsonStore {
    /// Open the catalog at `path`, creating and seeding it if the file does not exist.
    pub fn open(path: &Path) -> Result<Self> {
        if path.exists() {
            let raw = fs::read(path).map_err(|source| CatalogError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let mut data: CatalogFile = serde_json::from_slice(&raw)?;
            if data.version > FORMAT_VERSION {
                return Err(CatalogError::Validation(format!(
                    "{} was written by a newer version (format {})",
                    path.display(),
                    data.version
                )));
            }
            data.repair_counters();
            info!(path = %path.display(), meals = data.meals.len(), "opened catalog file");
            return Ok(Self {
                path: path.to_path_buf(),
                data,
            });
        }

        let mut store = Self {
            path: path.to_path_buf(),
            data: CatalogFile::default(),
        };
        let id = store.add_meal(&seed_meal())?;
        info!(path = %path.display(), meal_id = id, "created catalog file with example meal");
        Ok(store)
    }

    /// Write `data` to disk and adopt it as the current state. The new file is
    /// written and synced beside the catalog, then renamed over it; the
    /// in-memory state only changes once that has succeeded.
    fn commit(&mut self, data: CatalogFile) -> Result<()> {
        let io_err = |source| CatalogError::Io {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let bytes = serde_json::to_vec_pretty(&data)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        self.data = data;
        Ok(())
    }

    fn find(&self, id: i64) -> Option<&StoredMeal> {
        self.data.meals.iter().find(|m| m.id == id)
    }
}

impl CatalogStore for JsonStore {
    fn list_meals(&self) -> Result<Vec<Meal>> {
        let mut meals: Vec<Meal> = self.data.meals.iter().map(StoredMeal::to_meal).collect();
        meals.sort_by_key(|m| m.id);
        Ok(meals)
    }

    fn get_meal(&self, id: i64) -> Result<Option<MealDetail>> {
        Ok(self.find(id).map(StoredMeal::to_detail))
    }

    fn add_meal(&mut self, meal: &NewMeal) -> Result<i64> {
        let mut data = self.data.clone();
        let id = data.push_meal(meal)?;
        self.commit(data)?;
        Ok(id)
    }

    fn add_meals(&mut self, meals: &[NewMeal]) -> Result<Vec<i64>> {
        let mut data = self.data.clone();
        let ids = meals
            .iter()
            .map(|meal| data.push_meal(meal))
            .collect::<Result<Vec<_>>>()?;
        self.commit(data)?;
        Ok(ids)
    }

    fn delete_meal(&mut self, id: i64) -> Result<()> {
        if self.find(id).is_none() {
            return Ok(());
        }
        let mut data = self.data.clone();
        data.meals.retain(|m| m.id != id);
        self.commit(data)?;
        debug!(meal_id = id, "deleted meal");
        Ok(())
    }

    fn update_recipe(&mut self, id: i64, recipe: &str) -> Result<()> {
        let mut data = self.data.clone();
        let meal = data
            .meals
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| CatalogError::meal_not_found(id))?;
        meal.recipe = recipe.to_string();
        self.commit(data)?;
        debug!(meal_id = id, "updated recipe");
        Ok(())
    }

    fn add_ingredient(&mut self, meal_id: i64, name: &str) -> Result<Ingredient> {
        let name = require_text(name, "Ingredient name")?;

        let mut data = self.data.clone();
        let id = data.next_ingredient_id;
        let meal = data
            .meals
            .iter_mut()
            .find(|m| m.id == meal_id)
            .ok_or_else(|| CatalogError::meal_not_found(meal_id))?;
        meal.ingredients.push(StoredIngredient {
            id,
            name: name.clone(),
        });
        data.next_ingredient_id += 1;
        self.commit(data)?;

        debug!(meal_id, ingredient_id = id, "added ingredient");
        Ok(Ingredient { id, name, meal_id })
    }

    fn delete_ingredient(&mut self, id: i64) -> Result<()> {
        let owned = self
            .data
            .meals
            .iter()
            .any(|m| m.ingredients.iter().any(|i| i.id == id));
        if !owned {
            return Ok(());
        }
        let mut data = self.data.clone();
        for meal in &mut data.meals {
            meal.ingredients.retain(|i| i.id != id);
        }
        self.commit(data)?;
        debug!(ingredient_id = id, "deleted ingredient");
        Ok(())
    }

    fn meal_count(&self) -> Result<usize> {
        Ok(self.data.meals.len())
    }
}
