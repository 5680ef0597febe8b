use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub recipe: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub meal_id: i64,
}

/// A meal together with the ingredients it owns, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MealDetail {
    #[serde(flatten)]
    pub meal: Meal,
    pub ingredients: Vec<Ingredient>,
}

impl MealDetail {
    #[must_use]
    pub fn ingredient_names(&self) -> Vec<&str> {
        self.ingredients.iter().map(|i| i.name.as_str()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct NewMeal {
    pub name: String,
    pub category: Category,
    pub recipe: String,
    pub ingredients: Vec<String>,
}

impl NewMeal {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            recipe: String::new(),
            ingredients: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_recipe(mut self, recipe: impl Into<String>) -> Self {
        self.recipe = recipe.into();
        self
    }

    #[must_use]
    pub fn with_ingredients<I, S>(mut self, ingredients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ingredients = ingredients.into_iter().map(Into::into).collect();
        self
    }

    /// Trimmed, non-blank ingredient names in their original order.
    #[must_use]
    pub fn cleaned_ingredients(&self) -> Vec<String> {
        self.ingredients
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Split a free-text ingredient list on newlines and commas.
///
/// Entries are trimmed and blanks are dropped.
#[must_use]
pub fn split_ingredient_list(text: &str) -> Vec<String> {
    text.split(['\n', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// --- Display language ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    De,
    En,
}

impl Language {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "de" | "deutsch" | "german" => Ok(Self::De),
            "en" | "english" | "englisch" => Ok(Self::En),
            other => Err(CatalogError::Validation(format!(
                "Invalid language '{other}'. Must be one of: de, en"
            ))),
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::De => Self::En,
            Self::En => Self::De,
        }
    }
}

impl FromStr for Language {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// --- Category ---

/// Meal category. Stored as the lowercase English name whatever the display language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Vegan,
    Vegetarian,
    Meat,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Vegan, Category::Vegetarian, Category::Meat];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vegan => "vegan",
            Self::Vegetarian => "vegetarian",
            Self::Meat => "meat",
        }
    }

    #[must_use]
    pub fn label(self, lang: Language) -> &'static str {
        match (self, lang) {
            (Self::Vegan, _) => "Vegan",
            (Self::Vegetarian, Language::De) => "Vegetarisch",
            (Self::Vegetarian, Language::En) => "Vegetarian",
            (Self::Meat, Language::De) => "Fleisch",
            (Self::Meat, Language::En) => "Meat",
        }
    }

    /// Accepts the stored name or any display label, case-insensitively.
    pub fn parse(value: &str) -> Result<Self> {
        let lower = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| {
                c.as_str() == lower
                    || c.label(Language::De).to_lowercase() == lower
                    || c.label(Language::En).to_lowercase() == lower
            })
            .ok_or_else(|| {
                CatalogError::Validation(format!(
                    "Invalid category '{value}'. Must be one of: {}",
                    Self::ALL.map(Category::as_str).join(", ")
                ))
            })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// --- Weekdays ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    /// Position in the week, Monday = 0.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn label(self, lang: Language) -> &'static str {
        match lang {
            Language::En => match self {
                Self::Monday => "Monday",
                Self::Tuesday => "Tuesday",
                Self::Wednesday => "Wednesday",
                Self::Thursday => "Thursday",
                Self::Friday => "Friday",
                Self::Saturday => "Saturday",
                Self::Sunday => "Sunday",
            },
            Language::De => match self {
                Self::Monday => "Montag",
                Self::Tuesday => "Dienstag",
                Self::Wednesday => "Mittwoch",
                Self::Thursday => "Donnerstag",
                Self::Friday => "Freitag",
                Self::Saturday => "Samstag",
                Self::Sunday => "Sonntag",
            },
        }
    }

    /// Parse an English or German weekday name, or its first three letters.
    pub fn parse(value: &str) -> Result<Self> {
        let lower = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| {
                let en = d.label(Language::En).to_lowercase();
                let de = d.label(Language::De).to_lowercase();
                let abbreviated =
                    lower.len() == 3 && (en.starts_with(&lower) || de.starts_with(&lower));
                en == lower || de == lower || abbreviated
            })
            .ok_or_else(|| CatalogError::Validation(format!("Invalid weekday '{value}'")))
    }
}

impl From<chrono::Weekday> for Day {
    fn from(weekday: chrono::Weekday) -> Self {
        Self::ALL[weekday.num_days_from_monday() as usize]
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label(Language::En))
    }
}

impl FromStr for Day {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ingredient_list() {
        assert_eq!(
            split_ingredient_list("Spaghetti, Minced beef\n  Tomato sauce ,\n\n , "),
            vec!["Spaghetti", "Minced beef", "Tomato sauce"]
        );
        assert!(split_ingredient_list("  ").is_empty());
    }

    #[test]
    fn test_cleaned_ingredients_keeps_order() {
        let meal = NewMeal::new("Salad", Category::Vegan)
            .with_ingredients([" lettuce", "", "  ", "tomato  "]);
        assert_eq!(meal.cleaned_ingredients(), vec!["lettuce", "tomato"]);
    }

    #[test]
    fn test_category_parse_canonical_and_labels() {
        assert_eq!(Category::parse("meat").unwrap(), Category::Meat);
        assert_eq!(Category::parse("Fleisch").unwrap(), Category::Meat);
        assert_eq!(Category::parse("VEGETARISCH").unwrap(), Category::Vegetarian);
        assert_eq!(Category::parse(" Vegan ").unwrap(), Category::Vegan);
        assert!(Category::parse("fish").unwrap_err().is_validation());
    }

    #[test]
    fn test_category_serializes_canonically() {
        let json = serde_json::to_string(&Category::Vegetarian).unwrap();
        assert_eq!(json, "\"vegetarian\"");
    }

    #[test]
    fn test_day_parse() {
        assert_eq!(Day::parse("monday").unwrap(), Day::Monday);
        assert_eq!(Day::parse("Mittwoch").unwrap(), Day::Wednesday);
        assert_eq!(Day::parse("sun").unwrap(), Day::Sunday);
        assert_eq!(Day::parse("Son").unwrap(), Day::Sunday);
        assert!(Day::parse("someday").is_err());
    }

    #[test]
    fn test_day_from_chrono() {
        assert_eq!(Day::from(chrono::Weekday::Mon), Day::Monday);
        assert_eq!(Day::from(chrono::Weekday::Sun), Day::Sunday);
    }

    #[test]
    fn test_day_order_is_fixed() {
        for (i, day) in Day::ALL.iter().enumerate() {
            assert_eq!(day.index(), i);
        }
    }

    #[test]
    fn test_language_toggle() {
        assert_eq!(Language::default(), Language::De);
        assert_eq!(Language::De.toggled(), Language::En);
        assert_eq!(Language::parse("EN").unwrap(), Language::En);
        assert!(Language::parse("fr").is_err());
    }
}
