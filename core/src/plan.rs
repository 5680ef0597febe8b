//! Weekly plan assignment.
//!
//! A plan maps each of the seven weekdays to at most one meal id. Plans are
//! never stored; they are drawn at random from a snapshot of the catalog and
//! rerolled in place of regeneration when the user wants a different meal.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::{Day, Meal};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeeklyPlan {
    days: [Option<i64>; 7],
}

impl WeeklyPlan {
    /// The meal id assigned to `day`, without checking that it still exists.
    #[must_use]
    pub fn get(&self, day: Day) -> Option<i64> {
        self.days[day.index()]
    }

    pub fn set(&mut self, day: Day, meal_id: Option<i64>) {
        self.days[day.index()] = meal_id;
    }

    pub fn entries(&self) -> impl Iterator<Item = (Day, Option<i64>)> + '_ {
        Day::ALL.into_iter().map(|day| (day, self.get(day)))
    }

    /// Look every day up in `catalog`. Days whose meal has since been deleted
    /// come back as `None`, the same as days that never had a meal.
    #[must_use]
    pub fn resolve<'a>(&self, catalog: &'a [Meal]) -> Vec<(Day, Option<&'a Meal>)> {
        self.entries()
            .map(|(day, id)| (day, id.and_then(|id| catalog.iter().find(|m| m.id == id))))
            .collect()
    }

    /// Number of days pointing at a meal that is not in `catalog`.
    #[must_use]
    pub fn stale_days(&self, catalog: &[Meal]) -> usize {
        self.entries()
            .filter(|(_, id)| id.is_some_and(|id| !catalog.iter().any(|m| m.id == id)))
            .count()
    }
}

impl Serialize for WeeklyPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Day::ALL.len()))?;
        for (day, id) in self.entries() {
            map.serialize_entry(&day, &id)?;
        }
        map.end()
    }
}

/// Draw one meal per day, independently and uniformly, with repetition allowed.
/// An empty catalog yields a plan with every day empty.
pub fn generate_plan<R: Rng + ?Sized>(catalog: &[Meal], rng: &mut R) -> WeeklyPlan {
    let mut plan = WeeklyPlan::default();
    for day in Day::ALL {
        plan.set(day, catalog.choose(rng).map(|m| m.id));
    }
    plan
}

/// Replace `day`'s meal with a different one from `catalog`.
///
/// The current meal is excluded by id. When there is no alternative (the
/// catalog is empty or holds only the current meal) the plan is returned
/// unchanged.
#[must_use]
pub fn reroll_day<R: Rng + ?Sized>(
    plan: &WeeklyPlan,
    day: Day,
    catalog: &[Meal],
    rng: &mut R,
) -> WeeklyPlan {
    let current = plan.get(day);
    let alternatives: Vec<i64> = catalog
        .iter()
        .map(|m| m.id)
        .filter(|&id| Some(id) != current)
        .collect();

    let mut updated = *plan;
    if let Some(&id) = alternatives.choose(rng) {
        updated.set(day, Some(id));
    }
    updated
}

/// A fresh plan for the whole week. Previous choices are not excluded.
pub fn reroll_week<R: Rng + ?Sized>(catalog: &[Meal], rng: &mut R) -> WeeklyPlan {
    generate_plan(catalog, rng)
}
