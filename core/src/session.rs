use rand::Rng;

use crate::models::{Day, Language, Meal};
use crate::plan::{self, WeeklyPlan};

/// Per-user interaction state: display language, the current weekly plan and
/// which meal's detail view is open.
///
/// Owned by the presentation layer. The plan starts out unset and is drawn
/// the first time it is read; after that it only changes through the reroll
/// methods.
#[derive(Debug, Clone, Default)]
pub struct Session {
    language: Language,
    plan: Option<WeeklyPlan>,
    open_meal: Option<i64>,
}

impl Session {
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self {
            language,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn toggle_language(&mut self) -> Language {
        self.language = self.language.toggled();
        self.language
    }

    /// The plan if one has been drawn in this session.
    #[must_use]
    pub fn plan(&self) -> Option<&WeeklyPlan> {
        self.plan.as_ref()
    }

    pub fn plan_or_generate<R: Rng + ?Sized>(
        &mut self,
        catalog: &[Meal],
        rng: &mut R,
    ) -> &WeeklyPlan {
        self.plan
            .get_or_insert_with(|| plan::generate_plan(catalog, rng))
    }

    pub fn reroll_week<R: Rng + ?Sized>(&mut self, catalog: &[Meal], rng: &mut R) -> &WeeklyPlan {
        self.plan.insert(plan::reroll_week(catalog, rng))
    }

    /// Reroll one day. An unset plan is drawn first, then that day is rerolled.
    pub fn reroll_day<R: Rng + ?Sized>(
        &mut self,
        day: Day,
        catalog: &[Meal],
        rng: &mut R,
    ) -> &WeeklyPlan {
        let current = *self.plan_or_generate(catalog, rng);
        self.plan.insert(plan::reroll_day(&current, day, catalog, rng))
    }

    #[must_use]
    pub fn open_meal(&self) -> Option<i64> {
        self.open_meal
    }

    pub fn select_meal(&mut self, id: i64) {
        self.open_meal = Some(id);
    }

    pub fn close_meal(&mut self) {
        self.open_meal = None;
    }
}
