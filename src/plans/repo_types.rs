use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

/// Slot of the day a planned meal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown meal type {0:?}")]
pub struct UnknownMealType(String);

impl TryFrom<String> for MealType {
    type Error = UnknownMealType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MealType::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .ok_or(UnknownMealType(value))
    }
}

/// Date-bounded plan owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MealPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub created_at: OffsetDateTime,
}

impl MealPlan {
    pub fn contains(&self, date: Date) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// The seven calendar days shown for the plan, starting at `start_date`.
    pub fn week_dates(&self) -> Vec<Date> {
        (0..7)
            .map(|i| self.start_date + Duration::days(i))
            .collect()
    }
}

/// One planned meal. `recipe_title` comes from the join on `recipes`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MealPlanEntry {
    pub id: Uuid,
    pub meal_plan_id: Uuid,
    pub meal_date: Date,
    #[sqlx(try_from = "String")]
    pub meal_type: MealType,
    pub recipe_id: Option<Uuid>,
    pub recipe_title: Option<String>,
    pub servings: i32,
}

impl MealPlanEntry {
    /// Servings used for scaling; anything below one counts as a single serving.
    pub fn effective_servings(&self) -> i32 {
        if self.servings < 1 {
            1
        } else {
            self.servings
        }
    }
}
