use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::repo_types::{MealPlan, MealPlanEntry, MealType};

#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct NewEntryRequest {
    pub meal_date: Date,
    pub meal_type: MealType,
    pub recipe_id: Uuid,
    pub servings: Option<i32>,
}

/// Adding a meal from the "today" view; the date is implied.
#[derive(Debug, Deserialize)]
pub struct TodayMealRequest {
    pub meal_type: MealType,
    pub recipe_id: Uuid,
    pub servings: Option<i32>,
}

/// Planner view: latest plan, its entries and the calendar to lay them on.
#[derive(Debug, Serialize)]
pub struct CurrentPlanResponse {
    pub plan: Option<MealPlan>,
    pub entries: Vec<MealPlanEntry>,
    pub week: Vec<Date>,
    pub meal_types: [MealType; 4],
}

#[derive(Debug, Serialize)]
pub struct TodayResponse {
    pub date: Date,
    pub entries: Vec<MealPlanEntry>,
}
