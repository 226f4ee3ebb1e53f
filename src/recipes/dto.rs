use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::{Recipe, RecipeIngredient, RecipeStep, RecipeTag};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeScope {
    #[default]
    Public,
    Mine,
}

/// Query string of `GET /recipes`.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeQuery {
    #[serde(default)]
    pub scope: RecipeScope,
    pub search: Option<String>,
    pub max_calories: Option<i32>,
    pub max_prep_time: Option<i32>,
    pub servings: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChoiceQuery {
    pub search: Option<String>,
}

/// Body of recipe create / update.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image_url: Option<String>, // data:image/...;base64,...
    #[serde(default)]
    pub prep_time: i32,
    #[serde(default)]
    pub cook_time: i32,
    #[serde(default = "default_servings")]
    pub servings: i32,
    #[serde(default)]
    pub calories_per_serving: i32,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub is_public: bool,
}

fn default_servings() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct NewIngredientRequest {
    pub ingredient_name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewStepRequest {
    pub instruction: String,
}

#[derive(Debug, Deserialize)]
pub struct NewTagRequest {
    pub tag_name: String,
}

#[derive(Debug, Serialize)]
pub struct RecipeDetails {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<RecipeStep>,
    pub tags: Vec<RecipeTag>,
}
