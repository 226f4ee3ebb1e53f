use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Recipe row. `user_id` is empty for built-in recipes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    pub calories_per_serving: i32,
    pub category_id: Option<Uuid>,
    pub is_public: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Recipe {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }

    pub fn is_visible_to(&self, user_id: Uuid) -> bool {
        self.is_public || self.is_owned_by(user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeIngredient {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub ingredient_name: String,
    pub quantity: f64,
    pub unit: String,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeStep {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub step_number: i32,
    pub instruction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeTag {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub tag_name: String,
}

/// Row of `recipe_categories` or `ingredient_categories`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecipeChoice {
    pub id: Uuid,
    pub title: String,
}
