use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_CALORIE_GOAL: i32 = 2000;

/// Personal settings, one row per user (`id` is the user id).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub diet_type: String,
    pub calorie_goal: i32,
    pub allergies: Vec<String>,
    pub updated_at: OffsetDateTime,
}

impl Profile {
    /// What a user sees before ever saving the profile form.
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            id: user_id,
            first_name: String::new(),
            last_name: String::new(),
            diet_type: String::new(),
            calorie_goal: DEFAULT_CALORIE_GOAL,
            allergies: Vec::new(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }
}
