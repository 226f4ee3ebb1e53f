use serde::Deserialize;

use super::repo_types::DEFAULT_CALORIE_GOAL;

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub diet_type: String,
    #[serde(default = "default_calorie_goal")]
    pub calorie_goal: i32,
    #[serde(default)]
    pub allergies: Vec<String>,
}

fn default_calorie_goal() -> i32 {
    DEFAULT_CALORIE_GOAL
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}
