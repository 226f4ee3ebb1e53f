use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const MANUAL_LIST_NAME: &str = "Manual Shopping List";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShoppingList {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meal_plan_id: Option<Uuid>, // NULL for the manual list
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShoppingListItem {
    pub id: Uuid,
    pub shopping_list_id: Uuid,
    pub product_name: String,
    pub quantity: f64,
    pub unit: String,
    pub is_purchased: bool,
    pub created_at: OffsetDateTime,
}

/// Item about to be appended to a list; always starts unpurchased.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShoppingItem {
    pub product_name: String,
    pub quantity: f64,
    pub unit: String,
}
