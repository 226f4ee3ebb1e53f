use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct GeneratedQuery {
    pub plan_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

/// One line of the generated list, as sent back by the client to keep it.
#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}
