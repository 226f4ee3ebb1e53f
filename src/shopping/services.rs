use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::plans::repo_types::MealPlan;
use crate::recipes::services::DEFAULT_UNIT;
use crate::store::PlannerStore;

use super::aggregate::{aggregate, referenced_recipes, GeneratedIngredient};
use super::repo_types::{NewShoppingItem, ShoppingList, ShoppingListItem};

/// Aggregated ingredients of one plan. `plan` is `None` when the user has none yet.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedList {
    pub plan: Option<MealPlan>,
    pub ingredients: Vec<GeneratedIngredient>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManualListView {
    pub list: ShoppingList,
    pub items: Vec<ShoppingListItem>,
    pub purchased: usize,
    pub total: usize,
}

impl ManualListView {
    pub fn new(list: ShoppingList, items: Vec<ShoppingListItem>) -> Self {
        let purchased = items.iter().filter(|i| i.is_purchased).count();
        let total = items.len();
        Self {
            list,
            items,
            purchased,
            total,
        }
    }
}

impl From<&GeneratedIngredient> for NewShoppingItem {
    fn from(g: &GeneratedIngredient) -> Self {
        Self {
            product_name: g.name.clone(),
            quantity: g.quantity,
            unit: g.unit.clone(),
        }
    }
}

pub async fn generate_for_latest_plan(
    store: &dyn PlannerStore,
    user_id: Uuid,
) -> anyhow::Result<GeneratedList> {
    match store.latest_meal_plan(user_id).await? {
        Some(plan) => generate(store, plan).await,
        None => {
            debug!(%user_id, "no meal plan, nothing to generate");
            Ok(GeneratedList {
                plan: None,
                ingredients: Vec::new(),
            })
        }
    }
}

/// `Ok(None)` when the plan does not exist or belongs to someone else.
pub async fn generate_for_plan(
    store: &dyn PlannerStore,
    user_id: Uuid,
    plan_id: Uuid,
) -> anyhow::Result<Option<GeneratedList>> {
    match store.meal_plan(user_id, plan_id).await? {
        Some(plan) => Ok(Some(generate(store, plan).await?)),
        None => Ok(None),
    }
}

async fn generate(store: &dyn PlannerStore, plan: MealPlan) -> anyhow::Result<GeneratedList> {
    let entries = store.entries_in_range(&plan).await?;

    let recipe_ids = referenced_recipes(&entries);
    let mut by_recipe = HashMap::with_capacity(recipe_ids.len());
    for recipe_id in recipe_ids {
        let rows = store.recipe_ingredients(recipe_id).await?;
        by_recipe.insert(recipe_id, rows);
    }

    let ingredients = aggregate(&entries, &by_recipe);
    debug!(
        plan_id = %plan.id,
        entries = entries.len(),
        recipes = by_recipe.len(),
        ingredients = ingredients.len(),
        "shopping list generated"
    );
    Ok(GeneratedList {
        plan: Some(plan),
        ingredients,
    })
}

/// Validates a manual item; quantity falls back to 1 and unit to `pcs`.
pub fn new_item(
    product_name: &str,
    quantity: Option<f64>,
    unit: Option<&str>,
) -> Result<NewShoppingItem, String> {
    let product_name = product_name.trim();
    if product_name.is_empty() {
        return Err("Please enter an item name".into());
    }
    let quantity = quantity.filter(|q| q.is_finite() && *q > 0.0).unwrap_or(1.0);
    let unit = unit
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(DEFAULT_UNIT);
    Ok(NewShoppingItem {
        product_name: product_name.to_string(),
        quantity,
        unit: unit.to_string(),
    })
}

/// A generated line committed as-is; only the name and a finite quantity are required.
pub fn generated_item(name: &str, quantity: f64, unit: &str) -> Result<NewShoppingItem, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Please enter an item name".into());
    }
    if !quantity.is_finite() {
        return Err("Quantity must be a number".into());
    }
    Ok(NewShoppingItem {
        product_name: name.to_string(),
        quantity,
        unit: unit.to_string(),
    })
}

pub async fn manual_list_view(
    store: &dyn PlannerStore,
    user_id: Uuid,
) -> anyhow::Result<ManualListView> {
    let list = store.manual_list(user_id).await?;
    let items = store.list_items(list.id).await?;
    Ok(ManualListView::new(list, items))
}

pub async fn add_items(
    store: &dyn PlannerStore,
    user_id: Uuid,
    items: &[NewShoppingItem],
) -> anyhow::Result<Vec<ShoppingListItem>> {
    let list = store.manual_list(user_id).await?;
    store.append_items(list.id, items).await
}

/// Regenerates the list of `plan_id` (latest plan when `None`) and appends every
/// ingredient in one batch. `Ok(None)` when `plan_id` is not one of the user's plans.
pub async fn commit_all_generated(
    store: &dyn PlannerStore,
    user_id: Uuid,
    plan_id: Option<Uuid>,
) -> anyhow::Result<Option<Vec<ShoppingListItem>>> {
    let generated = match plan_id {
        Some(plan_id) => match generate_for_plan(store, user_id, plan_id).await? {
            Some(list) => list,
            None => return Ok(None),
        },
        None => generate_for_latest_plan(store, user_id).await?,
    };
    if generated.ingredients.is_empty() {
        return Ok(Some(Vec::new()));
    }
    let items: Vec<NewShoppingItem> = generated.ingredients.iter().map(Into::into).collect();
    Ok(Some(add_items(store, user_id, &items).await?))
}
