use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::plans::{
    repo as plans_repo,
    repo_types::{MealPlan, MealPlanEntry},
};
use crate::recipes::{repo as recipes_repo, repo_types::RecipeIngredient};
use crate::shopping::{
    repo as shopping_repo,
    repo_types::{NewShoppingItem, ShoppingList, ShoppingListItem},
};

/// Data access needed by shopping-list generation and the manual list.
#[async_trait]
pub trait PlannerStore: Send + Sync {
    async fn latest_meal_plan(&self, user_id: Uuid) -> anyhow::Result<Option<MealPlan>>;
    async fn meal_plan(&self, user_id: Uuid, plan_id: Uuid) -> anyhow::Result<Option<MealPlan>>;
    async fn entries_in_range(&self, plan: &MealPlan) -> anyhow::Result<Vec<MealPlanEntry>>;
    async fn recipe_ingredients(&self, recipe_id: Uuid) -> anyhow::Result<Vec<RecipeIngredient>>;

    async fn manual_list(&self, user_id: Uuid) -> anyhow::Result<ShoppingList>;
    async fn list_items(&self, list_id: Uuid) -> anyhow::Result<Vec<ShoppingListItem>>;
    async fn append_items(
        &self,
        list_id: Uuid,
        items: &[NewShoppingItem],
    ) -> anyhow::Result<Vec<ShoppingListItem>>;
    async fn toggle_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> anyhow::Result<Option<ShoppingListItem>>;
    async fn delete_item(&self, user_id: Uuid, item_id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PlannerStore for PgStore {
    async fn latest_meal_plan(&self, user_id: Uuid) -> anyhow::Result<Option<MealPlan>> {
        plans_repo::latest_for_user(&self.db, user_id).await
    }

    async fn meal_plan(&self, user_id: Uuid, plan_id: Uuid) -> anyhow::Result<Option<MealPlan>> {
        plans_repo::get_for_user(&self.db, user_id, plan_id).await
    }

    async fn entries_in_range(&self, plan: &MealPlan) -> anyhow::Result<Vec<MealPlanEntry>> {
        plans_repo::entries_in_range(&self.db, plan).await
    }

    async fn recipe_ingredients(&self, recipe_id: Uuid) -> anyhow::Result<Vec<RecipeIngredient>> {
        recipes_repo::ingredients(&self.db, recipe_id).await
    }

    async fn manual_list(&self, user_id: Uuid) -> anyhow::Result<ShoppingList> {
        shopping_repo::manual_list(&self.db, user_id).await
    }

    async fn list_items(&self, list_id: Uuid) -> anyhow::Result<Vec<ShoppingListItem>> {
        shopping_repo::list_items(&self.db, list_id).await
    }

    async fn append_items(
        &self,
        list_id: Uuid,
        items: &[NewShoppingItem],
    ) -> anyhow::Result<Vec<ShoppingListItem>> {
        shopping_repo::append_items(&self.db, list_id, items).await
    }

    async fn toggle_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> anyhow::Result<Option<ShoppingListItem>> {
        shopping_repo::toggle_item(&self.db, user_id, item_id).await
    }

    async fn delete_item(&self, user_id: Uuid, item_id: Uuid) -> anyhow::Result<bool> {
        shopping_repo::delete_item(&self.db, user_id, item_id).await
    }
}
