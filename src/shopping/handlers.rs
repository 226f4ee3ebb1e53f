use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

use super::dto::{AddItemRequest, CommitRequest, GeneratedQuery};
use super::repo_types::ShoppingListItem;
use super::services::{self, GeneratedList, ManualListView};

const GENERATE_FAILED: &str = "Failed to generate shopping list from meal plan";

pub fn generated_routes() -> Router<AppState> {
    Router::new()
        .route("/shopping/generated", get(generated_list))
        .route("/shopping/generated/commit", post(commit_generated))
        .route("/shopping/generated/commit-all", post(commit_all_generated))
}

pub fn manual_routes() -> Router<AppState> {
    Router::new()
        .route("/shopping/items", get(list_items).post(add_item))
        .route("/shopping/items/:id/toggle", post(toggle_item))
        .route("/shopping/items/:id", delete(remove_item))
}

#[instrument(skip(state))]
pub async fn generated_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<GeneratedQuery>,
) -> ApiResult<Json<GeneratedList>> {
    let store = state.store.as_ref();
    let list = match q.plan_id {
        Some(plan_id) => services::generate_for_plan(store, user_id, plan_id)
            .await
            .map_err(|e| ApiError::internal(GENERATE_FAILED, e))?
            .ok_or_else(|| ApiError::not_found("Meal plan not found"))?,
        None => services::generate_for_latest_plan(store, user_id)
            .await
            .map_err(|e| ApiError::internal(GENERATE_FAILED, e))?,
    };
    Ok(Json(list))
}

#[instrument(skip(state, body))]
pub async fn commit_generated(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CommitRequest>,
) -> ApiResult<(StatusCode, Json<ShoppingListItem>)> {
    let item = services::generated_item(&body.name, body.quantity, &body.unit)
        .map_err(ApiError::BadRequest)?;
    let mut added = services::add_items(state.store.as_ref(), user_id, &[item])
        .await
        .map_err(|e| ApiError::internal("Failed to add item to shopping list", e))?;
    let row = added
        .pop()
        .ok_or_else(|| ApiError::Internal("Failed to add item to shopping list".into()))?;
    info!(%user_id, item_id = %row.id, "generated ingredient committed");
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state))]
pub async fn commit_all_generated(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<GeneratedQuery>,
) -> ApiResult<Json<Vec<ShoppingListItem>>> {
    let added = services::commit_all_generated(state.store.as_ref(), user_id, q.plan_id)
        .await
        .map_err(|e| ApiError::internal("Failed to add items to shopping list", e))?
        .ok_or_else(|| ApiError::not_found("Meal plan not found"))?;
    info!(%user_id, count = added.len(), "generated list committed");
    Ok(Json(added))
}

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<ManualListView>> {
    let view = services::manual_list_view(state.store.as_ref(), user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to load shopping list", e))?;
    Ok(Json(view))
}

#[instrument(skip(state, body))]
pub async fn add_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<AddItemRequest>,
) -> ApiResult<(StatusCode, Json<ShoppingListItem>)> {
    let item = services::new_item(&body.product_name, body.quantity, body.unit.as_deref())
        .map_err(ApiError::BadRequest)?;
    let mut added = services::add_items(state.store.as_ref(), user_id, &[item])
        .await
        .map_err(|e| ApiError::internal("Failed to add item", e))?;
    let row = added
        .pop()
        .ok_or_else(|| ApiError::Internal("Failed to add item".into()))?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state))]
pub async fn toggle_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<Uuid>,
) -> ApiResult<Json<ShoppingListItem>> {
    let item = state
        .store
        .toggle_item(user_id, item_id)
        .await
        .map_err(|e| ApiError::internal("Failed to update item", e))?
        .ok_or_else(|| ApiError::not_found("Item not found"))?;
    Ok(Json(item))
}

#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let removed = state
        .store
        .delete_item(user_id, item_id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete item", e))?;
    if !removed {
        return Err(ApiError::not_found("Item not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::extract::FromRef;
    use axum::http::Request;
    use serde_json::Value;
    use time::macros::{date, datetime};
    use tower::ServiceExt;

    use crate::auth::jwt::JwtKeys;
    use crate::plans::repo_types::{MealPlan, MealPlanEntry, MealType};
    use crate::recipes::repo_types::RecipeIngredient;
    use crate::store::memory::MemoryStore;

    use super::*;

    struct Harness {
        state: AppState,
        store: Arc<MemoryStore>,
        user_id: Uuid,
        token: String,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::default());
        let state = AppState::fake_with_store(store.clone());
        let user_id = Uuid::new_v4();
        let token = JwtKeys::from_ref(&state).sign_access(user_id).unwrap();
        Harness {
            state,
            store,
            user_id,
            token,
        }
    }

    fn seed_plan(h: &Harness) -> MealPlan {
        let plan = MealPlan {
            id: Uuid::new_v4(),
            user_id: h.user_id,
            name: "Week".into(),
            start_date: date!(2024 - 06 - 02),
            end_date: date!(2024 - 06 - 08),
            created_at: datetime!(2024-06-01 0:00 UTC),
        };
        let stew = Uuid::new_v4();
        let broth = Uuid::new_v4();
        h.store.set_ingredients(
            stew,
            vec![RecipeIngredient {
                id: Uuid::new_v4(),
                recipe_id: stew,
                ingredient_name: "salt".into(),
                quantity: 5.0,
                unit: "g".into(),
                category_id: None,
                category_name: None,
            }],
        );
        h.store.set_ingredients(
            broth,
            vec![RecipeIngredient {
                id: Uuid::new_v4(),
                recipe_id: broth,
                ingredient_name: "Salt".into(),
                quantity: 2.0,
                unit: "g".into(),
                category_id: None,
                category_name: None,
            }],
        );
        for (recipe_id, title, day) in [
            (stew, "Stew", date!(2024 - 06 - 03)),
            (broth, "Broth", date!(2024 - 06 - 04)),
        ] {
            h.store.add_entry(MealPlanEntry {
                id: Uuid::new_v4(),
                meal_plan_id: plan.id,
                meal_date: day,
                meal_type: MealType::Dinner,
                recipe_id: Some(recipe_id),
                recipe_title: Some(title.into()),
                servings: 1,
            });
        }
        h.store.add_plan(plan.clone());
        plan
    }

    async fn call(h: &Harness, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", h.token));
        let body = match body {
            Some(v) => {
                req = req.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = crate::app::build_app(h.state.clone())
            .oneshot(req.body(body).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn generated_list_merges_case_insensitive_names() {
        let h = harness();
        let plan = seed_plan(&h);
        let (status, body) = call(&h, "GET", "/api/v1/shopping/generated", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plan"]["id"], plan.id.to_string());
        let items = body["ingredients"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["quantity"], 7.0);
        assert_eq!(items[0]["recipes"], serde_json::json!(["Stew", "Broth"]));
    }

    #[tokio::test]
    async fn generated_list_for_unknown_plan_is_404() {
        let h = harness();
        seed_plan(&h);
        let uri = format!("/api/v1/shopping/generated?plan_id={}", Uuid::new_v4());
        let (status, _) = call(&h, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn generation_failure_is_generic_500() {
        let h = harness();
        seed_plan(&h);
        h.store.fail_ingredient_fetches();
        let res = crate::app::build_app(h.state.clone())
            .oneshot(
                Request::get("/api/v1/shopping/generated")
                    .header("authorization", format!("Bearer {}", h.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], GENERATE_FAILED.as_bytes());
    }

    #[tokio::test]
    async fn committing_leaves_generated_list_unchanged() {
        let h = harness();
        seed_plan(&h);
        let (_, before) = call(&h, "GET", "/api/v1/shopping/generated", None).await;
        let line = &before["ingredients"][0];
        let (status, item) = call(
            &h,
            "POST",
            "/api/v1/shopping/generated/commit",
            Some(serde_json::json!({
                "name": line["name"],
                "quantity": line["quantity"],
                "unit": line["unit"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(item["is_purchased"], false);

        let (_, after) = call(&h, "GET", "/api/v1/shopping/generated", None).await;
        assert_eq!(before["ingredients"], after["ingredients"]);
    }

    #[tokio::test]
    async fn manual_item_lifecycle() {
        let h = harness();
        let (status, item) = call(
            &h,
            "POST",
            "/api/v1/shopping/items",
            Some(serde_json::json!({ "product_name": "Milk" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(item["quantity"], 1.0);
        assert_eq!(item["unit"], "pcs");
        let id = item["id"].as_str().unwrap().to_string();

        let (status, toggled) =
            call(&h, "POST", &format!("/api/v1/shopping/items/{id}/toggle"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(toggled["is_purchased"], true);

        let (_, view) = call(&h, "GET", "/api/v1/shopping/items", None).await;
        assert_eq!(view["total"], 1);
        assert_eq!(view["purchased"], 1);
        assert_eq!(view["list"]["name"], "Manual Shopping List");

        let (status, _) = call(&h, "DELETE", &format!("/api/v1/shopping/items/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&h, "DELETE", &format!("/api/v1/shopping/items/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn blank_item_name_is_rejected() {
        let h = harness();
        let (status, _) = call(
            &h,
            "POST",
            "/api/v1/shopping/items",
            Some(serde_json::json!({ "product_name": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(h.store.item_count(), 0);
    }

    #[tokio::test]
    async fn commit_all_adds_each_generated_line() {
        let h = harness();
        seed_plan(&h);
        let (status, added) =
            call(&h, "POST", "/api/v1/shopping/generated/commit-all", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(added.as_array().unwrap().len(), 1);
        assert_eq!(h.store.item_count(), 1);
    }

    #[tokio::test]
    async fn commit_all_with_plan_id_commits_that_plan() {
        let h = harness();
        let viewed = seed_plan(&h);
        let newer = MealPlan {
            id: Uuid::new_v4(),
            user_id: h.user_id,
            name: "Next week".into(),
            start_date: date!(2024 - 06 - 09),
            end_date: date!(2024 - 06 - 15),
            created_at: datetime!(2024-06-08 0:00 UTC),
        };
        h.store.add_plan(newer);

        let uri = format!("/api/v1/shopping/generated/commit-all?plan_id={}", viewed.id);
        let (status, added) = call(&h, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let added = added.as_array().unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0]["product_name"], "salt");
        assert_eq!(added[0]["quantity"], 7.0);
    }

    #[tokio::test]
    async fn commit_all_for_unknown_plan_is_404() {
        let h = harness();
        seed_plan(&h);
        let uri = format!("/api/v1/shopping/generated/commit-all?plan_id={}", Uuid::new_v4());
        let (status, _) = call(&h, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(h.store.item_count(), 0);
    }

    #[tokio::test]
    async fn shopping_requires_auth() {
        let h = harness();
        let res = crate::app::build_app(h.state.clone())
            .oneshot(
                Request::get("/api/v1/shopping/items")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
