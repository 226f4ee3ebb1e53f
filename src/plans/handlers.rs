use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, ApiResult},
    recipes::repo as recipes_repo,
    state::AppState,
};

use super::dto::{
    CreatePlanRequest, CurrentPlanResponse, NewEntryRequest, TodayMealRequest, TodayResponse,
};
use super::repo;
use super::repo_types::{MealPlan, MealPlanEntry, MealType};
use super::services::{self, TodayPlan};

pub fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/meal-plans", post(create_plan))
        .route("/meal-plans/current", get(current_plan))
        .route("/meal-plans/:id/entries", get(list_entries).post(add_entry))
        .route("/meal-plan-entries/:id", delete(remove_entry))
}

pub fn today_routes() -> Router<AppState> {
    Router::new().route("/meals/today", get(today_meals).post(add_today_meal))
}

#[instrument(skip(state))]
pub async fn current_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<CurrentPlanResponse>> {
    let plan = repo::latest_for_user(&state.db, user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to load meal plan", e))?;

    let (entries, week) = match &plan {
        Some(p) => {
            let entries = repo::entries_in_range(&state.db, p)
                .await
                .map_err(|e| ApiError::internal("Failed to load meal plan", e))?;
            (entries, p.week_dates())
        }
        None => (Vec::new(), Vec::new()),
    };
    debug!(%user_id, entries = entries.len(), "current plan loaded");

    Ok(Json(CurrentPlanResponse {
        plan,
        entries,
        week,
        meal_types: MealType::ALL,
    }))
}

#[instrument(skip(state, body))]
pub async fn create_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreatePlanRequest>,
) -> ApiResult<(StatusCode, Json<MealPlan>)> {
    let name = services::validate_plan_name(&body.name).map_err(ApiError::BadRequest)?;
    let (start, end) = services::plan_window(services::today());
    let plan = repo::create(&state.db, user_id, &name, start, end)
        .await
        .map_err(|e| ApiError::internal("Failed to create meal plan", e))?;
    info!(%user_id, plan_id = %plan.id, "meal plan created");
    Ok((StatusCode::CREATED, Json(plan)))
}

#[instrument(skip(state))]
pub async fn list_entries(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(plan_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MealPlanEntry>>> {
    let plan = load_plan(&state, user_id, plan_id).await?;
    let entries = repo::entries_in_range(&state.db, &plan)
        .await
        .map_err(|e| ApiError::internal("Failed to load meal plan", e))?;
    Ok(Json(entries))
}

#[instrument(skip(state, body))]
pub async fn add_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(plan_id): Path<Uuid>,
    Json(body): Json<NewEntryRequest>,
) -> ApiResult<(StatusCode, Json<MealPlanEntry>)> {
    let plan = load_plan(&state, user_id, plan_id).await?;
    services::validate_entry_date(&plan, body.meal_date).map_err(ApiError::BadRequest)?;
    ensure_recipe_visible(&state, user_id, body.recipe_id).await?;

    let entry = repo::insert_entry(
        &state.db,
        plan.id,
        body.meal_date,
        body.meal_type,
        body.recipe_id,
        services::normalize_servings(body.servings),
    )
    .await
    .map_err(|e| ApiError::internal("Failed to add meal", e))?;
    info!(%user_id, plan_id = %plan.id, entry_id = %entry.id, "meal added");
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state))]
pub async fn remove_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(entry_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let removed = repo::delete_entry(&state.db, user_id, entry_id)
        .await
        .map_err(|e| ApiError::internal("Failed to remove meal", e))?;
    if !removed {
        return Err(ApiError::not_found("Meal not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn today_meals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<TodayResponse>> {
    let date = services::today();
    let entries = repo::entries_on_date(&state.db, user_id, date)
        .await
        .map_err(|e| ApiError::internal("Failed to load today's meals", e))?;
    Ok(Json(TodayResponse { date, entries }))
}

#[instrument(skip(state, body))]
pub async fn add_today_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<TodayMealRequest>,
) -> ApiResult<(StatusCode, Json<MealPlanEntry>)> {
    let today = services::today();
    ensure_recipe_visible(&state, user_id, body.recipe_id).await?;

    let candidate = repo::find_starting_from(&state.db, user_id, services::start_of_week(today))
        .await
        .map_err(|e| ApiError::internal("Failed to add meal", e))?;
    let plan = match services::plan_for_today(candidate, today) {
        TodayPlan::Existing(p) => p,
        TodayPlan::Create { name, start, end } => {
            let plan = repo::create(&state.db, user_id, &name, start, end)
                .await
                .map_err(|e| ApiError::internal("Failed to add meal", e))?;
            info!(%user_id, plan_id = %plan.id, "weekly plan created");
            plan
        }
    };

    let entry = repo::insert_entry(
        &state.db,
        plan.id,
        today,
        body.meal_type,
        body.recipe_id,
        services::normalize_servings(body.servings),
    )
    .await
    .map_err(|e| ApiError::internal("Failed to add meal", e))?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn load_plan(state: &AppState, user_id: Uuid, plan_id: Uuid) -> ApiResult<MealPlan> {
    repo::get_for_user(&state.db, user_id, plan_id)
        .await
        .map_err(|e| ApiError::internal("Failed to load meal plan", e))?
        .ok_or_else(|| ApiError::not_found("Meal plan not found"))
}

async fn ensure_recipe_visible(state: &AppState, user_id: Uuid, recipe_id: Uuid) -> ApiResult<()> {
    recipes_repo::get(&state.db, recipe_id)
        .await
        .map_err(|e| ApiError::internal("Failed to load recipe", e))?
        .filter(|r| r.is_visible_to(user_id))
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("Recipe not found"))
}
