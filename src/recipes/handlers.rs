use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

use super::dto::{
    ChoiceQuery, NewIngredientRequest, NewStepRequest, NewTagRequest, RecipeDetails,
    RecipeInput, RecipeQuery,
};
use super::repo;
use super::repo_types::{Category, Recipe, RecipeChoice, RecipeIngredient, RecipeStep, RecipeTag};
use super::services::{self, RecipeFilter, DEFAULT_UNIT};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/choices", get(list_choices))
        .route("/recipes/:id", get(get_recipe))
        .route("/recipe-categories", get(list_recipe_categories))
        .route("/ingredient-categories", get(list_ingredient_categories))
        .route("/ingredients/suggestions", get(ingredient_suggestions))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create_recipe))
        .route("/recipes/:id", put(update_recipe).delete(delete_recipe))
        .route("/recipes/:id/copy", post(copy_recipe))
        .route("/recipes/:id/ingredients", post(add_ingredient))
        .route("/recipes/:id/ingredients/:item_id", delete(remove_ingredient))
        .route("/recipes/:id/steps", post(add_step))
        .route("/recipes/:id/steps/:item_id", delete(remove_step))
        .route("/recipes/:id/tags", post(add_tag))
        .route("/recipes/:id/tags/:item_id", delete(remove_tag))
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<RecipeQuery>,
) -> ApiResult<Json<Vec<Recipe>>> {
    let filter = RecipeFilter::from(&q);
    let rows = repo::list(&state.db, user_id, &filter)
        .await
        .map_err(|e| ApiError::internal("Failed to load recipes", e))?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn list_choices(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ChoiceQuery>,
) -> ApiResult<Json<Vec<RecipeChoice>>> {
    let pattern = q.search.as_deref().and_then(services::title_pattern);
    let rows = repo::choices(&state.db, user_id, pattern.as_deref())
        .await
        .map_err(|e| ApiError::internal("Failed to load recipes", e))?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RecipeDetails>> {
    let details = services::load_details(&state.db, id)
        .await
        .map_err(|e| ApiError::internal("Failed to load recipe details", e))?;
    let details = services::require_visible(details, user_id)
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;
    Ok(Json(details))
}

#[instrument(skip(state, body))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(mut body): Json<RecipeInput>,
) -> ApiResult<(StatusCode, Json<Recipe>)> {
    services::validate_input(&mut body).map_err(ApiError::BadRequest)?;
    let recipe = repo::create(&state.db, user_id, &body)
        .await
        .map_err(|e| ApiError::internal("Failed to save recipe", e))?;
    info!(%user_id, recipe_id = %recipe.id, "recipe created");
    Ok((StatusCode::CREATED, Json(recipe)))
}

#[instrument(skip(state, body))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(mut body): Json<RecipeInput>,
) -> ApiResult<Json<Recipe>> {
    services::validate_input(&mut body).map_err(ApiError::BadRequest)?;
    let recipe = repo::update(&state.db, user_id, id, &body)
        .await
        .map_err(|e| ApiError::internal("Failed to save recipe", e))?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;
    Ok(Json(recipe))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ensure_owned(&state, user_id, id).await?;
    let deleted = repo::delete(&state.db, user_id, id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete recipe", e))?;
    if !deleted {
        return Err(ApiError::not_found("Recipe not found"));
    }
    info!(%user_id, recipe_id = %id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn copy_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<Recipe>)> {
    let source = services::load_details(&state.db, id)
        .await
        .map_err(|e| ApiError::internal("Failed to copy recipe", e))?;
    let source = services::require_visible(source, user_id)
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;

    let copy = repo::copy(&state.db, user_id, &services::copy_of(&source))
        .await
        .map_err(|e| ApiError::internal("Failed to copy recipe", e))?;
    info!(%user_id, from = %id, recipe_id = %copy.id, "recipe copied");
    Ok((StatusCode::CREATED, Json(copy)))
}

#[instrument(skip(state, body))]
pub async fn add_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<NewIngredientRequest>,
) -> ApiResult<(StatusCode, Json<RecipeIngredient>)> {
    let name = body.ingredient_name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Please enter ingredient name"));
    }
    ensure_owned(&state, user_id, id).await?;

    let quantity = body
        .quantity
        .filter(|q| q.is_finite() && *q > 0.0)
        .unwrap_or(1.0);
    let unit = body
        .unit
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(DEFAULT_UNIT);

    let categories = repo::ingredient_categories(&state.db)
        .await
        .map_err(|e| ApiError::internal("Failed to add ingredient", e))?;
    let category_id = services::detect_category(name, &categories);

    let row = repo::add_ingredient(&state.db, id, name, quantity, unit, category_id)
        .await
        .map_err(|e| ApiError::internal("Failed to add ingredient", e))?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state))]
pub async fn remove_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    ensure_owned(&state, user_id, id).await?;
    let removed = repo::delete_ingredient(&state.db, id, item_id)
        .await
        .map_err(|e| ApiError::internal("Failed to remove ingredient", e))?;
    no_content_or_404(removed, "Ingredient not found")
}

#[instrument(skip(state, body))]
pub async fn add_step(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<NewStepRequest>,
) -> ApiResult<(StatusCode, Json<RecipeStep>)> {
    let instruction = body.instruction.trim();
    if instruction.is_empty() {
        return Err(ApiError::bad_request("Please enter step description"));
    }
    ensure_owned(&state, user_id, id).await?;
    let existing = repo::steps(&state.db, id)
        .await
        .map_err(|e| ApiError::internal("Failed to add step", e))?;
    let step = repo::add_step(&state.db, id, services::next_step_number(&existing), instruction)
        .await
        .map_err(|e| ApiError::internal("Failed to add step", e))?;
    Ok((StatusCode::CREATED, Json(step)))
}

#[instrument(skip(state))]
pub async fn remove_step(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    ensure_owned(&state, user_id, id).await?;
    let removed = repo::delete_step(&state.db, id, item_id)
        .await
        .map_err(|e| ApiError::internal("Failed to remove step", e))?;
    no_content_or_404(removed, "Step not found")
}

#[instrument(skip(state, body))]
pub async fn add_tag(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<NewTagRequest>,
) -> ApiResult<(StatusCode, Json<RecipeTag>)> {
    let tag = body.tag_name.trim();
    if tag.is_empty() {
        return Err(ApiError::bad_request("Please enter a tag"));
    }
    ensure_owned(&state, user_id, id).await?;
    let row = repo::add_tag(&state.db, id, tag)
        .await
        .map_err(|e| ApiError::internal("Failed to add tag", e))?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state))]
pub async fn remove_tag(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    ensure_owned(&state, user_id, id).await?;
    let removed = repo::delete_tag(&state.db, id, item_id)
        .await
        .map_err(|e| ApiError::internal("Failed to remove tag", e))?;
    no_content_or_404(removed, "Tag not found")
}

#[instrument(skip(state))]
pub async fn list_recipe_categories(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> ApiResult<Json<Vec<Category>>> {
    let rows = repo::recipe_categories(&state.db)
        .await
        .map_err(|e| ApiError::internal("Failed to load categories", e))?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn list_ingredient_categories(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> ApiResult<Json<Vec<Category>>> {
    let rows = repo::ingredient_categories(&state.db)
        .await
        .map_err(|e| ApiError::internal("Failed to load categories", e))?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn ingredient_suggestions(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> ApiResult<Json<Vec<String>>> {
    let known = repo::ingredient_names(&state.db)
        .await
        .map_err(|e| ApiError::internal("Failed to load ingredients", e))?;
    Ok(Json(services::merge_suggestions(known)))
}

async fn ensure_owned(state: &AppState, user_id: Uuid, recipe_id: Uuid) -> ApiResult<()> {
    let recipe = repo::get(&state.db, recipe_id)
        .await
        .map_err(|e| ApiError::internal("Failed to load recipe", e))?;
    if services::require_owned(recipe, user_id).is_none() {
        warn!(%user_id, %recipe_id, "recipe not owned by caller");
        return Err(ApiError::not_found("Recipe not found"));
    }
    Ok(())
}

fn no_content_or_404(removed: bool, msg: &str) -> ApiResult<StatusCode> {
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(msg))
    }
}
