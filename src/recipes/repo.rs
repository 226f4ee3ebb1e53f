use anyhow::Context;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use super::dto::RecipeInput;
use super::repo_types::{Category, Recipe, RecipeChoice, RecipeIngredient, RecipeStep, RecipeTag};
use super::services::{NewIngredient, RecipeCopy, RecipeFilter};

const RECIPE_COLUMNS: &str = r#"
    id, user_id, title, description, image_url, prep_time, cook_time, servings,
    calories_per_serving, category_id, is_public, created_at, updated_at
"#;

// ---- Recipes ----

pub async fn list(db: &PgPool, user_id: Uuid, filter: &RecipeFilter) -> anyhow::Result<Vec<Recipe>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE "));
    if filter.mine {
        qb.push("user_id = ").push_bind(user_id);
    } else {
        qb.push("is_public = TRUE AND (user_id IS NULL OR user_id <> ")
            .push_bind(user_id)
            .push(")");
    }
    if let Some(pattern) = &filter.title_pattern {
        qb.push(" AND title ILIKE ").push_bind(pattern.clone());
    }
    if let Some(max) = filter.max_calories {
        qb.push(" AND calories_per_serving <= ").push_bind(max);
    }
    if let Some(max) = filter.max_prep_time {
        qb.push(" AND prep_time <= ").push_bind(max);
    }
    if let Some(servings) = filter.servings {
        qb.push(" AND servings = ").push_bind(servings);
    }
    qb.push(" ORDER BY title");

    let rows = qb
        .build_query_as::<Recipe>()
        .fetch_all(db)
        .await
        .context("list recipes")?;
    Ok(rows)
}

/// Public or own recipes as id/title pairs, for picking a meal.
pub async fn choices(
    db: &PgPool,
    user_id: Uuid,
    title_pattern: Option<&str>,
) -> anyhow::Result<Vec<RecipeChoice>> {
    let rows = sqlx::query_as::<_, RecipeChoice>(
        r#"
        SELECT id, title
          FROM recipes
         WHERE (is_public = TRUE OR user_id = $1)
           AND ($2::text IS NULL OR title ILIKE $2)
         ORDER BY title
        "#,
    )
    .bind(user_id)
    .bind(title_pattern)
    .fetch_all(db)
    .await
    .context("list recipe choices")?;
    Ok(rows)
}

pub async fn get(db: &PgPool, recipe_id: Uuid) -> anyhow::Result<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"
    ))
    .bind(recipe_id)
    .fetch_optional(db)
    .await
    .context("select recipe")?;
    Ok(recipe)
}

pub async fn create(db: &PgPool, user_id: Uuid, input: &RecipeInput) -> anyhow::Result<Recipe> {
    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        r#"
        INSERT INTO recipes (user_id, title, description, image_url, prep_time, cook_time,
                             servings, calories_per_serving, category_id, is_public)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {RECIPE_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.image_url)
    .bind(input.prep_time)
    .bind(input.cook_time)
    .bind(input.servings)
    .bind(input.calories_per_serving)
    .bind(input.category_id)
    .bind(input.is_public)
    .fetch_one(db)
    .await
    .context("insert recipe")?;
    Ok(recipe)
}

/// Updates a recipe owned by `user_id`; `None` when there is no such recipe.
pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    recipe_id: Uuid,
    input: &RecipeInput,
) -> anyhow::Result<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        r#"
        UPDATE recipes
           SET title = $3, description = $4, image_url = $5, prep_time = $6, cook_time = $7,
               servings = $8, calories_per_serving = $9, category_id = $10, is_public = $11,
               updated_at = now()
         WHERE id = $1 AND user_id = $2
        RETURNING {RECIPE_COLUMNS}
        "#
    ))
    .bind(recipe_id)
    .bind(user_id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.image_url)
    .bind(input.prep_time)
    .bind(input.cook_time)
    .bind(input.servings)
    .bind(input.calories_per_serving)
    .bind(input.category_id)
    .bind(input.is_public)
    .fetch_optional(db)
    .await
    .context("update recipe")?;
    Ok(recipe)
}

/// Deletes an owned recipe together with its ingredients, steps and tags.
pub async fn delete(db: &PgPool, user_id: Uuid, recipe_id: Uuid) -> anyhow::Result<bool> {
    let mut tx = db.begin().await.context("begin tx")?;
    let owned: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM recipes WHERE id = $1 AND user_id = $2 FOR UPDATE")
            .bind(recipe_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .context("lock recipe")?;
    if owned.is_none() {
        return Ok(false);
    }
    for table in ["recipe_ingredients", "recipe_steps", "recipe_tags"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE recipe_id = $1"))
            .bind(recipe_id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("delete from {table}"))?;
    }
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await
        .context("delete recipe")?;
    tx.commit().await.context("commit tx")?;
    Ok(true)
}

/// Inserts a prepared copy for `user_id`, children included, in one transaction.
pub async fn copy(db: &PgPool, user_id: Uuid, copy: &RecipeCopy) -> anyhow::Result<Recipe> {
    let mut tx = db.begin().await.context("begin tx")?;
    let input = &copy.input;
    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        r#"
        INSERT INTO recipes (user_id, title, description, image_url, prep_time, cook_time,
                             servings, calories_per_serving, category_id, is_public)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {RECIPE_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.image_url)
    .bind(input.prep_time)
    .bind(input.cook_time)
    .bind(input.servings)
    .bind(input.calories_per_serving)
    .bind(input.category_id)
    .bind(input.is_public)
    .fetch_one(&mut *tx)
    .await
    .context("insert recipe copy")?;

    for i in &copy.ingredients {
        insert_ingredient_tx(&mut tx, recipe.id, i).await?;
    }
    for s in &copy.steps {
        sqlx::query("INSERT INTO recipe_steps (recipe_id, step_number, instruction) VALUES ($1, $2, $3)")
            .bind(recipe.id)
            .bind(s.step_number)
            .bind(&s.instruction)
            .execute(&mut *tx)
            .await
            .context("copy step")?;
    }
    for tag in &copy.tags {
        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_name) VALUES ($1, $2)")
            .bind(recipe.id)
            .bind(tag)
            .execute(&mut *tx)
            .await
            .context("copy tag")?;
    }
    tx.commit().await.context("commit tx")?;
    Ok(recipe)
}

// ---- Ingredients ----

pub async fn ingredients(db: &PgPool, recipe_id: Uuid) -> anyhow::Result<Vec<RecipeIngredient>> {
    let rows = sqlx::query_as::<_, RecipeIngredient>(
        r#"
        SELECT i.id, i.recipe_id, i.ingredient_name, i.quantity, i.unit,
               i.category_id, c.name AS category_name
          FROM recipe_ingredients i
          LEFT JOIN ingredient_categories c ON c.id = i.category_id
         WHERE i.recipe_id = $1
         ORDER BY i.created_at ASC
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await
    .context("list recipe ingredients")?;
    Ok(rows)
}

async fn insert_ingredient_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    ingredient: &NewIngredient,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO recipe_ingredients (recipe_id, ingredient_name, quantity, unit, category_id)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(recipe_id)
    .bind(&ingredient.ingredient_name)
    .bind(ingredient.quantity)
    .bind(&ingredient.unit)
    .bind(ingredient.category_id)
    .execute(&mut **tx)
    .await
    .context("insert ingredient")?;
    Ok(())
}

pub async fn add_ingredient(
    db: &PgPool,
    recipe_id: Uuid,
    name: &str,
    quantity: f64,
    unit: &str,
    category_id: Option<Uuid>,
) -> anyhow::Result<RecipeIngredient> {
    let row = sqlx::query_as::<_, RecipeIngredient>(
        r#"
        WITH i AS (
            INSERT INTO recipe_ingredients (recipe_id, ingredient_name, quantity, unit, category_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, recipe_id, ingredient_name, quantity, unit, category_id
        )
        SELECT i.id, i.recipe_id, i.ingredient_name, i.quantity, i.unit,
               i.category_id, c.name AS category_name
          FROM i
          LEFT JOIN ingredient_categories c ON c.id = i.category_id
        "#,
    )
    .bind(recipe_id)
    .bind(name)
    .bind(quantity)
    .bind(unit)
    .bind(category_id)
    .fetch_one(db)
    .await
    .context("insert ingredient")?;
    Ok(row)
}

pub async fn delete_ingredient(db: &PgPool, recipe_id: Uuid, ingredient_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM recipe_ingredients WHERE id = $1 AND recipe_id = $2")
        .bind(ingredient_id)
        .bind(recipe_id)
        .execute(db)
        .await
        .context("delete ingredient")?;
    Ok(res.rows_affected() > 0)
}

/// Every ingredient name used by any recipe, distinct and sorted.
pub async fn ingredient_names(db: &PgPool) -> anyhow::Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT ingredient_name FROM recipe_ingredients ORDER BY ingredient_name",
    )
    .fetch_all(db)
    .await
    .context("list ingredient names")?;
    Ok(rows.into_iter().map(|(n,)| n).collect())
}

// ---- Steps ----

pub async fn steps(db: &PgPool, recipe_id: Uuid) -> anyhow::Result<Vec<RecipeStep>> {
    let rows = sqlx::query_as::<_, RecipeStep>(
        r#"
        SELECT id, recipe_id, step_number, instruction
          FROM recipe_steps
         WHERE recipe_id = $1
         ORDER BY step_number ASC
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await
    .context("list recipe steps")?;
    Ok(rows)
}

pub async fn add_step(
    db: &PgPool,
    recipe_id: Uuid,
    step_number: i32,
    instruction: &str,
) -> anyhow::Result<RecipeStep> {
    let row = sqlx::query_as::<_, RecipeStep>(
        r#"
        INSERT INTO recipe_steps (recipe_id, step_number, instruction)
        VALUES ($1, $2, $3)
        RETURNING id, recipe_id, step_number, instruction
        "#,
    )
    .bind(recipe_id)
    .bind(step_number)
    .bind(instruction)
    .fetch_one(db)
    .await
    .context("insert step")?;
    Ok(row)
}

pub async fn delete_step(db: &PgPool, recipe_id: Uuid, step_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM recipe_steps WHERE id = $1 AND recipe_id = $2")
        .bind(step_id)
        .bind(recipe_id)
        .execute(db)
        .await
        .context("delete step")?;
    Ok(res.rows_affected() > 0)
}

// ---- Tags ----

pub async fn tags(db: &PgPool, recipe_id: Uuid) -> anyhow::Result<Vec<RecipeTag>> {
    let rows = sqlx::query_as::<_, RecipeTag>(
        "SELECT id, recipe_id, tag_name FROM recipe_tags WHERE recipe_id = $1 ORDER BY tag_name",
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await
    .context("list recipe tags")?;
    Ok(rows)
}

pub async fn add_tag(db: &PgPool, recipe_id: Uuid, tag_name: &str) -> anyhow::Result<RecipeTag> {
    let row = sqlx::query_as::<_, RecipeTag>(
        r#"
        INSERT INTO recipe_tags (recipe_id, tag_name)
        VALUES ($1, $2)
        RETURNING id, recipe_id, tag_name
        "#,
    )
    .bind(recipe_id)
    .bind(tag_name)
    .fetch_one(db)
    .await
    .context("insert tag")?;
    Ok(row)
}

pub async fn delete_tag(db: &PgPool, recipe_id: Uuid, tag_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM recipe_tags WHERE id = $1 AND recipe_id = $2")
        .bind(tag_id)
        .bind(recipe_id)
        .execute(db)
        .await
        .context("delete tag")?;
    Ok(res.rows_affected() > 0)
}

// ---- Lookups ----

pub async fn recipe_categories(db: &PgPool) -> anyhow::Result<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>("SELECT id, name FROM recipe_categories ORDER BY name")
        .fetch_all(db)
        .await
        .context("list recipe categories")?;
    Ok(rows)
}

pub async fn ingredient_categories(db: &PgPool) -> anyhow::Result<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>("SELECT id, name FROM ingredient_categories ORDER BY name")
        .fetch_all(db)
        .await
        .context("list ingredient categories")?;
    Ok(rows)
}
