use anyhow::Context;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use super::repo_types::{MealPlan, MealPlanEntry, MealType};

const ENTRY_COLUMNS: &str = r#"
    e.id, e.meal_plan_id, e.meal_date, e.meal_type, e.recipe_id,
    r.title AS recipe_title, e.servings
"#;

/// Most recently started plan of the user, if any.
pub async fn latest_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<MealPlan>> {
    let plan = sqlx::query_as::<_, MealPlan>(
        r#"
        SELECT id, user_id, name, start_date, end_date, created_at
          FROM meal_plans
         WHERE user_id = $1
         ORDER BY start_date DESC
         LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("select latest meal plan")?;
    Ok(plan)
}

pub async fn get_for_user(
    db: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
) -> anyhow::Result<Option<MealPlan>> {
    let plan = sqlx::query_as::<_, MealPlan>(
        r#"
        SELECT id, user_id, name, start_date, end_date, created_at
          FROM meal_plans
         WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(plan_id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("select meal plan")?;
    Ok(plan)
}

/// First plan of the user starting on or after `from`.
pub async fn find_starting_from(
    db: &PgPool,
    user_id: Uuid,
    from: Date,
) -> anyhow::Result<Option<MealPlan>> {
    let plan = sqlx::query_as::<_, MealPlan>(
        r#"
        SELECT id, user_id, name, start_date, end_date, created_at
          FROM meal_plans
         WHERE user_id = $1 AND start_date >= $2
         ORDER BY start_date ASC
         LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(from)
    .fetch_optional(db)
    .await
    .context("select weekly meal plan")?;
    Ok(plan)
}

pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    start_date: Date,
    end_date: Date,
) -> anyhow::Result<MealPlan> {
    let plan = sqlx::query_as::<_, MealPlan>(
        r#"
        INSERT INTO meal_plans (user_id, name, start_date, end_date)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, name, start_date, end_date, created_at
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(db)
    .await
    .context("insert meal plan")?;
    Ok(plan)
}

/// Entries of `plan` dated within its `[start_date, end_date]` window.
pub async fn entries_in_range(db: &PgPool, plan: &MealPlan) -> anyhow::Result<Vec<MealPlanEntry>> {
    let sql = format!(
        r#"
        SELECT {ENTRY_COLUMNS}
          FROM meal_plan_entries e
          LEFT JOIN recipes r ON r.id = e.recipe_id
         WHERE e.meal_plan_id = $1
           AND e.meal_date >= $2
           AND e.meal_date <= $3
         ORDER BY e.meal_date ASC, e.created_at ASC
        "#
    );
    let rows = sqlx::query_as::<_, MealPlanEntry>(&sql)
        .bind(plan.id)
        .bind(plan.start_date)
        .bind(plan.end_date)
        .fetch_all(db)
        .await
        .context("select meal plan entries")?;
    Ok(rows)
}

/// Entries dated `day` across all plans of the user.
pub async fn entries_on_date(
    db: &PgPool,
    user_id: Uuid,
    day: Date,
) -> anyhow::Result<Vec<MealPlanEntry>> {
    let sql = format!(
        r#"
        SELECT {ENTRY_COLUMNS}
          FROM meal_plan_entries e
          JOIN meal_plans p ON p.id = e.meal_plan_id
          LEFT JOIN recipes r ON r.id = e.recipe_id
         WHERE p.user_id = $1 AND e.meal_date = $2
         ORDER BY e.created_at ASC
        "#
    );
    let rows = sqlx::query_as::<_, MealPlanEntry>(&sql)
        .bind(user_id)
        .bind(day)
        .fetch_all(db)
        .await
        .context("select entries for date")?;
    Ok(rows)
}

pub async fn insert_entry(
    db: &PgPool,
    plan_id: Uuid,
    meal_date: Date,
    meal_type: MealType,
    recipe_id: Uuid,
    servings: i32,
) -> anyhow::Result<MealPlanEntry> {
    let sql = format!(
        r#"
        WITH e AS (
            INSERT INTO meal_plan_entries (meal_plan_id, meal_date, meal_type, recipe_id, servings)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, meal_plan_id, meal_date, meal_type, recipe_id, servings, created_at
        )
        SELECT {ENTRY_COLUMNS}
          FROM e
          LEFT JOIN recipes r ON r.id = e.recipe_id
        "#
    );
    let entry = sqlx::query_as::<_, MealPlanEntry>(&sql)
        .bind(plan_id)
        .bind(meal_date)
        .bind(meal_type.as_str())
        .bind(recipe_id)
        .bind(servings)
        .fetch_one(db)
        .await
        .context("insert meal plan entry")?;
    Ok(entry)
}

/// Deletes an entry belonging to one of the user's plans. Returns whether a row went away.
pub async fn delete_entry(db: &PgPool, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        DELETE FROM meal_plan_entries e
         USING meal_plans p
         WHERE e.id = $1
           AND p.id = e.meal_plan_id
           AND p.user_id = $2
        "#,
    )
    .bind(entry_id)
    .bind(user_id)
    .execute(db)
    .await
    .context("delete meal plan entry")?;
    Ok(res.rows_affected() > 0)
}
