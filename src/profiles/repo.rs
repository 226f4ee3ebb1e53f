use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::dto::ProfileUpdate;
use super::repo_types::Profile;

pub async fn get(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(
        r#"
        SELECT id, first_name, last_name, diet_type, calorie_goal, allergies, updated_at
          FROM profiles
         WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("select profile")?;
    Ok(profile)
}

/// Inserts the default profile row for a freshly registered user.
pub async fn create_empty_tx(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO profiles (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .context("insert profile")?;
    Ok(())
}

pub async fn upsert(db: &PgPool, user_id: Uuid, update: &ProfileUpdate) -> anyhow::Result<Profile> {
    let profile = sqlx::query_as::<_, Profile>(
        r#"
        INSERT INTO profiles (id, first_name, last_name, diet_type, calorie_goal, allergies, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, now())
        ON CONFLICT (id) DO UPDATE
           SET first_name = EXCLUDED.first_name,
               last_name = EXCLUDED.last_name,
               diet_type = EXCLUDED.diet_type,
               calorie_goal = EXCLUDED.calorie_goal,
               allergies = EXCLUDED.allergies,
               updated_at = now()
        RETURNING id, first_name, last_name, diet_type, calorie_goal, allergies, updated_at
        "#,
    )
    .bind(user_id)
    .bind(&update.first_name)
    .bind(&update.last_name)
    .bind(&update.diet_type)
    .bind(update.calorie_goal)
    .bind(&update.allergies)
    .fetch_one(db)
    .await
    .context("upsert profile")?;
    Ok(profile)
}
