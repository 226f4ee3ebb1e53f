use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::profiles::repo as profiles_repo;

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
        .context("select user by email")?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, email, password_hash, created_at FROM users WHERE id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("select user by id")?;
        Ok(user)
    }

    /// Create a new user with hashed password and an empty profile.
    pub async fn create(db: &PgPool, email: &str, password_hash: &str) -> anyhow::Result<User> {
        let mut tx = db.begin().await.context("begin tx")?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .context("insert user")?;
        profiles_repo::create_empty_tx(&mut tx, user.id).await?;
        tx.commit().await.context("commit tx")?;
        Ok(user)
    }

    pub async fn update_password(db: &PgPool, user_id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(db)
            .await
            .context("update password")?;
        Ok(())
    }
}

/// True when `err` wraps a Postgres unique-constraint violation, e.g. a second
/// registration racing on `users.email`.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db)) if db.is_unique_violation()
    )
}
