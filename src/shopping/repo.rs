use anyhow::Context;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::repo_types::{NewShoppingItem, ShoppingList, ShoppingListItem, MANUAL_LIST_NAME};

const ITEM_COLUMNS: &str =
    "i.id, i.shopping_list_id, i.product_name, i.quantity, i.unit, i.is_purchased, i.created_at";

/// The user's list with no meal plan attached, created on first use.
pub async fn manual_list(db: &PgPool, user_id: Uuid) -> anyhow::Result<ShoppingList> {
    sqlx::query(
        r#"
        INSERT INTO shopping_lists (user_id, meal_plan_id, name)
        VALUES ($1, NULL, $2)
        ON CONFLICT (user_id) WHERE meal_plan_id IS NULL DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(MANUAL_LIST_NAME)
    .execute(db)
    .await
    .context("ensure manual shopping list")?;

    let list = sqlx::query_as::<_, ShoppingList>(
        r#"
        SELECT id, user_id, meal_plan_id, name
          FROM shopping_lists
         WHERE user_id = $1 AND meal_plan_id IS NULL
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await
    .context("select manual shopping list")?;
    Ok(list)
}

pub async fn list_items(db: &PgPool, list_id: Uuid) -> anyhow::Result<Vec<ShoppingListItem>> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM shopping_list_items i \
          WHERE i.shopping_list_id = $1 \
          ORDER BY i.created_at ASC, i.id ASC"
    );
    let rows = sqlx::query_as::<_, ShoppingListItem>(&sql)
        .bind(list_id)
        .fetch_all(db)
        .await
        .context("select shopping list items")?;
    Ok(rows)
}

/// Appends `items` unpurchased in a single statement.
pub async fn append_items(
    db: &PgPool,
    list_id: Uuid,
    items: &[NewShoppingItem],
) -> anyhow::Result<Vec<ShoppingListItem>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO shopping_list_items (shopping_list_id, product_name, quantity, unit, is_purchased) ",
    );
    qb.push_values(items, |mut b, item| {
        b.push_bind(list_id)
            .push_bind(&item.product_name)
            .push_bind(item.quantity)
            .push_bind(&item.unit)
            .push_bind(false);
    });
    qb.push(" RETURNING id, shopping_list_id, product_name, quantity, unit, is_purchased, created_at");

    let rows = qb
        .build_query_as::<ShoppingListItem>()
        .fetch_all(db)
        .await
        .context("insert shopping list items")?;
    Ok(rows)
}

/// Flips `is_purchased` on an item of one of the user's lists.
pub async fn toggle_item(
    db: &PgPool,
    user_id: Uuid,
    item_id: Uuid,
) -> anyhow::Result<Option<ShoppingListItem>> {
    let item = sqlx::query_as::<_, ShoppingListItem>(
        r#"
        UPDATE shopping_list_items i
           SET is_purchased = NOT i.is_purchased
          FROM shopping_lists l
         WHERE i.id = $1
           AND l.id = i.shopping_list_id
           AND l.user_id = $2
        RETURNING i.id, i.shopping_list_id, i.product_name, i.quantity, i.unit,
                  i.is_purchased, i.created_at
        "#,
    )
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("toggle shopping list item")?;
    Ok(item)
}

pub async fn delete_item(db: &PgPool, user_id: Uuid, item_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        DELETE FROM shopping_list_items i
         USING shopping_lists l
         WHERE i.id = $1
           AND l.id = i.shopping_list_id
           AND l.user_id = $2
        "#,
    )
    .bind(item_id)
    .bind(user_id)
    .execute(db)
    .await
    .context("delete shopping list item")?;
    Ok(res.rows_affected() > 0)
}
