use std::collections::HashMap;

use sqlx::{Pool, Postgres};

use super::users::get_user_by_id;
use crate::{
    error::{Error, Result},
    pagination::{Page, PageRequest},
    schema::{AuthorRecipeShort, RecipeShort, SubscriptionRow, SubscriptionView, User, UserView, Uuid},
};

/// Newest recipes of each author, at most `limit` per author when set.
pub async fn list_recipe_previews(
    author_ids: &[Uuid],
    limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<HashMap<Uuid, Vec<RecipeShort>>> {
    if author_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<AuthorRecipeShort> = sqlx::query_as(
        "
        SELECT author_id, id, name, image, cooking_time
        FROM (
            SELECT r.*, ROW_NUMBER() OVER (PARTITION BY r.author_id ORDER BY r.pub_date DESC, r.id DESC) AS position
            FROM recipes r
            WHERE r.author_id = ANY($1)
        ) ranked
        WHERE $2::BIGINT IS NULL OR position <= $2
        ORDER BY author_id, position
    ",
    )
    .bind(author_ids)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut map: HashMap<Uuid, Vec<RecipeShort>> = HashMap::new();
    for row in rows {
        map.entry(row.author_id).or_default().push(row.recipe);
    }
    Ok(map)
}

async fn count_recipes(author_id: Uuid, pool: &Pool<Postgres>) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

async fn get_author(author_id: Uuid, pool: &Pool<Postgres>) -> Result<User> {
    get_user_by_id(author_id, pool)
        .await?
        .ok_or_else(|| Error::not_found("User"))
}

/// Subscribes `user_id` to `author_id`. Self-subscription is rejected before
/// anything else is looked at.
pub async fn subscribe(
    user_id: Uuid,
    author_id: Uuid,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionView> {
    if user_id == author_id {
        return Err(Error::validation(
            "errors",
            "You cannot subscribe to yourself",
        ));
    }
    let author = get_author(author_id, pool).await?;

    let result = sqlx::query(
        "INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::AlreadyExists(String::from(
            "You are already subscribed to this author",
        )));
    }
    log::info!("User {user_id} subscribed to {author_id}");

    let recipes_count = count_recipes(author_id, pool).await?;
    let mut previews = list_recipe_previews(&[author_id], recipes_limit, pool).await?;

    Ok(SubscriptionView {
        author: UserView::from_user(&author, true),
        recipes_count,
        recipes: previews.remove(&author_id).unwrap_or_default(),
    })
}

pub async fn unsubscribe(user_id: Uuid, author_id: Uuid, pool: &Pool<Postgres>) -> Result<()> {
    get_author(author_id, pool).await?;

    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(String::from(
            "You are not subscribed to this author",
        )));
    }

    log::info!("User {user_id} unsubscribed from {author_id}");
    Ok(())
}

pub async fn fetch_subscriptions(
    user_id: Uuid,
    page: PageRequest,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Page<SubscriptionView>> {
    let rows: Vec<SubscriptionRow> = sqlx::query_as(
        "
        SELECT u.*,
            (SELECT COUNT(*) FROM recipes r WHERE r.author_id = u.id) AS recipes_count,
            COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let author_ids: Vec<Uuid> = rows.iter().map(|row| row.author.id).collect();
    let mut previews = list_recipe_previews(&author_ids, recipes_limit, pool).await?;

    let views = rows
        .into_iter()
        .map(|row| SubscriptionView {
            author: UserView::from_user(&row.author, true),
            recipes_count: row.recipes_count,
            recipes: previews.remove(&row.author.id).unwrap_or_default(),
        })
        .collect();

    Page::from_rows(views, total_count, page)
}
