use std::collections::HashMap;

use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, Result},
    schema::{LinkedRecipeTag, Tag, Uuid},
};

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Tag> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    tag.ok_or_else(|| Error::not_found("Tag"))
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(list)
}

/// Tags of every recipe in `recipe_ids`, keyed by recipe.
pub async fn list_recipe_tags(
    recipe_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<HashMap<Uuid, Vec<Tag>>> {
    if recipe_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<LinkedRecipeTag> = sqlx::query_as(
        "
        SELECT rt.recipe_id AS recipe_id, t.id AS id, t.name AS name, t.slug AS slug, t.color AS color
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = ANY($1)
        ORDER BY t.name
    ",
    )
    .bind(recipe_ids)
    .fetch_all(pool)
    .await?;

    let mut map: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for row in rows {
        map.entry(row.recipe_id).or_default().push(row.tag);
    }
    Ok(map)
}

/// Tag ids from `ids` that have no row.
pub async fn find_missing_tags(ids: &[Uuid], pool: &Pool<Postgres>) -> Result<Vec<Uuid>> {
    let found: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(super::missing_ids(ids, &found))
}
