use std::collections::HashMap;

use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, Result},
    schema::{Ingredient, IngredientLineView, RecipeIngredientRow, Uuid},
};

/// `LIKE` pattern matching names that start with `search`, with the
/// wildcard characters of the input escaped.
pub fn prefix_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 1);
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub async fn list_ingredients(
    search: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>> {
    let list: Vec<Ingredient> = match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(search) => {
            log::trace!("> Searching ingredients {search:?}");
            sqlx::query_as("SELECT * FROM ingredients WHERE LOWER(name) LIKE LOWER($1) ORDER BY name")
                .bind(prefix_pattern(search))
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query_as("SELECT * FROM ingredients ORDER BY name")
                .fetch_all(pool)
                .await?
        }
    };

    Ok(list)
}

pub async fn get_ingredient(id: Uuid, pool: &Pool<Postgres>) -> Result<Ingredient> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.ok_or_else(|| Error::not_found("Ingredient"))
}

/// Ingredient lines of every recipe in `recipe_ids`, keyed by recipe.
pub async fn list_recipe_ingredients(
    recipe_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<HashMap<Uuid, Vec<IngredientLineView>>> {
    if recipe_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<RecipeIngredientRow> = sqlx::query_as("
        SELECT ri.recipe_id AS recipe_id, i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY i.name
    ")
    .bind(recipe_ids)
    .fetch_all(pool)
    .await?;

    let mut map: HashMap<Uuid, Vec<IngredientLineView>> = HashMap::new();
    for row in rows {
        map.entry(row.recipe_id).or_default().push(row.into());
    }
    Ok(map)
}

/// Ingredient ids from `ids` that have no row.
pub async fn find_missing_ingredients(ids: &[Uuid], pool: &Pool<Postgres>) -> Result<Vec<Uuid>> {
    let found: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(super::missing_ids(ids, &found))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_pattern_appends_wildcard() {
        assert_eq!(prefix_pattern("flo"), "flo%");
    }

    #[test]
    fn prefix_pattern_escapes_wildcards() {
        assert_eq!(prefix_pattern("50%_off"), "50\\%\\_off%");
        assert_eq!(prefix_pattern("a\\b"), "a\\\\b%");
    }
}
