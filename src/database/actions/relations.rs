use sqlx::{Pool, Postgres};

use super::recipes::get_recipe_row;
use crate::{
    error::{Error, Result},
    schema::{RecipeShort, Uuid},
};

/// Per-user recipe memberships. Both are plain `(user_id, recipe_id)` edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Favorite,
    ShoppingCart,
}

impl RelationKind {
    pub fn table(self) -> &'static str {
        match self {
            RelationKind::Favorite => "favorites",
            RelationKind::ShoppingCart => "shopping_cart",
        }
    }

    fn label(self) -> &'static str {
        match self {
            RelationKind::Favorite => "favorites",
            RelationKind::ShoppingCart => "the shopping cart",
        }
    }
}

/// Adds `recipe_id` to the user's favorites or cart.
///
/// The insert relies on the `(user_id, recipe_id)` primary key, so concurrent
/// duplicates leave exactly one row and every loser gets `AlreadyExists`.
pub async fn add_relation(
    kind: RelationKind,
    user_id: Uuid,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipeShort> {
    let recipe = get_recipe_row(recipe_id, pool)
        .await?
        .ok_or_else(|| Error::not_found("Recipe"))?;

    let sql = format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        kind.table()
    );
    let result = sqlx::query(&sql)
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::AlreadyExists(format!(
            "Recipe is already in {}",
            kind.label()
        )));
    }

    log::info!("User {user_id} added recipe {recipe_id} to {}", kind.table());
    Ok(RecipeShort::from(&recipe))
}

pub async fn remove_relation(
    kind: RelationKind,
    user_id: Uuid,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<()> {
    let sql = format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        kind.table()
    );
    let result = sqlx::query(&sql)
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Recipe is not in {}", kind.label())));
    }

    log::info!("User {user_id} removed recipe {recipe_id} from {}", kind.table());
    Ok(())
}
