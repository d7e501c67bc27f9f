//! Viewer-relative flags computed per request.
//!
//! Each function answers one membership question for a whole batch of ids
//! with a single `= ANY($2)` query, so list endpoints cost a fixed number of
//! round trips regardless of page size. An anonymous viewer never touches
//! storage; storage errors are returned to the caller rather than folded into
//! `false`.

use std::collections::HashSet;

use sqlx::{Pool, Postgres};

use super::relations::RelationKind;
use crate::{error::Result, permissions::Viewer, schema::Uuid};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecipeFlags {
    favorited: HashSet<Uuid>,
    in_shopping_cart: HashSet<Uuid>,
}

impl RecipeFlags {
    pub fn is_favorited(&self, recipe_id: Uuid) -> bool {
        self.favorited.contains(&recipe_id)
    }

    pub fn is_in_shopping_cart(&self, recipe_id: Uuid) -> bool {
        self.in_shopping_cart.contains(&recipe_id)
    }
}

pub async fn annotate_recipes(
    viewer: Viewer,
    recipe_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<RecipeFlags> {
    let Some(user_id) = viewer.id() else {
        return Ok(RecipeFlags::default());
    };
    if recipe_ids.is_empty() {
        return Ok(RecipeFlags::default());
    }

    Ok(RecipeFlags {
        favorited: related_recipe_ids(RelationKind::Favorite, user_id, recipe_ids, pool).await?,
        in_shopping_cart: related_recipe_ids(
            RelationKind::ShoppingCart,
            user_id,
            recipe_ids,
            pool,
        )
        .await?,
    })
}

/// Ids among `author_ids` the viewer is subscribed to.
pub async fn annotate_authors(
    viewer: Viewer,
    author_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<HashSet<Uuid>> {
    let Some(user_id) = viewer.id() else {
        return Ok(HashSet::new());
    };
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let ids: Vec<Uuid> = sqlx::query_scalar(
        "SELECT author_id FROM subscriptions WHERE user_id = $1 AND author_id = ANY($2)",
    )
    .bind(user_id)
    .bind(author_ids)
    .fetch_all(pool)
    .await?;

    Ok(ids.into_iter().collect())
}

async fn related_recipe_ids(
    kind: RelationKind,
    user_id: Uuid,
    recipe_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<HashSet<Uuid>> {
    let sql = format!(
        "SELECT recipe_id FROM {} WHERE user_id = $1 AND recipe_id = ANY($2)",
        kind.table()
    );
    let ids: Vec<Uuid> = sqlx::query_scalar(&sql)
        .bind(user_id)
        .bind(recipe_ids)
        .fetch_all(pool)
        .await?;

    Ok(ids.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    fn unreachable_pool() -> Pool<Postgres> {
        PgPoolOptions::new()
            .connect_lazy("postgres://foodgram@127.0.0.1:1/unreachable")
            .unwrap()
    }

    #[tokio::test]
    async fn anonymous_viewer_never_queries() {
        let pool = unreachable_pool();

        let flags = annotate_recipes(Viewer::Anonymous, &[1, 2, 3], &pool)
            .await
            .unwrap();
        for id in [1, 2, 3] {
            assert!(!flags.is_favorited(id));
            assert!(!flags.is_in_shopping_cart(id));
        }

        let followed = annotate_authors(Viewer::Anonymous, &[1, 2], &pool)
            .await
            .unwrap();
        assert!(followed.is_empty());
    }

    #[tokio::test]
    async fn empty_batch_never_queries() {
        let pool = unreachable_pool();

        let flags = annotate_recipes(Viewer::User(1), &[], &pool).await.unwrap();
        assert_eq!(flags, RecipeFlags::default());
        assert!(annotate_authors(Viewer::User(1), &[], &pool)
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn flags_reflect_membership() {
        let flags = RecipeFlags {
            favorited: HashSet::from([1, 2]),
            in_shopping_cart: HashSet::from([2]),
        };

        assert!(flags.is_favorited(1));
        assert!(!flags.is_in_shopping_cart(1));
        assert!(flags.is_favorited(2) && flags.is_in_shopping_cart(2));
        assert!(!flags.is_favorited(3));
    }
}
