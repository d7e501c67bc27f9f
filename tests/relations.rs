//! Favorite and cart edges, and the viewer flags derived from them.

mod support;

use foodgram::{
    actions::{add_relation, annotate_recipes, create_recipe, remove_relation, RelationKind},
    permissions::Viewer,
    schema::Uuid,
    Error, RecipeLimits,
};
use sqlx::PgPool;
use support::{count, create_ingredient, create_tag, create_user, payload};

async fn seed_recipes(pool: &PgPool, n: usize) -> Vec<Uuid> {
    let author = create_user(pool, "author").await;
    let tag = create_tag(pool, "lunch").await;
    let flour = create_ingredient(pool, "flour", "g").await;

    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        let recipe = create_recipe(
            &author,
            payload(&format!("Recipe {i}"), &[tag.id], &[(flour.id, 100)]),
            &RecipeLimits::default(),
            pool,
        )
        .await
        .unwrap();
        ids.push(recipe.id);
    }
    ids
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn favorite_twice_then_remove_twice(pool: PgPool) {
    let recipe = seed_recipes(&pool, 1).await[0];
    let fan = create_user(&pool, "fan").await;

    let short = add_relation(RelationKind::Favorite, fan.user_id, recipe, &pool)
        .await
        .unwrap();
    assert_eq!(short.id, recipe);

    let again = add_relation(RelationKind::Favorite, fan.user_id, recipe, &pool).await;
    assert!(matches!(again, Err(Error::AlreadyExists(_))));

    remove_relation(RelationKind::Favorite, fan.user_id, recipe, &pool)
        .await
        .unwrap();
    let again = remove_relation(RelationKind::Favorite, fan.user_id, recipe, &pool).await;
    assert!(matches!(again, Err(Error::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn missing_recipe_is_not_found(pool: PgPool) {
    let fan = create_user(&pool, "fan").await;

    let result = add_relation(RelationKind::ShoppingCart, fan.user_id, 4242, &pool).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn concurrent_duplicate_adds_leave_one_row(pool: PgPool) {
    let recipe = seed_recipes(&pool, 1).await[0];
    let fan = create_user(&pool, "fan").await;

    let (a, b) = tokio::join!(
        add_relation(RelationKind::Favorite, fan.user_id, recipe, &pool),
        add_relation(RelationKind::Favorite, fan.user_id, recipe, &pool),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(Error::AlreadyExists(_)))));
    assert_eq!(count(&pool, "favorites").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn flags_follow_viewer(pool: PgPool) {
    let recipes = seed_recipes(&pool, 3).await;
    let fan = create_user(&pool, "fan").await;
    add_relation(RelationKind::Favorite, fan.user_id, recipes[0], &pool)
        .await
        .unwrap();
    add_relation(RelationKind::ShoppingCart, fan.user_id, recipes[2], &pool)
        .await
        .unwrap();

    let none = annotate_recipes(Viewer::from(&fan), &[], &pool).await.unwrap();
    assert!(!none.is_favorited(recipes[0]));

    let one = annotate_recipes(Viewer::from(&fan), &recipes[..1], &pool)
        .await
        .unwrap();
    assert!(one.is_favorited(recipes[0]));
    assert!(!one.is_in_shopping_cart(recipes[0]));

    let many = annotate_recipes(Viewer::from(&fan), &recipes, &pool)
        .await
        .unwrap();
    assert_eq!(
        recipes
            .iter()
            .map(|id| (many.is_favorited(*id), many.is_in_shopping_cart(*id)))
            .collect::<Vec<_>>(),
        vec![(true, false), (false, false), (false, true)]
    );

    let anonymous = annotate_recipes(Viewer::Anonymous, &recipes, &pool)
        .await
        .unwrap();
    assert!(recipes
        .iter()
        .all(|id| !anonymous.is_favorited(*id) && !anonymous.is_in_shopping_cart(*id)));
}
