use std::collections::{HashMap, HashSet};

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use super::{
    annotations::{annotate_authors, annotate_recipes},
    ingredients::{find_missing_ingredients, list_recipe_ingredients},
    join_ids,
    tags::{find_missing_tags, list_recipe_tags},
    users::list_users_by_ids,
};
use crate::{
    config::RecipeLimits,
    error::{Error, FieldErrors, QueryError, Result},
    jwt::SessionData,
    pagination::{Page, PageRequest},
    permissions::{ActionType, Viewer},
    schema::{IngredientAmount, Recipe, RecipePayload, RecipeRow, RecipeView, UserView, Uuid},
    validation::validate_recipe,
};

/// Filters accepted by the recipe listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Tag slugs; a recipe matches when it carries any of them.
    pub tags: Vec<String>,
    pub author: Option<Uuid>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

pub async fn get_recipe_row(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_recipe(id: Uuid, viewer: Viewer, pool: &Pool<Postgres>) -> Result<RecipeView> {
    let recipe = get_recipe_row(id, pool)
        .await?
        .ok_or_else(|| Error::not_found("Recipe"))?;

    let mut views = build_recipe_views(vec![recipe], viewer, pool).await?;
    views
        .pop()
        .ok_or_else(|| QueryError::new(String::from("Recipe view could not be built")).into())
}

pub async fn fetch_recipes(
    filter: &RecipeFilter,
    page: PageRequest,
    viewer: Viewer,
    pool: &Pool<Postgres>,
) -> Result<Page<RecipeView>> {
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");

    if !filter.tags.is_empty() {
        query
            .push(
                " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id \
                 WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(filter.tags.clone())
            .push("))");
    }
    if let Some(author) = filter.author {
        query.push(" AND r.author_id = ").push_bind(author);
    }
    if let Some(user_id) = viewer.id() {
        if filter.is_favorited {
            query
                .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
        if filter.is_in_shopping_cart {
            query
                .push(" AND EXISTS (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }
    query
        .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows: Vec<RecipeRow> = query.build_query_as().fetch_all(pool).await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let recipes: Vec<Recipe> = rows.into_iter().map(|row| row.recipe).collect();
    let views = build_recipe_views(recipes, viewer, pool).await?;

    Page::from_rows(views, total_count, page)
}

/// Joins recipes with their tags, ingredient lines, authors and the viewer's
/// flags. Every association is loaded with one batched query.
pub async fn build_recipe_views(
    recipes: Vec<Recipe>,
    viewer: Viewer,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeView>> {
    if recipes.is_empty() {
        return Ok(vec![]);
    }

    let recipe_ids: Vec<Uuid> = recipes.iter().map(|recipe| recipe.id).collect();
    let author_ids: Vec<Uuid> = recipes
        .iter()
        .map(|recipe| recipe.author_id)
        .collect::<HashSet<Uuid>>()
        .into_iter()
        .collect();

    let mut tags = list_recipe_tags(&recipe_ids, pool).await?;
    let mut lines = list_recipe_ingredients(&recipe_ids, pool).await?;
    let authors: HashMap<Uuid, _> = list_users_by_ids(&author_ids, pool)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();
    let flags = annotate_recipes(viewer, &recipe_ids, pool).await?;
    let followed = annotate_authors(viewer, &author_ids, pool).await?;

    recipes
        .into_iter()
        .map(|recipe| -> Result<RecipeView> {
            let author = authors.get(&recipe.author_id).ok_or_else(|| {
                QueryError::new(format!("Author of recipe {} is missing", recipe.id))
            })?;

            Ok(RecipeView {
                id: recipe.id,
                tags: tags.remove(&recipe.id).unwrap_or_default(),
                author: UserView::from_user(author, followed.contains(&author.id)),
                ingredients: lines.remove(&recipe.id).unwrap_or_default(),
                is_favorited: flags.is_favorited(recipe.id),
                is_in_shopping_cart: flags.is_in_shopping_cart(recipe.id),
                name: recipe.name,
                image: recipe.image,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
                pub_date: recipe.pub_date,
            })
        })
        .collect()
}

/// Reports tag and ingredient ids that do not exist, keyed by their field.
async fn validate_references(payload: &RecipePayload, pool: &Pool<Postgres>) -> Result<()> {
    let mut errors = FieldErrors::new();

    let missing_tags = find_missing_tags(&payload.tags, pool).await?;
    if !missing_tags.is_empty() {
        errors.add("tags", format!("Unknown tag ids: {}", join_ids(&missing_tags)));
    }

    let ingredient_ids: Vec<Uuid> = payload.ingredients.iter().map(|line| line.id).collect();
    let missing_ingredients = find_missing_ingredients(&ingredient_ids, pool).await?;
    if !missing_ingredients.is_empty() {
        errors.add(
            "ingredients",
            format!("Unknown ingredient ids: {}", join_ids(&missing_ingredients)),
        );
    }

    errors.into_result()
}

/// Replaces the whole tag set of a recipe. Meant to run inside the recipe's
/// write transaction.
pub async fn replace_recipe_tags(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    tags: &[Uuid],
) -> Result<()> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    if !tags.is_empty() {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
        query_builder.push_values(tags, |mut b, tag_id| {
            b.push_bind(recipe_id).push_bind(*tag_id);
        });
        query_builder.build().execute(&mut *conn).await?;
    }

    Ok(())
}

/// Replaces every ingredient line of a recipe. Meant to run inside the
/// recipe's write transaction.
pub async fn replace_recipe_ingredients(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    ingredients: &[IngredientAmount],
) -> Result<()> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    if !ingredients.is_empty() {
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ",
        );
        query_builder.push_values(ingredients, |mut b, line| {
            b.push_bind(recipe_id)
                .push_bind(line.id)
                .push_bind(line.amount);
        });
        query_builder.build().execute(&mut *conn).await?;
    }

    Ok(())
}

/// Validates `payload`, then writes the recipe, its tags and its ingredient
/// lines in one transaction.
pub async fn create_recipe(
    session: &SessionData,
    payload: RecipePayload,
    limits: &RecipeLimits,
    pool: &Pool<Postgres>,
) -> Result<RecipeView> {
    validate_recipe(&payload, limits, true)?;
    validate_references(&payload, pool).await?;

    let mut tr = pool.begin().await?;

    let id: (Uuid,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, text, image, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(session.user_id)
    .bind(payload.name.trim())
    .bind(&payload.text)
    .bind(payload.image.as_deref().unwrap_or_default())
    .bind(payload.cooking_time)
    .fetch_one(&mut *tr)
    .await?;
    let recipe_id = id.0;

    replace_recipe_tags(&mut tr, recipe_id, &payload.tags).await?;
    replace_recipe_ingredients(&mut tr, recipe_id, &payload.ingredients).await?;

    tr.commit().await?;
    log::info!("User {} created recipe {recipe_id}", session.user_id);

    get_recipe(recipe_id, Viewer::from(session), pool).await
}

/// Full replace of a recipe by its author. An omitted image keeps the stored
/// reference.
pub async fn update_recipe(
    recipe_id: Uuid,
    session: &SessionData,
    payload: RecipePayload,
    limits: &RecipeLimits,
    pool: &Pool<Postgres>,
) -> Result<RecipeView> {
    let recipe = get_recipe_row(recipe_id, pool)
        .await?
        .ok_or_else(|| Error::not_found("Recipe"))?;
    session.authorize(ActionType::UpdateRecipe, &recipe)?;

    validate_recipe(&payload, limits, false)?;
    validate_references(&payload, pool).await?;

    let mut tr = pool.begin().await?;

    let updated = sqlx::query(
        "
        UPDATE recipes
        SET name = $1, text = $2, image = COALESCE($3, image), cooking_time = $4
        WHERE id = $5 AND author_id = $6
    ",
    )
    .bind(payload.name.trim())
    .bind(&payload.text)
    .bind(payload.image.as_deref())
    .bind(payload.cooking_time)
    .bind(recipe_id)
    .bind(session.user_id)
    .execute(&mut *tr)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(Error::not_found("Recipe"));
    }

    replace_recipe_tags(&mut tr, recipe_id, &payload.tags).await?;
    replace_recipe_ingredients(&mut tr, recipe_id, &payload.ingredients).await?;

    tr.commit().await?;
    log::info!("User {} updated recipe {recipe_id}", session.user_id);

    get_recipe(recipe_id, Viewer::from(session), pool).await
}

/// Deletes a recipe; tags, ingredient lines, favorites and cart entries go
/// with it through `ON DELETE CASCADE`.
pub async fn delete_recipe(
    recipe_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<()> {
    let recipe = get_recipe_row(recipe_id, pool)
        .await?
        .ok_or_else(|| Error::not_found("Recipe"))?;
    session.authorize(ActionType::DeleteRecipe, &recipe)?;

    let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND author_id = $2")
        .bind(recipe_id)
        .bind(session.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("Recipe"));
    }

    log::info!("User {} deleted recipe {recipe_id}", session.user_id);
    Ok(())
}
