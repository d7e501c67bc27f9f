#![allow(dead_code)]

use foodgram::{
    actions::register_user,
    jwt::SessionData,
    schema::{Ingredient, IngredientAmount, NewUser, RecipePayload, Tag, Uuid},
};
use sqlx::PgPool;

pub const PASSWORD: &str = "correct-horse-1";

pub async fn create_user(pool: &PgPool, username: &str) -> SessionData {
    let user = register_user(
        NewUser {
            email: format!("{username}@example.com"),
            username: username.to_owned(),
            first_name: String::from("Test"),
            last_name: String::from("Cook"),
            password: PASSWORD.to_owned(),
        },
        pool,
    )
    .await
    .unwrap();

    SessionData {
        user_id: user.id,
        username: user.username,
    }
}

pub async fn create_tag(pool: &PgPool, slug: &str) -> Tag {
    sqlx::query_as("INSERT INTO tags (name, slug, color) VALUES ($1, $2, '#E26C2D') RETURNING *")
        .bind(slug.to_uppercase())
        .bind(slug)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_ingredient(pool: &PgPool, name: &str, unit: &str) -> Ingredient {
    sqlx::query_as("INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING *")
        .bind(name)
        .bind(unit)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub fn payload(name: &str, tags: &[Uuid], ingredients: &[(Uuid, i32)]) -> RecipePayload {
    RecipePayload {
        name: name.to_owned(),
        text: String::from("Mix everything and bake."),
        image: Some(String::from("recipes/images/pie.png")),
        cooking_time: 30,
        tags: tags.to_vec(),
        ingredients: ingredients
            .iter()
            .map(|(id, amount)| IngredientAmount {
                id: *id,
                amount: *amount,
            })
            .collect(),
    }
}

pub async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}
