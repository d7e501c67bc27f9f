use sqlx::{Pool, Postgres};

use super::annotations::annotate_authors;
use crate::{
    authentication::cryptography::{hash_password, verify_password},
    error::{Error, FieldErrors, QueryError, Result},
    jwt::SessionKeys,
    pagination::{Page, PageRequest},
    permissions::Viewer,
    schema::{Credentials, NewUser, PasswordChange, User, UserRow, UserView, Uuid},
    validation::{validate_new_user, validate_password},
};

const INVALID_CREDENTIALS: &str = "Unable to log in with provided credentials.";

fn password_error(e: argon2::password_hash::Error) -> Error {
    log::error!("Password hashing failed: {e}");
    QueryError::new(String::from("Password hashing failed")).into()
}

pub async fn get_user_by_id(user_id: Uuid, pool: &Pool<Postgres>) -> Result<Option<User>> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_email(email: &str, pool: &Pool<Postgres>) -> Result<Option<User>> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn list_users_by_ids(ids: &[Uuid], pool: &Pool<Postgres>) -> Result<Vec<User>> {
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let rows: Vec<User> = sqlx::query_as("SELECT * FROM users WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

pub async fn get_user_view(id: Uuid, viewer: Viewer, pool: &Pool<Postgres>) -> Result<UserView> {
    let user = get_user_by_id(id, pool)
        .await?
        .ok_or_else(|| Error::not_found("User"))?;
    let followed = annotate_authors(viewer, &[user.id], pool).await?;

    Ok(UserView::from_user(&user, followed.contains(&user.id)))
}

pub async fn fetch_users(
    page: PageRequest,
    viewer: Viewer,
    pool: &Pool<Postgres>,
) -> Result<Page<UserView>> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "SELECT u.*, COUNT(*) OVER() AS count FROM users u ORDER BY u.username LIMIT $1 OFFSET $2",
    )
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let ids: Vec<Uuid> = rows.iter().map(|row| row.user.id).collect();
    let followed = annotate_authors(viewer, &ids, pool).await?;

    let views = rows
        .iter()
        .map(|row| UserView::from_user(&row.user, followed.contains(&row.user.id)))
        .collect();
    Page::from_rows(views, total_count, page)
}

/// Creates a user, storing an argon2 hash of the password. A taken email or
/// username is reported as `AlreadyExists`.
pub async fn register_user(new_user: NewUser, pool: &Pool<Postgres>) -> Result<User> {
    validate_new_user(&new_user)?;
    let password = hash_password(&new_user.password).map_err(password_error)?;

    let user: User = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(new_user.email.trim())
    .bind(&new_user.username)
    .bind(new_user.first_name.trim())
    .bind(new_user.last_name.trim())
    .bind(password)
    .fetch_one(pool)
    .await
    .map_err(|e| match Error::from(e) {
        Error::AlreadyExists(_) => {
            Error::AlreadyExists(String::from("A user with that email or username already exists"))
        }
        e => e,
    })?;

    log::info!("Registered user {} ({})", user.id, user.username);
    Ok(user)
}

pub async fn login_user(
    credentials: &Credentials,
    keys: &SessionKeys,
    pool: &Pool<Postgres>,
) -> Result<String> {
    let Some(user) = get_user_by_email(&credentials.email, pool).await? else {
        return Err(Error::validation("non_field_errors", INVALID_CREDENTIALS));
    };

    let authenticated =
        verify_password(&credentials.password, &user.password).map_err(password_error)?;
    if !authenticated {
        return Err(Error::validation("non_field_errors", INVALID_CREDENTIALS));
    }

    keys.generate_session(&user)
}

pub async fn set_password(
    user_id: Uuid,
    change: &PasswordChange,
    pool: &Pool<Postgres>,
) -> Result<()> {
    let user = get_user_by_id(user_id, pool)
        .await?
        .ok_or_else(|| Error::not_found("User"))?;

    let authenticated =
        verify_password(&change.current_password, &user.password).map_err(password_error)?;
    if !authenticated {
        return Err(Error::validation("current_password", "Invalid password."));
    }

    let mut errors = FieldErrors::new();
    if change.new_password == change.current_password {
        errors.add(
            "new_password",
            "New password must differ from the current one.",
        );
    }
    validate_password("new_password", &change.new_password, &mut errors);
    errors.into_result()?;

    let password = hash_password(&change.new_password).map_err(password_error)?;
    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(password)
        .bind(user_id)
        .execute(pool)
        .await?;

    log::info!("User {user_id} changed password");
    Ok(())
}
