mod support;

use foodgram::{
    actions::{fetch_users, login_user, register_user, set_password},
    jwt::SessionKeys,
    pagination::PageRequest,
    permissions::Viewer,
    schema::{Credentials, NewUser, PasswordChange},
    Error,
};
use sqlx::PgPool;
use support::{create_user, PASSWORD};

fn credentials(email: &str, password: &str) -> Credentials {
    Credentials {
        email: email.to_owned(),
        password: password.to_owned(),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn duplicate_registration_already_exists(pool: PgPool) {
    create_user(&pool, "cook").await;

    let result = register_user(
        NewUser {
            email: String::from("cook@example.com"),
            username: String::from("another"),
            first_name: String::from("Julia"),
            last_name: String::from("Child"),
            password: PASSWORD.to_owned(),
        },
        &pool,
    )
    .await;

    assert!(matches!(result, Err(Error::AlreadyExists(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn email_is_unique_regardless_of_case(pool: PgPool) {
    let cook = create_user(&pool, "cook").await;
    let keys = SessionKeys::new("s3cret", 1).unwrap();

    let result = register_user(
        NewUser {
            email: String::from("Cook@Example.com"),
            username: String::from("another"),
            first_name: String::from("Julia"),
            last_name: String::from("Child"),
            password: String::from("another-pass-2"),
        },
        &pool,
    )
    .await;
    assert!(matches!(result, Err(Error::AlreadyExists(_))));

    for email in ["cook@example.com", "COOK@example.com"] {
        let token = login_user(&credentials(email, PASSWORD), &keys, &pool)
            .await
            .unwrap();
        assert_eq!(keys.verify_session(&token).unwrap().user_id, cook.user_id);
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn login_issues_verifiable_token(pool: PgPool) {
    let cook = create_user(&pool, "cook").await;
    let keys = SessionKeys::new("s3cret", 1).unwrap();

    let token = login_user(&credentials("cook@example.com", PASSWORD), &keys, &pool)
        .await
        .unwrap();
    assert_eq!(keys.verify_session(&token).unwrap().user_id, cook.user_id);

    let wrong = login_user(&credentials("cook@example.com", "wrong-password"), &keys, &pool).await;
    assert!(matches!(wrong, Err(Error::Validation(errors)) if errors.contains("non_field_errors")));

    let unknown = login_user(&credentials("nobody@example.com", PASSWORD), &keys, &pool).await;
    assert!(matches!(unknown, Err(Error::Validation(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn password_change_requires_current(pool: PgPool) {
    let cook = create_user(&pool, "cook").await;
    let keys = SessionKeys::new("s3cret", 1).unwrap();

    let bad = set_password(
        cook.user_id,
        &PasswordChange {
            current_password: String::from("not-it-at-all"),
            new_password: String::from("brand-new-pass"),
        },
        &pool,
    )
    .await;
    assert!(matches!(bad, Err(Error::Validation(errors)) if errors.contains("current_password")));

    set_password(
        cook.user_id,
        &PasswordChange {
            current_password: PASSWORD.to_owned(),
            new_password: String::from("brand-new-pass"),
        },
        &pool,
    )
    .await
    .unwrap();

    let token = login_user(&credentials("cook@example.com", "brand-new-pass"), &keys, &pool).await;
    assert!(token.is_ok());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn users_are_listed_by_username(pool: PgPool) {
    create_user(&pool, "zoe").await;
    create_user(&pool, "adam").await;
    create_user(&pool, "mia").await;

    let page = fetch_users(PageRequest { page: 1, limit: 2 }, Viewer::Anonymous, &pool)
        .await
        .unwrap();

    assert_eq!(page.count, 3);
    assert_eq!(page.next, Some(2));
    let names: Vec<_> = page.results.iter().map(|user| user.username.as_str()).collect();
    assert_eq!(names, vec!["adam", "mia"]);

    let past_end = fetch_users(PageRequest { page: 3, limit: 2 }, Viewer::Anonymous, &pool).await;
    assert!(matches!(past_end, Err(Error::NotFound(_))));
}
