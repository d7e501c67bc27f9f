use serde::Serialize;
use warp::{
    http::{header, StatusCode},
    reject::Rejection,
    reply::{Reply, Response},
};

use super::{filters::Context, query::QueryPairs};
use crate::{
    actions::{self, RelationKind},
    constants::SHOPPING_LIST_FILENAME,
    jwt::SessionData,
    permissions::Viewer,
    schema::{Credentials, NewUser, PasswordChange, RecipePayload, TokenResponse, UserView, Uuid},
};

type HandlerResult = Result<Response, Rejection>;

fn json<T: Serialize>(value: &T) -> Response {
    warp::reply::json(value).into_response()
}

fn created<T: Serialize>(value: &T) -> Response {
    warp::reply::with_status(warp::reply::json(value), StatusCode::CREATED).into_response()
}

fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

// Recipes

pub async fn list_recipes(
    query: QueryPairs,
    session: Option<SessionData>,
    ctx: Context,
) -> HandlerResult {
    let page = query.page_request(&ctx.config.pagination)?;
    let filter = query.recipe_filter()?;
    let viewer = Viewer::from(session.as_ref());

    let recipes = actions::fetch_recipes(&filter, page, viewer, &ctx.pool).await?;
    Ok(json(&recipes))
}

pub async fn get_recipe(id: Uuid, session: Option<SessionData>, ctx: Context) -> HandlerResult {
    let recipe = actions::get_recipe(id, Viewer::from(session.as_ref()), &ctx.pool).await?;
    Ok(json(&recipe))
}

pub async fn create_recipe(
    session: SessionData,
    payload: RecipePayload,
    ctx: Context,
) -> HandlerResult {
    let recipe = actions::create_recipe(&session, payload, &ctx.config.limits, &ctx.pool).await?;
    Ok(created(&recipe))
}

pub async fn update_recipe(
    id: Uuid,
    session: SessionData,
    payload: RecipePayload,
    ctx: Context,
) -> HandlerResult {
    let recipe =
        actions::update_recipe(id, &session, payload, &ctx.config.limits, &ctx.pool).await?;
    Ok(json(&recipe))
}

pub async fn delete_recipe(id: Uuid, session: SessionData, ctx: Context) -> HandlerResult {
    actions::delete_recipe(id, &session, &ctx.pool).await?;
    Ok(no_content())
}

pub async fn add_relation(
    id: Uuid,
    kind: RelationKind,
    session: SessionData,
    ctx: Context,
) -> HandlerResult {
    let recipe = actions::add_relation(kind, session.user_id, id, &ctx.pool).await?;
    Ok(created(&recipe))
}

pub async fn remove_relation(
    id: Uuid,
    kind: RelationKind,
    session: SessionData,
    ctx: Context,
) -> HandlerResult {
    actions::remove_relation(kind, session.user_id, id, &ctx.pool).await?;
    Ok(no_content())
}

pub async fn download_shopping_cart(session: SessionData, ctx: Context) -> HandlerResult {
    let items = actions::build_shopping_list(session.user_id, &ctx.pool).await?;
    let report = actions::render_shopping_list(&items);

    let reply = warp::reply::with_header(
        report,
        header::CONTENT_TYPE,
        "text/plain; charset=utf-8",
    );
    let reply = warp::reply::with_header(
        reply,
        header::CONTENT_DISPOSITION,
        format!("attachment; filename={SHOPPING_LIST_FILENAME}"),
    );
    Ok(reply.into_response())
}

// Users

pub async fn list_users(
    query: QueryPairs,
    session: Option<SessionData>,
    ctx: Context,
) -> HandlerResult {
    let page = query.page_request(&ctx.config.pagination)?;
    let users = actions::fetch_users(page, Viewer::from(session.as_ref()), &ctx.pool).await?;
    Ok(json(&users))
}

pub async fn register_user(payload: NewUser, ctx: Context) -> HandlerResult {
    let user = actions::register_user(payload, &ctx.pool).await?;
    Ok(created(&UserView::from_user(&user, false)))
}

pub async fn get_user(id: Uuid, session: Option<SessionData>, ctx: Context) -> HandlerResult {
    let user = actions::get_user_view(id, Viewer::from(session.as_ref()), &ctx.pool).await?;
    Ok(json(&user))
}

pub async fn me(session: SessionData, ctx: Context) -> HandlerResult {
    let user = actions::get_user_view(session.user_id, Viewer::from(&session), &ctx.pool).await?;
    Ok(json(&user))
}

pub async fn set_password(
    session: SessionData,
    payload: PasswordChange,
    ctx: Context,
) -> HandlerResult {
    actions::set_password(session.user_id, &payload, &ctx.pool).await?;
    Ok(no_content())
}

pub async fn list_subscriptions(
    query: QueryPairs,
    session: SessionData,
    ctx: Context,
) -> HandlerResult {
    let page = query.page_request(&ctx.config.pagination)?;
    let recipes_limit = query.recipes_limit()?;

    let subscriptions =
        actions::fetch_subscriptions(session.user_id, page, recipes_limit, &ctx.pool).await?;
    Ok(json(&subscriptions))
}

pub async fn subscribe(
    id: Uuid,
    query: QueryPairs,
    session: SessionData,
    ctx: Context,
) -> HandlerResult {
    let recipes_limit = query.recipes_limit()?;
    let subscription = actions::subscribe(session.user_id, id, recipes_limit, &ctx.pool).await?;
    Ok(created(&subscription))
}

pub async fn unsubscribe(id: Uuid, session: SessionData, ctx: Context) -> HandlerResult {
    actions::unsubscribe(session.user_id, id, &ctx.pool).await?;
    Ok(no_content())
}

// Tokens

pub async fn login(credentials: Credentials, ctx: Context) -> HandlerResult {
    let auth_token = actions::login_user(&credentials, &ctx.keys, &ctx.pool).await?;
    Ok(json(&TokenResponse { auth_token }))
}

/// Tokens are stateless, so logging out only checks that one was presented.
pub async fn logout(session: SessionData) -> HandlerResult {
    log::trace!("> Logout of {}", session.username);
    Ok(no_content())
}

// Catalog

pub async fn list_ingredients(query: QueryPairs, ctx: Context) -> HandlerResult {
    let ingredients = actions::list_ingredients(query.search(), &ctx.pool).await?;
    Ok(json(&ingredients))
}

pub async fn get_ingredient(id: Uuid, ctx: Context) -> HandlerResult {
    let ingredient = actions::get_ingredient(id, &ctx.pool).await?;
    Ok(json(&ingredient))
}

pub async fn list_tags(ctx: Context) -> HandlerResult {
    let tags = actions::list_tags(&ctx.pool).await?;
    Ok(json(&tags))
}

pub async fn get_tag(id: Uuid, ctx: Context) -> HandlerResult {
    let tag = actions::get_tag(id, &ctx.pool).await?;
    Ok(json(&tag))
}
