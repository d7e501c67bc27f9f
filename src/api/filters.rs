use std::{convert::Infallible, sync::Arc};

use serde::de::DeserializeOwned;
use sqlx::{Pool, Postgres};
use warp::{filters::BoxedFilter, reject::Rejection, reply::Response, Filter, Reply};

use super::{handlers, query::QueryPairs, rejection::handle_rejection};
use crate::{
    actions::RelationKind,
    config::{Config, ConfigError},
    constants::MAX_BODY_BYTES,
    jwt::SessionKeys,
    middleware::{with_possible_session, with_session},
    schema::{Credentials, NewUser, PasswordChange, RecipePayload, Uuid},
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct Context {
    pub pool: Pool<Postgres>,
    pub config: Arc<Config>,
    pub keys: Arc<SessionKeys>,
}

impl Context {
    pub fn new(pool: Pool<Postgres>, config: Config) -> Result<Self, ConfigError> {
        let keys = SessionKeys::from_config(&config)?;

        Ok(Self {
            pool,
            config: Arc::new(config),
            keys: Arc::new(keys),
        })
    }
}

fn with_context(ctx: Context) -> impl Filter<Extract = (Context,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn query_pairs() -> impl Filter<Extract = (QueryPairs,), Error = Rejection> + Clone {
    warp::query::<Vec<(String, String)>>().map(QueryPairs)
}

/// Every route of the API, mounted under `/api`, with rejections rendered and
/// requests logged.
pub fn routes(ctx: Context) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    warp::path("api")
        .and(
            recipe_routes(ctx.clone())
                .or(user_routes(ctx.clone()))
                .unify()
                .or(token_routes(ctx.clone()))
                .unify()
                .or(catalog_routes(ctx))
                .unify(),
        )
        .recover(handle_rejection)
        .with(warp::log("foodgram::api"))
}

pub fn recipe_routes(ctx: Context) -> BoxedFilter<(Response,)> {
    let keys = ctx.keys.clone();

    let download = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::download_shopping_cart);

    let list = warp::path!("recipes")
        .and(warp::get())
        .and(query_pairs())
        .and(with_possible_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::list_recipes);

    let create = warp::path!("recipes")
        .and(warp::post())
        .and(with_session(keys.clone()))
        .and(json_body::<RecipePayload>())
        .and(with_context(ctx.clone()))
        .and_then(handlers::create_recipe);

    let get = warp::path!("recipes" / Uuid)
        .and(warp::get())
        .and(with_possible_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::get_recipe);

    let update = warp::path!("recipes" / Uuid)
        .and(warp::patch())
        .and(with_session(keys.clone()))
        .and(json_body::<RecipePayload>())
        .and(with_context(ctx.clone()))
        .and_then(handlers::update_recipe);

    let delete = warp::path!("recipes" / Uuid)
        .and(warp::delete())
        .and(with_session(keys))
        .and(with_context(ctx.clone()))
        .and_then(handlers::delete_recipe);

    download
        .or(list)
        .unify()
        .or(create)
        .unify()
        .or(get)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .or(relation_routes("favorite", RelationKind::Favorite, ctx.clone()))
        .unify()
        .or(relation_routes(
            "shopping_cart",
            RelationKind::ShoppingCart,
            ctx,
        ))
        .unify()
        .boxed()
}

/// `POST` and `DELETE` on `/recipes/{id}/{segment}`.
fn relation_routes(
    segment: &'static str,
    kind: RelationKind,
    ctx: Context,
) -> BoxedFilter<(Response,)> {
    let path = warp::path("recipes")
        .and(warp::path::param::<Uuid>())
        .and(warp::path(segment))
        .and(warp::path::end())
        .and(warp::any().map(move || kind));

    let add = path
        .clone()
        .and(warp::post())
        .and(with_session(ctx.keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::add_relation);

    let remove = path
        .and(warp::delete())
        .and(with_session(ctx.keys.clone()))
        .and(with_context(ctx))
        .and_then(handlers::remove_relation);

    add.or(remove).unify().boxed()
}

pub fn user_routes(ctx: Context) -> BoxedFilter<(Response,)> {
    let keys = ctx.keys.clone();

    let list = warp::path!("users")
        .and(warp::get())
        .and(query_pairs())
        .and(with_possible_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::list_users);

    let register = warp::path!("users")
        .and(warp::post())
        .and(json_body::<NewUser>())
        .and(with_context(ctx.clone()))
        .and_then(handlers::register_user);

    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(with_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::me);

    let set_password = warp::path!("users" / "set_password")
        .and(warp::post())
        .and(with_session(keys.clone()))
        .and(json_body::<PasswordChange>())
        .and(with_context(ctx.clone()))
        .and_then(handlers::set_password);

    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(query_pairs())
        .and(with_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::list_subscriptions);

    let get = warp::path!("users" / Uuid)
        .and(warp::get())
        .and(with_possible_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::get_user);

    let subscribe = warp::path!("users" / Uuid / "subscribe")
        .and(warp::post())
        .and(query_pairs())
        .and(with_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::subscribe);

    let unsubscribe = warp::path!("users" / Uuid / "subscribe")
        .and(warp::delete())
        .and(with_session(keys))
        .and(with_context(ctx))
        .and_then(handlers::unsubscribe);

    list.or(register)
        .unify()
        .or(me)
        .unify()
        .or(set_password)
        .unify()
        .or(subscriptions)
        .unify()
        .or(get)
        .unify()
        .or(subscribe)
        .unify()
        .or(unsubscribe)
        .unify()
        .boxed()
}

pub fn token_routes(ctx: Context) -> BoxedFilter<(Response,)> {
    let login = warp::path!("auth" / "token" / "login")
        .and(warp::post())
        .and(json_body::<Credentials>())
        .and(with_context(ctx.clone()))
        .and_then(handlers::login);

    let logout = warp::path!("auth" / "token" / "logout")
        .and(warp::post())
        .and(with_session(ctx.keys))
        .and_then(handlers::logout);

    login.or(logout).unify().boxed()
}

pub fn catalog_routes(ctx: Context) -> BoxedFilter<(Response,)> {
    let ingredients = warp::path!("ingredients")
        .and(warp::get())
        .and(query_pairs())
        .and(with_context(ctx.clone()))
        .and_then(handlers::list_ingredients);

    let ingredient = warp::path!("ingredients" / Uuid)
        .and(warp::get())
        .and(with_context(ctx.clone()))
        .and_then(handlers::get_ingredient);

    let tags = warp::path!("tags")
        .and(warp::get())
        .and(with_context(ctx.clone()))
        .and_then(handlers::list_tags);

    let tag = warp::path!("tags" / Uuid)
        .and(warp::get())
        .and(with_context(ctx))
        .and_then(handlers::get_tag);

    ingredients
        .or(ingredient)
        .unify()
        .or(tags)
        .unify()
        .or(tag)
        .unify()
        .boxed()
}
