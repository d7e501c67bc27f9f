mod database {
    pub mod actions;
    pub mod error;
    pub mod pagination;
    pub mod schema;
    pub mod validation;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod api {
    pub mod filters;
    pub mod handlers;
    pub mod query;
    pub mod rejection;
}
mod config;
mod constants;

pub use api::*;
pub use authentication::*;
pub use config::*;
pub use constants::*;
pub use database::error::{Error, FieldErrors, QueryError, Result};
pub use database::*;
