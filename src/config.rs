use std::{env, fmt::Display, ops::RangeInclusive, str::FromStr};

use crate::constants::{
    AMOUNT_MAX, AMOUNT_MIN, COOKING_TIME_MAX, COOKING_TIME_MIN, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
    RECIPE_NAME_MAX_LEN, TOKEN_LIFETIME_HOURS,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Bounds enforced on recipe payloads before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeLimits {
    /// Minutes.
    pub cooking_time: RangeInclusive<i32>,
    pub amount: RangeInclusive<i32>,
    pub name_max_len: usize,
}

impl Default for RecipeLimits {
    fn default() -> Self {
        Self {
            cooking_time: COOKING_TIME_MIN..=COOKING_TIME_MAX,
            amount: AMOUNT_MIN..=AMOUNT_MAX,
            name_max_len: RECIPE_NAME_MAX_LEN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_SIZE,
            max_limit: MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub jwt_secret: String,
    pub token_lifetime_hours: i64,
    pub limits: RecipeLimits,
    pub pagination: PaginationConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// `FOODGRAM_JWT_SECRET` is the only required key; everything else falls
    /// back to the defaults in [`crate::constants`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("FOODGRAM_JWT_SECRET")
            .filter(|secret| !secret.trim().is_empty())
            .ok_or(ConfigError::Missing("FOODGRAM_JWT_SECRET"))?;

        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| String::from("postgres://localhost/foodgram"));

        let cooking_time_max = try_load(&lookup, "FOODGRAM_COOKING_TIME_MAX", COOKING_TIME_MAX)?;
        let amount_max = try_load(&lookup, "FOODGRAM_AMOUNT_MAX", AMOUNT_MAX)?;
        let limits = RecipeLimits {
            cooking_time: COOKING_TIME_MIN..=cooking_time_max,
            amount: AMOUNT_MIN..=amount_max,
            ..RecipeLimits::default()
        };
        if limits.cooking_time.is_empty() {
            return Err(invalid("FOODGRAM_COOKING_TIME_MAX", "must be at least 1"));
        }
        if limits.amount.is_empty() {
            return Err(invalid("FOODGRAM_AMOUNT_MAX", "must be at least 1"));
        }

        let pagination = PaginationConfig {
            default_limit: try_load(&lookup, "FOODGRAM_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            max_limit: try_load(&lookup, "FOODGRAM_MAX_PAGE_SIZE", MAX_PAGE_SIZE)?,
        };
        if pagination.default_limit < 1 || pagination.default_limit > pagination.max_limit {
            return Err(invalid(
                "FOODGRAM_PAGE_SIZE",
                "must be between 1 and FOODGRAM_MAX_PAGE_SIZE",
            ));
        }

        let token_lifetime_hours =
            try_load(&lookup, "FOODGRAM_TOKEN_LIFETIME_HOURS", TOKEN_LIFETIME_HOURS)?;
        if token_lifetime_hours < 1 {
            return Err(invalid("FOODGRAM_TOKEN_LIFETIME_HOURS", "must be positive"));
        }

        Ok(Self {
            port: try_load(&lookup, "FOODGRAM_PORT", 8000)?,
            database_url,
            max_connections: try_load(&lookup, "FOODGRAM_MAX_CONNECTIONS", 10)?,
            jwt_secret,
            token_lifetime_hours,
            limits,
            pagination,
        })
    }
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.to_owned(),
    }
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => {
            log::info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
