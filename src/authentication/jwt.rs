use chrono::Duration;
use chrono::Utc;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::config::{Config, ConfigError};
use crate::database::schema::{User, Uuid};
use crate::error::{Error, QueryError, Result};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Uuid,
    pub username: String,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Uuid, username: String, lifetime_hours: i64) -> Self {
        let now = Utc::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(lifetime_hours)).timestamp();

        Self {
            user_id: id,
            username,
            iat,
            exp,
        }
    }
}

/// Identity of an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Uuid,
    pub username: String,
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            username: value.username,
        }
    }
}

/// Signing key and token lifetime shared by every request.
#[derive(Clone)]
pub struct SessionKeys {
    key: Hmac<Sha256>,
    lifetime_hours: i64,
}

impl SessionKeys {
    pub fn new(secret: &str, lifetime_hours: i64) -> Result<Self, ConfigError> {
        let key: Hmac<Sha256> =
            Hmac::new_from_slice(secret.as_bytes()).map_err(|e| ConfigError::Invalid {
                key: "FOODGRAM_JWT_SECRET",
                reason: e.to_string(),
            })?;

        Ok(Self {
            key,
            lifetime_hours,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(&config.jwt_secret, config.token_lifetime_hours)
    }

    pub fn generate_session(&self, user: &User) -> Result<String> {
        let claims = JwtSessionData::new(user.id, user.username.to_owned(), self.lifetime_hours);

        claims.sign_with_key(&self.key).map_err(|e| {
            log::error!("Failed to sign session token: {e}");
            QueryError::new(String::from("Failed to sign session token")).into()
        })
    }

    pub fn verify_session(&self, token: &str) -> Result<JwtSessionData> {
        let session: JwtSessionData = token
            .verify_with_key(&self.key)
            .map_err(|_| Error::Unauthorized(String::from("Invalid session; Invalid token")))?;

        if session.exp < Utc::now().timestamp() {
            return Err(Error::Unauthorized(String::from(
                "Invalid session; Token expired",
            )));
        }

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 42,
            email: String::from("cook@example.com"),
            username: String::from("cook"),
            first_name: String::from("Julia"),
            last_name: String::from("Child"),
            password: String::new(),
        }
    }

    #[test]
    fn issued_token_verifies() {
        let keys = SessionKeys::new("s3cret", 1).unwrap();
        let token = keys.generate_session(&user()).unwrap();

        let session = keys.verify_session(&token).unwrap();
        assert_eq!(session.user_id, 42);
        assert_eq!(session.username, "cook");
    }

    #[test]
    fn token_from_another_key_is_rejected() {
        let token = SessionKeys::new("s3cret", 1)
            .unwrap()
            .generate_session(&user())
            .unwrap();

        let other = SessionKeys::new("different", 1).unwrap();
        assert!(matches!(
            other.verify_session(&token),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = SessionKeys::new("s3cret", 1).unwrap();
        let claims = JwtSessionData {
            user_id: 42,
            username: String::from("cook"),
            iat: 0,
            exp: 1,
        };
        let token = claims.sign_with_key(&keys.key).unwrap();

        assert!(matches!(
            keys.verify_session(&token),
            Err(Error::Unauthorized(message)) if message.contains("expired")
        ));
    }
}
