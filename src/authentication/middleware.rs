use std::sync::Arc;

use warp::{reject::Rejection, Filter};

use super::jwt::{SessionData, SessionKeys};
use crate::error::{Error, Result};

/// Extracts the token from `Authorization: Bearer <token>` or `Token <token>`.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();

    if token.is_empty() {
        return None;
    }
    if scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token") {
        Some(token)
    } else {
        None
    }
}

fn authenticate(keys: &SessionKeys, header: Option<&str>) -> Result<SessionData> {
    let token = header.and_then(bearer_token).ok_or_else(|| {
        Error::Unauthorized(String::from(
            "Authentication credentials were not provided.",
        ))
    })?;

    keys.verify_session(token).map(SessionData::from)
}

pub fn with_session(
    keys: Arc<SessionKeys>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let keys = keys.clone();
        async move {
            let session = authenticate(&keys, header.as_deref())?;
            Ok::<_, Rejection>(session)
        }
    })
}

/// Like [`with_session`], but a request without a bearer or token credential
/// yields `None`. A credential that fails to verify is still rejected.
pub fn with_possible_session(
    keys: Arc<SessionKeys>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let keys = keys.clone();
        async move {
            let session = match header.as_deref().and_then(bearer_token) {
                Some(token) => Some(keys.verify_session(token).map(SessionData::from)?),
                None => None,
            };
            Ok::<_, Rejection>(session)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_and_token_schemes_are_accepted() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Token abc.def"), Some("abc.def"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer   "), None);
        assert_eq!(bearer_token(""), None);
    }

    #[tokio::test]
    async fn possible_session_is_none_without_header() {
        let keys = Arc::new(SessionKeys::new("s3cret", 1).unwrap());
        let session = warp::test::request()
            .filter(&with_possible_session(keys))
            .await
            .unwrap();

        assert_eq!(session, None);
    }

    #[tokio::test]
    async fn possible_session_ignores_other_schemes() {
        let keys = Arc::new(SessionKeys::new("s3cret", 1).unwrap());
        let session = warp::test::request()
            .header("authorization", "Basic dXNlcjpwYXNz")
            .filter(&with_possible_session(keys))
            .await
            .unwrap();

        assert_eq!(session, None);
    }

    #[tokio::test]
    async fn possible_session_rejects_bad_token() {
        let keys = Arc::new(SessionKeys::new("s3cret", 1).unwrap());
        let result = warp::test::request()
            .header("authorization", "Token not-a-token")
            .filter(&with_possible_session(keys))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn session_is_required() {
        let keys = Arc::new(SessionKeys::new("s3cret", 1).unwrap());
        let result = warp::test::request()
            .header("authorization", "Bearer not-a-token")
            .filter(&with_session(keys))
            .await;

        assert!(result.is_err());
    }
}
