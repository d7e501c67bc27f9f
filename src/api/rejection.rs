use std::convert::Infallible;

use serde_json::{json, Value};
use warp::{
    body::BodyDeserializeError,
    http::StatusCode,
    reject::{
        InvalidQuery, LengthRequired, MethodNotAllowed, PayloadTooLarge, Rejection,
        UnsupportedMediaType,
    },
    reply::{Reply, Response},
};

use crate::error::Error;

fn detail(message: impl Into<String>) -> Value {
    json!({ "detail": message.into() })
}

/// Status and JSON body for a domain error. Internal failures are logged and
/// replaced with a generic message.
pub fn error_reply(error: &Error) -> (StatusCode, Value) {
    match error {
        Error::Validation(errors) => (
            StatusCode::BAD_REQUEST,
            serde_json::to_value(errors).unwrap_or_else(|_| detail(errors.to_string())),
        ),
        Error::AlreadyExists(message) => (StatusCode::BAD_REQUEST, json!({ "errors": message })),
        Error::NotFound(message) => (StatusCode::NOT_FOUND, detail(message.as_str())),
        Error::PermissionDenied(message) => (StatusCode::FORBIDDEN, detail(message.as_str())),
        Error::Unauthorized(message) => (StatusCode::UNAUTHORIZED, detail(message.as_str())),
        Error::Query(e) => {
            log::error!("{e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                detail("Internal server error"),
            )
        }
    }
}

pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, body) = if let Some(e) = err.find::<Error>() {
        error_reply(e)
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, detail(e.to_string()))
    } else if err.find::<InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, detail("Malformed query string"))
    } else if err.find::<PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, detail("Request body is too large"))
    } else if err.find::<LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, detail("Content-Length is required"))
    } else if err.find::<UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            detail("Expected an application/json body"),
        )
    } else if err.find::<MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, detail("Method not allowed"))
    } else {
        if !err.is_not_found() {
            log::warn!("Unhandled rejection: {err:?}");
        }
        (StatusCode::NOT_FOUND, detail("Not found."))
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status).into_response())
}
