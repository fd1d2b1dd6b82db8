// src/error.rs
use log::error;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use warp::http::StatusCode;
use warp::reject::Reject;
use warp::{Rejection, Reply};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Anything that went wrong after the session check. The message is logged,
    /// never returned.
    #[error("{0}")]
    Internal(String),
}

impl Reject for ApiError {}

impl ApiError {
    pub fn internal(e: impl std::fmt::Display) -> Rejection {
        warp::reject::custom(ApiError::Internal(e.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn reply_error(message: &str, status: StatusCode) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&ErrorBody {
            error: message.to_string(),
        }),
        status,
    )
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    if let Some(api_error) = err.find::<ApiError>() {
        let reply = match api_error {
            ApiError::Unauthorized => reply_error("Unauthorized", StatusCode::UNAUTHORIZED),
            ApiError::InvalidCredentials => {
                reply_error("Invalid credentials", StatusCode::UNAUTHORIZED)
            }
            ApiError::Forbidden => reply_error("Forbidden", StatusCode::FORBIDDEN),
            ApiError::BadRequest(message) => reply_error(message, StatusCode::BAD_REQUEST),
            ApiError::Internal(message) => {
                error!("Request failed: {}", message);
                reply_error("Internal server error", StatusCode::INTERNAL_SERVER_ERROR)
            }
        };
        return Ok(reply);
    }

    if err.is_not_found() {
        return Ok(reply_error("Not found", StatusCode::NOT_FOUND));
    }

    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        error!("Failed to read request body: {}", e);
        return Ok(reply_error(
            "Internal server error",
            StatusCode::INTERNAL_SERVER_ERROR,
        ));
    }

    if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        return Ok(reply_error(&e.to_string(), StatusCode::BAD_REQUEST));
    }

    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(reply_error(
            "Method not allowed",
            StatusCode::METHOD_NOT_ALLOWED,
        ));
    }

    error!("Unhandled rejection: {:?}", err);
    Ok(reply_error(
        "Internal server error",
        StatusCode::INTERNAL_SERVER_ERROR,
    ))
}
