use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use crate::logger::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use warp::http::{StatusCode, header};
use warp::{Rejection, Reply, reject};

pub async fn recover_error(err: Rejection) -> Result<warp::reply::Response, Infallible> {
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        code.clone()
    } else if err.is_not_found() {
        ApiErrorCode::NotFound
    } else if err.find::<reject::MissingHeader>().is_some() {
        ApiErrorCode::MissingToken
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiErrorCode::BadRequest(e.to_string())
    } else if err.find::<reject::PayloadTooLarge>().is_some() {
        ApiErrorCode::BadRequest("payload too large".to_string())
    } else if err.find::<reject::UnsupportedMediaType>().is_some() {
        ApiErrorCode::BadRequest("expected a JSON body".to_string())
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::MethodNotAllowed
    } else {
        ApiErrorCode::internal(format!("unhandled rejection: {:?}", err))
    };

    let status = code.status();
    let reply = warp::reply::with_status(warp::reply::json(&ApiResponse::<()>::err(&code)), status);
    let response = match code {
        ApiErrorCode::RateLimited { retry_after_secs } => {
            warp::reply::with_header(reply, header::RETRY_AFTER, retry_after_secs.to_string())
                .into_response()
        }
        _ => reply.into_response(),
    };
    Ok(response)
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
}

/// What a client is told. Every authentication failure collapses into
/// `InvalidToken` or `InvalidCredentials` so the reason never leaks.
#[derive(Debug, Clone, Error)]
pub enum ApiErrorCode {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Authorization header is missing")]
    MissingToken,
    #[error("Too many requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("{0}")]
    UserExists(String),
    #[error("{0}")]
    Validation(String),
    #[error("Malformed request: {0}")]
    BadRequest(String),
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Service temporarily unavailable")]
    StoreUnavailable,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidCredentials
            | ApiErrorCode::InvalidToken
            | ApiErrorCode::MissingToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiErrorCode::UserExists(_) => StatusCode::CONFLICT,
            ApiErrorCode::Validation(_) | ApiErrorCode::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorCode::InvalidCredentials => "invalid_credentials",
            ApiErrorCode::InvalidToken => "invalid_token",
            ApiErrorCode::MissingToken => "missing_token",
            ApiErrorCode::RateLimited { .. } => "rate_limited",
            ApiErrorCode::UserExists(_) => "user_exists",
            ApiErrorCode::Validation(_) => "validation_failed",
            ApiErrorCode::BadRequest(_) => "bad_request",
            ApiErrorCode::NotFound => "not_found",
            ApiErrorCode::MethodNotAllowed => "method_not_allowed",
            ApiErrorCode::StoreUnavailable => "service_unavailable",
            ApiErrorCode::InternalError => "internal_error",
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        if error.is_authentication_failure() {
            debug!(reason = %error, "authentication rejected");
            return match error {
                AuthError::CredentialsInvalid => ApiErrorCode::InvalidCredentials,
                _ => ApiErrorCode::InvalidToken,
            };
        }
        match error {
            AuthError::RateLimited { retry_after_secs } => {
                ApiErrorCode::RateLimited { retry_after_secs }
            }
            AuthError::UserExists(message) => ApiErrorCode::UserExists(message),
            AuthError::Validation(message) => ApiErrorCode::Validation(message),
            AuthError::StoreUnavailable(e) => {
                warn!(error = %e, "revocation store unavailable");
                ApiErrorCode::StoreUnavailable
            }
            other => ApiErrorCode::internal(other),
        }
    }
}
