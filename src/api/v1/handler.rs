use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{self, reject};

/// Envelope every endpoint answers with, errors included.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(status: StatusCode, data: T) -> Self {
        ApiResponse {
            success: true,
            status: status.as_u16(),
            message: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn into_reply(self) -> warp::reply::WithStatus<warp::reply::Json> {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        warp::reply::with_status(warp::reply::json(&self), status)
    }
}

impl ApiResponse<()> {
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            status: status.as_u16(),
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }

    pub fn err(code: &ApiErrorCode) -> Self {
        ApiResponse {
            success: false,
            status: code.status().as_u16(),
            message: None,
            data: None,
            error: Some(ApiError {
                code: code.as_str(),
                message: code.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

pub async fn register(
    body: RegisterRequest,
    remote: Option<SocketAddr>,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let register_input = RegisterInput {
        username: body.username,
        email: body.email,
        password: body.password,
        fullname: body.fullname,
        bio: body.bio,
        client_ip: remote.map(|addr| addr.ip()),
    };
    let user = auth_service
        .register(register_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(ApiResponse::ok(StatusCode::CREATED, user)
        .with_message("User registered successfully")
        .into_reply())
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    body: LoginRequest,
    remote: Option<SocketAddr>,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let login_input = LoginInput {
        username: body.username,
        password: body.password,
        client_ip: remote.map(|addr| addr.ip()),
    };
    let login_result = auth_service
        .login(login_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(ApiResponse::ok(StatusCode::CREATED, login_result).into_reply())
}

pub async fn refresh(
    refresh_token: String,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let tokens = auth_service
        .refresh_token(&refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(ApiResponse::ok(StatusCode::CREATED, tokens).into_reply())
}

pub async fn logout(
    token: String,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    auth_service
        .logout(&token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(ApiResponse::message(StatusCode::OK, "Successfully logged out").into_reply())
}

pub async fn logout_all(
    access_token: String,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    auth_service
        .logout_all(&access_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(ApiResponse::message(StatusCode::CREATED, "Logged out from all devices").into_reply())
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject: Subject,
    pub username: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

pub async fn me(claims: TokenClaims) -> Result<impl warp::Reply, warp::Rejection> {
    let response = MeResponse {
        username: claims
            .extra
            .get("username")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        issued_at: DateTime::from_timestamp(claims.iat, 0),
        expires_at: DateTime::from_timestamp(claims.exp, 0),
        subject: claims.sub,
    };
    Ok(ApiResponse::ok(StatusCode::OK, response).into_reply())
}
