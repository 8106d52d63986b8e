use super::error::*;
use super::handler;
use crate::application_port::AuthService;
use crate::domain_model::{TokenClaims, TokenType};
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let register = warp::path("auth")
        .and(warp::path("register"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(warp::addr::remote())
        .and(with(server.auth_service.clone()))
        .and_then(handler::register);

    let login = warp::path("auth")
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(warp::addr::remote())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let refresh = warp::path("auth")
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::post())
        .and(bearer_token())
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    // Either token type; the service verifies it before revoking.
    let logout = warp::path("auth")
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(warp::post())
        .and(bearer_token())
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout);

    let logout_all = warp::path("auth")
        .and(warp::path("logout-all"))
        .and(warp::path::end())
        .and(warp::post())
        .and(bearer_token())
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout_all);

    let me = warp::path("auth")
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_verification(
            server.auth_service.clone(),
            Some(TokenType::Access),
        ))
        .and_then(handler::me);

    register
        .or(login)
        .or(refresh)
        .or(logout)
        .or(logout_all)
        .or(me)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// The raw token from `Authorization: Bearer <token>`.
fn bearer_token() -> impl Filter<Extract = (String,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_ref()).and_then(
        |header: String| async move {
            match header.strip_prefix("Bearer ").map(str::trim) {
                Some(token) if !token.is_empty() => Ok(token.to_string()),
                _ => Err(reject::custom(ApiErrorCode::InvalidToken)),
            }
        },
    )
}

/// Admit the request only if its bearer token passes the verification gate,
/// handing the verified claims to the handler.
fn with_verification(
    auth_service: Arc<dyn AuthService>,
    expected: Option<TokenType>,
) -> impl Filter<Extract = (TokenClaims,), Error = warp::Rejection> + Clone {
    bearer_token().and_then(move |token: String| {
        let auth_service = auth_service.clone();
        async move {
            auth_service
                .verify_token(&token, expected)
                .await
                .map_err(ApiErrorCode::from)
                .map_err(reject::custom)
        }
    })
}
