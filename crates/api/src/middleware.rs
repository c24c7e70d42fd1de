//! Identity middleware.
//!
//! Authentication happens upstream: the API gateway validates the session
//! and forwards the caller's identity as trust headers. This middleware
//! rejects requests missing them and exposes the identity as a typed
//! request extension.

use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use cuadre_core::{Role, UserId};

use crate::context::CallerContext;

const HEADER_USER_ID: &str = "x-user-id";
const HEADER_USER_NAME: &str = "x-user-name";
const HEADER_USER_ROLE: &str = "x-user-role";

pub async fn identity_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let context = caller_from_headers(req.headers())?;
    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

fn caller_from_headers(headers: &HeaderMap) -> Result<CallerContext, StatusCode> {
    let user_id = header_str(headers, HEADER_USER_ID)?;
    let user_id = Uuid::parse_str(user_id).map_err(|_| StatusCode::UNAUTHORIZED)?;

    let username = header_str(headers, HEADER_USER_NAME)?;

    let role = header_str(headers, HEADER_USER_ROLE)?
        .parse::<Role>()
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    Ok(CallerContext::new(
        UserId::from_uuid(user_id),
        username,
        role,
    ))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, StatusCode> {
    let value = headers
        .get(name)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_str()
        .map_err(|_| StatusCode::UNAUTHORIZED)?
        .trim();

    if value.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(value)
}
