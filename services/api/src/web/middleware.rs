//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::error::HttpError;
use crate::web::state::AppState;

/// Pulls the caller's token from `Authorization: Bearer` or, failing that, the `session` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|t| !t.is_empty())
}

/// Middleware that resolves the caller's token to an owner id.
///
/// If valid, inserts the owner id into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(req.headers()) else {
        return HttpError::unauthorized().into_response();
    };

    let owner_id = match state.identity.resolve_owner(token).await {
        Ok(owner_id) => owner_id,
        Err(e) => {
            warn!("Rejected credentials: {}", e);
            return HttpError::unauthorized().into_response();
        }
    };

    req.extensions_mut().insert(owner_id);
    next.run(req).await
}
