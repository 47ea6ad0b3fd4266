//! Access middleware
//!
//! Admin routes require the `x-admin-token` header to match the configured
//! token. With no token configured every request passes. Uploaded images are
//! public only once their record is approved; admins can fetch any image.

use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::Response,
};
use cleancity_common::auth::admin_token_matches;
use tracing::warn;

use crate::{error::Error, AppState};

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

pub async fn admin_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    let provided = request
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    if !admin_token_matches(provided, state.admin_token.as_deref()) {
        warn!(path = %request.uri().path(), "Rejected admin request with bad or missing token");
        return Err(Error::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Gate for the `/uploads` static directory
pub async fn image_access(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    let provided = request
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    let is_admin = state.admin_token.is_some()
        && admin_token_matches(provided, state.admin_token.as_deref());

    let path = match request.extensions().get::<OriginalUri>() {
        Some(OriginalUri(uri)) => uri.path().to_string(),
        None => request.uri().path().to_string(),
    };
    let image_ref = path.trim_start_matches('/').to_string();
    if !is_admin && !state.store.is_approved_image(&image_ref).await? {
        return Err(Error::NotFound(image_ref));
    }

    Ok(next.run(request).await)
}
