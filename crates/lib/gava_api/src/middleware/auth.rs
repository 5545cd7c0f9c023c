//! Request identity resolution: Bearer token extraction and JWT verification.
//!
//! [`resolve_identity`] runs on every request and never rejects; it attaches
//! an [`Identity`] when the access token is valid. [`require_auth`] guards
//! protected routes, and handlers read the identity through [`CurrentUser`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use gava_core::auth::jwt::TokenCodec;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// Authenticated caller, built from access-token claims without a store lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub roles: Vec<String>,
}

impl Identity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Token from an `Authorization: Bearer <token>` header, if present and
/// well-formed.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verify the bearer token and build the caller's identity.
///
/// Refresh tokens carry no `userId`/`roles` and therefore never resolve.
pub fn resolve(codec: &TokenCodec, headers: &HeaderMap) -> Option<Identity> {
    let Some(token) = bearer_token(headers) else {
        debug!("no bearer token");
        return None;
    };
    if !codec.verify(token) {
        debug!("bearer token invalid or expired");
        return None;
    }
    match codec.claims_of(token) {
        Ok(claims) => match (claims.user_id, claims.roles) {
            (Some(user_id), Some(roles)) => Some(Identity {
                user_id,
                username: claims.sub,
                roles,
            }),
            _ => {
                debug!("bearer token is not an access token");
                None
            }
        },
        Err(e) => {
            debug!("bearer token claims unreadable: {e}");
            None
        }
    }
}

/// Axum middleware: attaches an [`Identity`] to request extensions when the
/// request carries a valid access token. Always continues.
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(identity) = resolve(&state.codec, request.headers()) {
        debug!(user_id = identity.user_id, username = %identity.username, "identity resolved");
        request.extensions_mut().insert(identity);
    }
    next.run(request).await
}

/// Axum middleware: rejects requests without a resolved [`Identity`].
pub async fn require_auth(request: Request, next: Next) -> Result<Response, AppError> {
    if request.extensions().get::<Identity>().is_none() {
        return Err(AppError::Unauthorized("Authentication required".into()));
    }
    Ok(next.run(request).await)
}

/// Handler extractor for the resolved caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))
    }
}
