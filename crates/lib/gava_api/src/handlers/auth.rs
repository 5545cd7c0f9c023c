//! Authentication request handlers.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ValidJson;
use crate::models::{LoginRequest, RefreshRequest, SocialLoginRequest, TokenResponse};

/// `POST /api/auth/login`: authenticate with username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = state.auth.login(&body.username, &body.password).await?;
    Ok(Json(resp))
}

/// `POST /api/auth/refresh`: exchange a refresh token for a new token pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = state.auth.refresh(&body.refresh_token).await?;
    Ok(Json(resp))
}

/// `POST /api/auth/social/login`: log in (or sign up) with a provider token.
pub async fn social_login_handler(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<SocialLoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = state
        .auth
        .login_or_register_social(&body.provider, &body.token)
        .await?;
    Ok(Json(resp))
}
