//! User account handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ValidJson;
use crate::middleware::auth::CurrentUser;
use crate::models::{SignupRequest, UserInfoResponse};
use crate::services::users;

/// `POST /api/users/signup`
pub async fn signup_handler(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<SignupRequest>,
) -> AppResult<StatusCode> {
    users::signup(state.store.as_ref(), &body.username, &body.password).await?;
    Ok(StatusCode::CREATED)
}

/// `GET /api/users/me`: requires authentication.
pub async fn me_handler(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> AppResult<Json<UserInfoResponse>> {
    let resp = users::current_user_info(state.store.as_ref(), &identity).await?;
    Ok(Json(resp))
}
