//! # gava_api
//!
//! HTTP API library for Gava authentication: login, token refresh, social
//! login, signup and per-request identity resolution.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use gava_core::auth::AuthError;
use gava_core::auth::jwt::TokenCodec;
use gava_core::auth::social::{HttpSocialResolver, SocialIdentityResolver};
use gava_core::store::AccountStore;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{auth, users};
use crate::services::auth::AuthService;

/// Route paths.
pub mod routes {
    pub const POST_AUTH_LOGIN: &str = "/api/auth/login";
    pub const POST_AUTH_REFRESH: &str = "/api/auth/refresh";
    pub const POST_AUTH_SOCIAL_LOGIN: &str = "/api/auth/social/login";
    pub const POST_USERS_SIGNUP: &str = "/api/users/signup";
    pub const GET_USERS_ME: &str = "/api/users/me";
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Token codec, built once from the configured secret and TTLs.
    pub codec: Arc<TokenCodec>,
    /// Account store gateway.
    pub store: Arc<dyn AccountStore>,
    /// Login / refresh / social login orchestration.
    pub auth: AuthService,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// Build state with an explicit social resolver.
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn AccountStore>,
        social: Arc<dyn SocialIdentityResolver>,
    ) -> Result<Self, AuthError> {
        let codec = Arc::new(TokenCodec::new(
            config.jwt_secret.as_bytes(),
            config.access_token_ttl_ms,
            config.refresh_token_ttl_ms,
        )?);
        let auth = AuthService::new(store.clone(), codec.clone(), social);
        Ok(Self {
            codec,
            store,
            auth,
            config,
        })
    }

    /// Build state calling the real social providers with the configured timeout.
    pub fn with_http_social(config: ApiConfig, store: Arc<dyn AccountStore>) -> Result<Self, AuthError> {
        let social = HttpSocialResolver::new(Duration::from_millis(config.social_timeout_ms))?;
        Self::new(config, store, Arc::new(social))
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::POST_AUTH_REFRESH, post(auth::refresh_handler))
        .route(routes::POST_AUTH_SOCIAL_LOGIN, post(auth::social_login_handler))
        .route(routes::POST_USERS_SIGNUP, post(users::signup_handler));

    // Protected routes (require a resolved identity)
    let protected = Router::new()
        .route(routes::GET_USERS_ME, get(users::me_handler))
        .route_layer(axum::middleware::from_fn(middleware::auth::require_auth));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::resolve_identity,
        ))
        .layer(cors)
        .with_state(state)
}
