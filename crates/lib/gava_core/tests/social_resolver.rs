//! Integration test: `HttpSocialResolver` against a local stub provider.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use gava_core::auth::AuthError;
use gava_core::auth::social::{HttpSocialResolver, SocialIdentityResolver, SocialProvider};
use serde_json::json;

const GOOD_TOKEN: &str = "good-token";

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn kakao_me(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some(GOOD_TOKEN) => Json(json!({
            "id": 4242,
            "kakao_account": { "email": "alice@kakao.com" }
        }))
        .into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn naver_me(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some(GOOD_TOKEN) => Json(json!({
            "resultcode": "00",
            "response": { "id": "nv-77", "email": "bob@naver.com" }
        }))
        .into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn no_email() -> Json<serde_json::Value> {
    Json(json!({ "id": 1, "kakao_account": {} }))
}

async fn not_json() -> &'static str {
    "<html>oops</html>"
}

async fn slow() -> Json<serde_json::Value> {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!({ "id": 1, "kakao_account": { "email": "late@kakao.com" } }))
}

async fn start_stub() -> SocketAddr {
    let app = Router::new()
        .route("/v2/user/me", get(kakao_me))
        .route("/v1/nid/me", get(naver_me))
        .route("/no-email", get(no_email))
        .route("/not-json", get(not_json))
        .route("/slow", get(slow));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub provider");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub provider");
    });
    addr
}

fn resolver(addr: SocketAddr) -> HttpSocialResolver {
    HttpSocialResolver::new(Duration::from_millis(500))
        .expect("http client")
        .with_endpoint(SocialProvider::Kakao, format!("http://{addr}/v2/user/me"))
        .with_endpoint(SocialProvider::Naver, format!("http://{addr}/v1/nid/me"))
}

#[tokio::test]
async fn kakao_identity_resolved() {
    let addr = start_stub().await;
    let identity = resolver(addr)
        .resolve(SocialProvider::Kakao, GOOD_TOKEN)
        .await
        .expect("resolve");

    assert_eq!(identity.provider, "kakao");
    assert_eq!(identity.provider_id, "4242");
    assert_eq!(identity.email.as_deref(), Some("alice@kakao.com"));
}

#[tokio::test]
async fn naver_identity_resolved() {
    let addr = start_stub().await;
    let identity = resolver(addr)
        .resolve(SocialProvider::Naver, GOOD_TOKEN)
        .await
        .expect("resolve");

    assert_eq!(identity.username(), "naver_nv-77");
}

#[tokio::test]
async fn rejected_token_is_invalid_social_token() {
    let addr = start_stub().await;
    let err = resolver(addr)
        .resolve(SocialProvider::Kakao, "expired-token")
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::InvalidSocialToken(_)), "got {err:?}");
}

#[tokio::test]
async fn missing_email_is_invalid_social_token() {
    let addr = start_stub().await;
    let resolver = HttpSocialResolver::new(Duration::from_millis(500))
        .unwrap()
        .with_endpoint(SocialProvider::Kakao, format!("http://{addr}/no-email"));

    let err = resolver
        .resolve(SocialProvider::Kakao, GOOD_TOKEN)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidSocialToken(_)), "got {err:?}");
}

#[tokio::test]
async fn non_json_body_is_invalid_social_token() {
    let addr = start_stub().await;
    let resolver = HttpSocialResolver::new(Duration::from_millis(500))
        .unwrap()
        .with_endpoint(SocialProvider::Naver, format!("http://{addr}/not-json"));

    let err = resolver
        .resolve(SocialProvider::Naver, GOOD_TOKEN)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidSocialToken(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_provider_times_out() {
    let addr = start_stub().await;
    let resolver = HttpSocialResolver::new(Duration::from_millis(200))
        .unwrap()
        .with_endpoint(SocialProvider::Kakao, format!("http://{addr}/slow"));

    let started = std::time::Instant::now();
    let err = resolver
        .resolve(SocialProvider::Kakao, GOOD_TOKEN)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::InvalidSocialToken(_)), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn unreachable_provider_is_invalid_social_token() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = resolver(addr)
        .resolve(SocialProvider::Naver, GOOD_TOKEN)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidSocialToken(_)), "got {err:?}");
}
