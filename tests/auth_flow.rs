use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::get,
};
use backend::{
    AppState,
    config::Config,
    middleware::auth_middleware,
    routes,
    utils::{Claims, generate_token},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/pricewatch_test".to_string(),
        redis_url: "redis://127.0.0.1/".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        jwt_lifetime_secs: 3600,
        rate_limit_window_secs: 60,
        rate_limit_requests: 100,
        server_host: "127.0.0.1".to_string(),
        server_port: 3000,
        api_base_uri: "/api".to_string(),
    }
}

// 惰性连接池，握手不会发生，足够驱动不碰数据库的handler
fn test_state() -> AppState {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("lazy pool");
    let redis = Arc::new(redis::Client::open(config.redis_url.clone()).expect("redis client"));
    AppState {
        pool,
        config,
        redis,
    }
}

fn protected_app(state: AppState) -> Router {
    Router::new()
        .route("/users/check-token", get(routes::user::check_token))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

#[tokio::test]
async fn test_request_without_token_is_forbidden() {
    let app = protected_app(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users/check-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_request_with_garbage_token_is_forbidden() {
    let app = protected_app(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users/check-token")
                .header(header::AUTHORIZATION, "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_request_with_expired_token_is_forbidden() {
    let state = test_state();
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: "user-7".to_string(),
        exp: now - 7200,
        iat: now - 10800,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.config.jwt_secret.as_bytes()),
    )
    .unwrap();

    let app = protected_app(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/users/check-token")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_valid_token_resolves_to_embedded_user_id() {
    let state = test_state();
    let token = generate_token("user-7", &state.config).unwrap();

    let app = protected_app(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/users/check-token")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], 0);
    assert_eq!(body["resp_data"]["user_id"], "user-7");
}
