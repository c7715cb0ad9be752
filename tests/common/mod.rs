#![allow(dead_code)]

use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{AsyncDieselConnectionManager, bb8::Pool},
};
use rocketfood_service::{
    app_state::AppState,
    auth::{JwtKeys, ROLE_EMPLOYEE},
    config::{DatabaseConfig, JwtConfig},
    db, routes,
};
use serde_json::Value;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret";

pub fn jwt_keys() -> JwtKeys {
    JwtKeys::new(&JwtConfig {
        secret: JWT_SECRET.into(),
        ttl_minutes: 30,
    })
}

/// State whose pool never connects until a handler checks a connection out.
pub fn offline_state() -> AppState {
    let manager =
        AsyncDieselConnectionManager::<AsyncPgConnection>::new("postgres://nobody@127.0.0.1:1/none");
    let pool = Pool::builder()
        .connection_timeout(Duration::from_millis(250))
        .build_unchecked(manager);
    AppState::new(pool, jwt_keys())
}

pub async fn database_state(url: &str) -> anyhow::Result<AppState> {
    let pool = db::create_pool(&DatabaseConfig {
        url: url.to_owned(),
        max_connections: 4,
    })
    .await?;
    Ok(AppState::new(pool, jwt_keys()))
}

pub fn app(state: AppState) -> Router {
    let (router, _openapi) = routes::routes_with_openapi(&state).split_for_parts();
    router.with_state(state)
}

pub fn bearer(user_id: i32) -> String {
    let token = jwt_keys()
        .issue(user_id, "employee@rocketfood.test", ROLE_EMPLOYEE)
        .unwrap();
    format!("Bearer {token}")
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}
