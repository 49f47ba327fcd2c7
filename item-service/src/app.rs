use std::sync::Arc;

use axum::extract::FromRef;
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use axum::routing::get;
use axum::{Json, Router};
use common_auth::{ApiKeyGate, TokenVerifier};
use serde::Serialize;
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::item_handlers::{create_item, delete_item, list_items, read_item, update_item};
use crate::user_handlers::read_user_me;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub verifier: Arc<TokenVerifier>,
    pub api_key: Arc<ApiKeyGate>,
}

impl AppState {
    pub fn new(db: PgPool, verifier: Arc<TokenVerifier>, api_key: Arc<ApiKeyGate>) -> Self {
        Self {
            db,
            verifier,
            api_key,
        }
    }
}

impl FromRef<AppState> for Arc<TokenVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.verifier.clone()
    }
}

impl FromRef<AppState> for Arc<ApiKeyGate> {
    fn from_ref(state: &AppState) -> Self {
        state.api_key.clone()
    }
}

#[derive(Serialize)]
struct HelloWorld {
    message: String,
}

async fn hello_world() -> Json<HelloWorld> {
    Json(HelloWorld {
        message: "Hello, World!".to_string(),
    })
}

async fn health() -> &'static str {
    "ok"
}

pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let cors = cors_layer(cors_origins);

    Router::new()
        .route("/healthz", get(health))
        .route("/hello", get(hello_world))
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/:id",
            get(read_item).put(update_item).delete(delete_item),
        )
        .route("/users/me", get(read_user_me))
        .with_state(state)
        .layer(cors)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            ACCEPT,
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
        ])
}
