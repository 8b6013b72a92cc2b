use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use crate::middleware::auth::require_auth;
use crate::AppState;

pub mod auth;
pub mod payments;

/// Build the `/api` router.
/// All routes are relative; the caller mounts this under `/api`.
pub fn api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route(
            "/payments",
            get(payments::list_payments).post(payments::create_payment),
        )
        .route("/payments/status", get(payments::payment_statuses))
        .route("/payments/summary", get(payments::loan_summary))
        .route(
            "/payments/:id",
            put(payments::update_payment).delete(payments::delete_payment),
        )
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .fallback(fallback_404)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "Server is running!" }))
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}
