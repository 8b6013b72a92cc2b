//! Loan Tracker: personal loan-payment tracking API.
//!
//! Library crate shared by the `loan-tracker` binary and the integration tests in `tests/`.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod store;

use std::sync::Arc;

use axum::http::{header, Method};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use auth::credentials::CredentialService;
use auth::token::TokenService;
use middleware::ownership::OwnershipGuard;
use store::repository::PaymentRepository;
use store::{PaymentStore, UserStore};

/// Shared application state passed to handlers and middleware.
/// Store handles are injected here; nothing reaches for a global connection.
pub struct AppState {
    pub config: config::Config,
    pub tokens: TokenService,
    pub credentials: CredentialService,
    pub payments: PaymentRepository,
    pub guard: OwnershipGuard,
}

impl AppState {
    pub fn new(
        config: config::Config,
        users: Arc<dyn UserStore>,
        payments: Arc<dyn PaymentStore>,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt_secret);
        let credentials = CredentialService::new(users, tokens.clone());
        let payments = PaymentRepository::new(payments);
        let guard = OwnershipGuard::new(payments.clone());
        Self {
            config,
            tokens,
            credentials,
            payments,
            guard,
        }
    }
}

/// The full HTTP application: `/api` routes plus CORS, tracing, request ids
/// and security headers.
pub fn app(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .nest("/api", api::api_router(state.clone()))
        .fallback(|| async { axum::http::StatusCode::NOT_FOUND })
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors_layer(state.config.cors_origin.clone()))
                .layer(axum::middleware::from_fn(
                    middleware::headers::security_headers,
                )),
        )
        .with_state(state)
}

/// Allow the configured UI origin plus any localhost origin (dev servers).
fn cors_layer(ui_origin: Option<String>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            let origin = origin.to_str().unwrap_or("");
            ui_origin.as_deref() == Some(origin)
                || origin.starts_with("http://localhost:")
                || origin.starts_with("http://127.0.0.1:")
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
