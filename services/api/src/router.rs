//! Axum Router Configuration
//!
//! This module defines the HTTP routing for the companion service, its CORS
//! policy, and the OpenAPI documentation.

use crate::{
    handlers,
    models::{CompanionPayload, CompanionReply, ErrorResponse},
    state::AppState,
};

use axum::{
    Router,
    http::{Method, header},
    routing::post,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::companion),
    components(schemas(CompanionPayload, CompanionReply, ErrorResponse)),
    tags(
        (name = "Math Buddy API", description = "Study buddy messages for early-math lessons")
    )
)]
pub struct ApiDoc;

/// Permissive CORS: any origin, `POST` and `OPTIONS`, `Content-Type`.
/// Preflight `OPTIONS` requests are answered by this layer.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/companion",
            post(handlers::companion).fallback(handlers::method_not_allowed),
        )
        .with_state(app_state)
        .layer(cors_layer())
}
