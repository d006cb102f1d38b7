//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the API router with versioned endpoints
    let api_v1 = Router::new()
        // Class lifecycle
        .route("/classes", post(handlers::create_class))
        .route("/classes", get(handlers::list_classes))
        .route("/classes/{class_id}", get(handlers::get_class))
        .route("/classes/{class_id}", put(handlers::update_class))
        .route("/classes/{class_id}", delete(handlers::delete_class))
        .route("/classes/{class_id}/status", patch(handlers::update_class_status))
        // Instance operations
        .route("/classes/{class_id}/instances", get(handlers::instances_for_class))
        .route("/classes/{class_id}/instances", patch(handlers::update_all_instances))
        .route(
            "/classes/{class_id}/instances/regenerate",
            post(handlers::regenerate_instances),
        )
        .route(
            "/classes/{class_id}/instances/by-details",
            put(handlers::update_instance_by_details),
        )
        .route("/instances", get(handlers::list_instances))
        .route("/instances/{instance_id}", put(handlers::update_instance))
        .route(
            "/instances/{instance_id}/status",
            patch(handlers::update_instance_status),
        )
        // Calendar
        .route("/calendar", get(handlers::calendar_view));

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let repo =
            Arc::new(LocalRepository::new()) as Arc<dyn crate::db::repository::FullRepository>;
        let state = AppState::new(repo);
        let _router = create_router(state);
        // If we got here, router was created successfully
    }
}
