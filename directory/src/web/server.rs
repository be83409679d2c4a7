// File: directory/src/web/server.rs
use crate::web::{handlers, AppState};
use anyhow::Result;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub async fn start_web_server(state: AppState) -> Result<()> {
    let addr = state.config.bind_address();
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // === SERVICE ROUTES ===
        .route(
            "/api/services",
            post(handlers::register_service).get(handlers::list_services),
        )
        .route(
            "/api/services/{service_id}",
            get(handlers::get_service)
                .put(handlers::update_service)
                .delete(handlers::delete_service),
        )
        .route(
            "/api/services/{service_id}/health",
            put(handlers::update_service_health),
        )
        .route(
            "/api/services/{service_id}/health-check",
            post(handlers::check_service_health),
        )
        .route(
            "/api/services/{service_id}/statistics",
            get(handlers::get_service_statistics),
        )
        .route(
            "/api/services/{service_id}/instances",
            get(handlers::list_service_instances),
        )
        .route(
            "/api/services/{service_id}/history",
            get(handlers::list_service_history),
        )
        // === SERVICE INSTANCE ROUTES ===
        .route(
            "/api/service-instances",
            post(handlers::create_service_instance),
        )
        .route(
            "/api/service-instances/{instance_id}",
            get(handlers::get_service_instance).delete(handlers::retire_service_instance),
        )
        .route(
            "/api/service-instances/{instance_id}/health",
            put(handlers::update_instance_health),
        )
        .route(
            "/api/service-instances/{instance_id}/health-check",
            post(handlers::check_instance_health),
        )
        .route(
            "/api/service-instances/{instance_id}/usage",
            post(handlers::record_instance_usage),
        )
        // Add middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
