use anyhow::Result;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::web::{handlers, AppState};

pub async fn start_web_server(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Command API running on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // === NODE ADMINISTRATION ===
        .route(
            "/api/owners/{owner}/nodes",
            get(handlers::list_nodes).post(handlers::add_node),
        )
        .route(
            "/api/owners/{owner}/nodes/{ordinal}",
            delete(handlers::delete_node),
        )
        // === STATUS ===
        .route("/api/owners/{owner}/check", post(handlers::check_now))
        .route("/api/owners/{owner}/status", get(handlers::cached_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
