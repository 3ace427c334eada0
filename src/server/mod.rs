use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};
use tracing::info;

pub mod events;
pub mod handlers;
pub mod state;

pub use self::state::AppState;
use events::view_events_stream;
use handlers::{get_view, index_html, post_event, reload, script_js, style_css};

// Create the main application router
pub fn create_app(state: AppState) -> Router {
    // Images and the data file live in the public directory
    let public_files = ServeDir::new(&state.public_dir);

    Router::new()
        .route("/", get(index_html))
        .route("/style.css", get(style_css))
        .route("/script.js", get(script_js))
        .route("/api/view", get(get_view))
        .route("/api/view/stream", get(view_events_stream))
        .route("/api/events", post(post_event))
        .route("/api/reload", post(reload))
        .fallback_service(public_files)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(
    state: AppState,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_app(state.clone());
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server started at http://{}", addr);
    info!("  GET  /api/view        - current view model");
    info!("  GET  /api/view/stream - view updates (SSE)");
    info!("  POST /api/events      - marker/background/panel events");
    info!("  POST /api/reload      - fetch the location data again");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;

    state.shutdown();
    Ok(())
}
