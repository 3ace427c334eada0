use anyhow::Result;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod constants;
mod html_template;
mod model;
mod panel;
mod selection;
mod server;
mod settings;
mod store;
mod style;
mod utils;
mod view;

use server::{start_server, AppState};
use settings::Settings;
use view::MapView;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        // Without a signal handler the server simply runs until killed
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("poimap=info,tower_http=info")),
        )
        .init();

    info!("PoiMap v{} starting", env!("CARGO_PKG_VERSION"));

    if !Settings::config_path().exists() {
        match Settings::default().save() {
            Ok(()) => info!("Wrote default configuration to {}", Settings::config_path().display()),
            Err(e) => warn!("Could not write default configuration: {:#}", e),
        }
    }
    let settings = Settings::load()?;

    let source = settings.data_source();
    info!("Location data source: {}", source);

    let view = MapView::new(source, settings.credential());
    let state = AppState::new(view, PathBuf::from(&settings.public_dir));

    // Single fetch for this mount
    state.spawn_load();

    if settings.auto_open_browser {
        let url = format!("http://127.0.0.1:{}", settings.port);
        if let Err(e) = utils::open_browser(&url) {
            warn!("Failed to open browser at {}: {}", url, e);
        }
    }

    start_server(state, settings.port, shutdown_signal()).await
}
