use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use rust_embed::RustEmbed;
use tracing::info;

use super::state::AppState;
use crate::html_template::render_index;
use crate::selection::MapEvent;
use crate::view::ViewUpdate;

#[derive(RustEmbed)]
#[folder = "frontend/"]
struct Asset;

fn embedded(path: &str, content_type: &'static str) -> Result<Response, StatusCode> {
    let file = Asset::get(path).ok_or(StatusCode::NOT_FOUND)?;
    Ok(([(header::CONTENT_TYPE, content_type)], file.data.into_owned()).into_response())
}

pub async fn index_html(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let template = Asset::get("index.html").ok_or(StatusCode::NOT_FOUND)?;
    let template = String::from_utf8_lossy(&template.data);
    let view = state.lock_view();
    Ok(render_index(&template, view.credential()))
}

pub async fn style_css() -> Result<Response, StatusCode> {
    embedded("style.css", "text/css")
}

pub async fn script_js() -> Result<Response, StatusCode> {
    embedded("script.js", "application/javascript")
}

// API endpoint for the current view
pub async fn get_view(State(state): State<AppState>) -> Json<ViewUpdate> {
    Json(state.current_update())
}

// API endpoint for user gestures: marker click, background click, panel close
pub async fn post_event(
    State(state): State<AppState>,
    Json(event): Json<MapEvent>,
) -> Json<ViewUpdate> {
    let changed = state.lock_view().handle(event);
    if changed {
        state.publish();
    }
    Json(state.current_update())
}

// API endpoint to remount the view and fetch the data again
pub async fn reload(State(state): State<AppState>) -> Json<serde_json::Value> {
    info!("Reloading location data");
    state.spawn_load();
    Json(serde_json::json!({
        "status": "started",
        "message": "Reloading location data"
    }))
}
