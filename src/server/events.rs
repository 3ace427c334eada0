use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::debug;

use super::state::AppState;
use crate::constants::KEEP_ALIVE_SECS;
use crate::view::ViewUpdate;

fn view_event(update: &ViewUpdate) -> SseEvent {
    SseEvent::default()
        .event("view")
        .id(update.revision.to_string())
        .json_data(update)
        .unwrap_or_else(|_| SseEvent::default().data("Error serializing view"))
}

// SSE endpoint: the current view first, then every change; idle connections get keep-alive comments
pub async fn view_events_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let (tx, rx) = mpsc::channel(16);

    // Subscribe before reading the current view so nothing falls in between
    let mut update_receiver = state.update_sender.subscribe();
    let initial = state.current_update();

    tokio::spawn(async move {
        if tx.send(Ok(view_event(&initial))).await.is_err() {
            return;
        }

        loop {
            let update = match update_receiver.recv().await {
                Ok(update) => update,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("view stream lagged by {} updates, resending current view", skipped);
                    state.current_update()
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if tx.send(Ok(view_event(&update))).await.is_err() {
                break; // Client disconnected
            }
        }
    });

    Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEP_ALIVE_SECS))
            .text("keepalive"),
    )
}
