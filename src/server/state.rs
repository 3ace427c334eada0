use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::constants::VIEW_CHANNEL_CAPACITY;
use crate::view::{MapView, ViewUpdate};

// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub view: Arc<Mutex<MapView>>,
    pub update_sender: broadcast::Sender<ViewUpdate>,
    pub public_dir: PathBuf,
}

impl AppState {
    pub fn new(view: MapView, public_dir: PathBuf) -> Self {
        let (update_sender, _) = broadcast::channel(VIEW_CHANNEL_CAPACITY);
        Self {
            view: Arc::new(Mutex::new(view)),
            update_sender,
            public_dir,
        }
    }

    /// One event-handling turn over the view.
    pub fn lock_view(&self) -> MutexGuard<'_, MapView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_update(&self) -> ViewUpdate {
        self.lock_view().update()
    }

    /// Pushes the current view to every stream subscriber.
    pub fn publish(&self) {
        let update = self.current_update();
        // No subscribers is fine
        let _ = self.update_sender.send(update);
    }

    /// Mounts the view and runs its single fetch in the background.
    ///
    /// The lock is not held across the fetch; the result re-enters through its
    /// ticket and is dropped if the view was remounted or torn down meanwhile.
    pub fn spawn_load(&self) -> JoinHandle<()> {
        let (ticket, source) = {
            let mut view = self.lock_view();
            (view.mount(), view.source().clone())
        };
        self.publish();

        let state = self.clone();
        tokio::spawn(async move {
            let result = source.load().await;
            let applied = state.lock_view().finish_load(ticket, result);
            if applied {
                state.publish();
            } else {
                debug!("load for {} finished after the view moved on", source);
            }
        })
    }

    pub fn shutdown(&self) {
        self.lock_view().unmount();
        self.publish();
    }
}
