use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::{Location, LocationId, MapData};

/// Which location, if any, has its detail panel open.
///
/// Holds an id rather than a copy so it stays valid across equal reloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    None,
    Selected(LocationId),
}

impl Selection {
    pub fn id(&self) -> Option<LocationId> {
        match self {
            Selection::None => None,
            Selection::Selected(id) => Some(*id),
        }
    }
}

/// A single user gesture, already classified by the map library's hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
    MarkerClicked { id: LocationId },
    BackgroundClicked,
    PanelClosed,
}

#[derive(Debug, Default)]
pub struct SelectionController {
    state: Selection,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Selection {
        self.state
    }

    /// Replaces whatever is selected with `location`.
    pub fn select(&mut self, location: &Location) {
        self.state = Selection::Selected(location.id);
    }

    pub fn clear(&mut self) {
        self.state = Selection::None;
    }

    /// Applies one gesture. Returns `true` if the selection changed.
    pub fn dispatch(&mut self, event: MapEvent, data: &MapData) -> bool {
        let before = self.state;
        match event {
            MapEvent::MarkerClicked { id } => match data.find(id) {
                Some(location) => self.select(location),
                None => warn!("Ignoring click on unknown marker id {}", id),
            },
            MapEvent::BackgroundClicked | MapEvent::PanelClosed => self.clear(),
        }
        debug!(?event, from = ?before, to = ?self.state, "selection event");
        before != self.state
    }

    /// Drops a selection whose id is no longer present in `data`.
    pub fn reconcile(&mut self, data: &MapData) -> bool {
        match self.state {
            Selection::Selected(id) if !data.contains(id) => {
                info!("Selected location {} no longer exists, clearing selection", id);
                self.clear();
                true
            }
            _ => false,
        }
    }

    /// Looks the selected id up in `data`.
    pub fn selected<'a>(&self, data: &'a MapData) -> Option<&'a Location> {
        self.state.id().and_then(|id| data.find(id))
    }
}
