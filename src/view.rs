use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::model::{LatLng, LocationId, MapData};
use crate::panel::DetailPanel;
use crate::selection::{MapEvent, Selection, SelectionController};
use crate::settings::{CredentialError, MapsCredential};
use crate::store::{DataSource, LoadError, LoadState, LoadTicket, LocationStore};
use crate::style::{resolve_marker_style, style_gaps, MarkerStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapType {
    Satellite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapControls {
    pub fullscreen: bool,
    pub street_view: bool,
    pub map_type: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    pub id: LocationId,
    pub position: LatLng,
    pub title: String,
    pub label: MarkerStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapScene {
    pub center: LatLng,
    pub zoom: u8,
    pub map_type: MapType,
    pub controls: MapControls,
    pub markers: Vec<MarkerView>,
    pub selection: Selection,
    pub panel: Option<DetailPanel>,
    pub loaded_at: DateTime<Utc>,
}

/// What the page should draw right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewModel {
    Loading,
    Unavailable { reason: String },
    MissingCredential { message: String },
    Map(MapScene),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewUpdate {
    pub revision: u64,
    pub view: ViewModel,
}

/// Composes the store and the selection controller into something renderable.
#[derive(Debug)]
pub struct MapView {
    store: LocationStore,
    selection: SelectionController,
    credential: Result<MapsCredential, CredentialError>,
    revision: u64,
}

impl MapView {
    pub fn new(source: DataSource, credential: Result<MapsCredential, CredentialError>) -> Self {
        if let Err(ref e) = credential {
            warn!("Map cannot be shown: {}", e);
        }
        Self {
            store: LocationStore::new(source),
            selection: SelectionController::new(),
            credential,
            revision: 0,
        }
    }

    pub fn source(&self) -> &DataSource {
        self.store.source()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn selection(&self) -> Selection {
        self.selection.state()
    }

    pub fn credential(&self) -> Option<&MapsCredential> {
        self.credential.as_ref().ok()
    }

    /// Starts a (re)mount. The selection survives until the new data is
    /// reconciled against it.
    pub fn mount(&mut self) -> LoadTicket {
        self.revision += 1;
        self.store.begin_load()
    }

    /// Applies a load result; stale tickets are ignored.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<MapData, LoadError>) -> bool {
        if !self.store.finish_load(ticket, result) {
            return false;
        }
        if let Some(data) = self.store.data() {
            for category in style_gaps(data) {
                warn!(
                    "No marker color for category '{}', using fallback color",
                    category
                );
            }
            self.selection.reconcile(data);
        }
        self.revision += 1;
        true
    }

    pub fn unmount(&mut self) {
        self.store.unmount();
        self.selection.clear();
        self.revision += 1;
    }

    /// Routes one gesture to the controller. Returns `true` if the view changed.
    pub fn handle(&mut self, event: MapEvent) -> bool {
        let Some(data) = self.store.data() else {
            warn!("Ignoring {:?} before location data is loaded", event);
            return false;
        };
        let changed = self.selection.dispatch(event, data);
        if changed {
            self.revision += 1;
        }
        changed
    }

    pub fn render(&self) -> ViewModel {
        match self.store.state() {
            LoadState::NotLoaded => ViewModel::Loading,
            LoadState::Failed(reason) => ViewModel::Unavailable {
                reason: reason.clone(),
            },
            LoadState::Loaded { data, loaded_at } => match &self.credential {
                Err(e) => ViewModel::MissingCredential {
                    message: e.to_string(),
                },
                Ok(_) => ViewModel::Map(self.scene(data, *loaded_at)),
            },
        }
    }

    pub fn update(&self) -> ViewUpdate {
        ViewUpdate {
            revision: self.revision,
            view: self.render(),
        }
    }

    fn scene(&self, data: &Arc<MapData>, loaded_at: DateTime<Utc>) -> MapScene {
        let settings = &data.map_settings;
        let markers = data
            .locations
            .iter()
            .map(|location| MarkerView {
                id: location.id,
                position: location.position(),
                title: location.name.clone(),
                label: resolve_marker_style(&location.category, &settings.styles.marker),
            })
            .collect();

        MapScene {
            center: settings.default_center,
            zoom: settings.default_zoom,
            map_type: MapType::Satellite,
            controls: MapControls {
                fullscreen: true,
                street_view: true,
                map_type: true,
            },
            markers,
            selection: self.selection.state(),
            panel: self.selection.selected(data).map(DetailPanel::assemble),
            loaded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FALLBACK_MARKER_COLOR;
    use crate::model::fixtures::{lighthouse, location, map_data};
    use std::path::PathBuf;

    fn view() -> MapView {
        MapView::new(
            DataSource::File(PathBuf::from("unused.json")),
            MapsCredential::new(Some("test-key")),
        )
    }

    fn loaded(data: MapData) -> MapView {
        let mut view = view();
        let ticket = view.mount();
        assert!(view.finish_load(ticket, Ok(data)));
        view
    }

    fn scene(view: &MapView) -> MapScene {
        match view.render() {
            ViewModel::Map(scene) => scene,
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn loading_until_data_arrives() {
        let mut view = view();
        assert_eq!(view.render(), ViewModel::Loading);
        view.mount();
        assert_eq!(view.render(), ViewModel::Loading);
    }

    #[test]
    fn events_before_load_are_ignored() {
        let mut view = view();
        view.mount();
        assert!(!view.handle(MapEvent::MarkerClicked { id: 1 }));
        assert_eq!(view.selection(), Selection::None);
    }

    #[test]
    fn empty_dataset_renders_bare_map() {
        let scene = scene(&loaded(map_data(vec![])));
        assert!(scene.markers.is_empty());
        assert!(scene.panel.is_none());
        assert_eq!(scene.center, LatLng { lat: 10.0, lng: 20.0 });
        assert_eq!(scene.zoom, 12);
        assert_eq!(scene.map_type, MapType::Satellite);
    }

    #[test]
    fn uncovered_category_still_gets_a_marker() {
        let view = loaded(map_data(vec![lighthouse(), location(2, "unstyled")]));
        let scene = scene(&view);
        assert_eq!(scene.markers.len(), 2);
        assert_eq!(scene.markers[0].label.color, "#ff0000");
        assert_eq!(scene.markers[1].id, 2);
        assert_eq!(scene.markers[1].label.color, FALLBACK_MARKER_COLOR);
    }

    #[test]
    fn lighthouse_click_then_close() {
        let mut view = loaded(map_data(vec![lighthouse()]));
        assert!(scene(&view).panel.is_none());

        assert!(view.handle(MapEvent::MarkerClicked { id: 1 }));
        let panel = scene(&view).panel.expect("panel after marker click");
        assert_eq!(panel.title, "Lighthouse");
        assert_eq!(panel.body, "An old lighthouse");
        let srcs: Vec<&str> = panel.images.iter().map(|i| i.src.as_str()).collect();
        assert_eq!(srcs, vec!["a.jpg", "b.jpg"]);
        assert_eq!(panel.anchor, LatLng { lat: 10.0, lng: 20.0 });

        assert!(view.handle(MapEvent::PanelClosed));
        let scene = scene(&view);
        assert!(scene.panel.is_none());
        assert_eq!(scene.selection, Selection::None);
    }

    #[test]
    fn background_click_closes_panel() {
        let mut view = loaded(map_data(vec![lighthouse(), location(2, "landmark")]));
        view.handle(MapEvent::MarkerClicked { id: 2 });
        assert_eq!(scene(&view).panel.map(|p| p.location_id), Some(2));
        view.handle(MapEvent::BackgroundClicked);
        assert!(scene(&view).panel.is_none());
    }

    #[test]
    fn failed_fetch_never_renders_a_map() {
        let mut view = view();
        let ticket = view.mount();
        view.finish_load(ticket, Err(LoadError::Network("offline".to_string())));
        match view.render() {
            ViewModel::Unavailable { reason } => assert!(reason.contains("offline")),
            other => panic!("expected placeholder, got {:?}", other),
        }
        assert!(!view.handle(MapEvent::BackgroundClicked));
    }

    #[test]
    fn missing_credential_is_explicit() {
        let mut view = MapView::new(
            DataSource::File(PathBuf::from("unused.json")),
            MapsCredential::new(None),
        );
        let ticket = view.mount();
        view.finish_load(ticket, Ok(map_data(vec![lighthouse()])));
        assert!(matches!(view.render(), ViewModel::MissingCredential { .. }));
    }

    #[test]
    fn reload_without_selected_id_clears_selection() {
        let mut view = loaded(map_data(vec![lighthouse()]));
        view.handle(MapEvent::MarkerClicked { id: 1 });

        let ticket = view.mount();
        view.finish_load(ticket, Ok(map_data(vec![location(2, "landmark")])));

        let scene = scene(&view);
        assert_eq!(scene.selection, Selection::None);
        assert!(scene.panel.is_none());
    }

    #[test]
    fn equal_reload_keeps_selection() {
        let mut view = loaded(map_data(vec![lighthouse()]));
        view.handle(MapEvent::MarkerClicked { id: 1 });

        let ticket = view.mount();
        view.finish_load(ticket, Ok(map_data(vec![lighthouse()])));
        assert_eq!(scene(&view).panel.map(|p| p.location_id), Some(1));
    }

    #[test]
    fn late_result_after_unmount_is_dropped() {
        let mut view = view();
        let ticket = view.mount();
        view.unmount();
        assert!(!view.finish_load(ticket, Ok(map_data(vec![lighthouse()]))));
        assert_eq!(view.render(), ViewModel::Loading);
    }

    #[test]
    fn revision_moves_only_on_change() {
        let mut view = loaded(map_data(vec![lighthouse()]));
        let start = view.revision();
        view.handle(MapEvent::BackgroundClicked);
        assert_eq!(view.revision(), start);
        view.handle(MapEvent::MarkerClicked { id: 1 });
        assert_eq!(view.revision(), start + 1);
        assert_eq!(view.update().revision, start + 1);
    }

    #[test]
    fn view_model_json_shape() {
        let mut view = loaded(map_data(vec![lighthouse()]));
        view.handle(MapEvent::MarkerClicked { id: 1 });
        let json = serde_json::to_value(view.render()).unwrap();
        assert_eq!(json["status"], "map");
        assert_eq!(json["map_type"], "satellite");
        assert_eq!(json["markers"][0]["label"]["glyph"], "●");
        assert_eq!(json["selection"]["state"], "selected");
        assert_eq!(json["selection"]["id"], 1);
        assert_eq!(json["panel"]["width"], 512);

        assert_eq!(serde_json::to_value(ViewModel::Loading).unwrap()["status"], "loading");
    }
}
