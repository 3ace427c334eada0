use serde::Serialize;

use crate::constants::{PANEL_IMAGE_HEIGHT, PANEL_IMAGE_WIDTH, PANEL_WIDTH};
use crate::model::{LatLng, Location, LocationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFit {
    Cover,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelImage {
    pub src: String,
    pub width: u32,
    pub height: u32,
    pub fit: ImageFit,
}

impl PanelImage {
    fn new(src: &str) -> Self {
        Self {
            src: src.to_string(),
            width: PANEL_IMAGE_WIDTH,
            height: PANEL_IMAGE_HEIGHT,
            fit: ImageFit::Cover,
        }
    }
}

/// Payload for the overlay shown over the selected location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailPanel {
    pub location_id: LocationId,
    pub title: String,
    pub body: String,
    pub images: Vec<PanelImage>,
    pub anchor: LatLng,
    pub width: u32,
}

impl DetailPanel {
    /// Builds the panel straight from the location; blank image URIs are skipped.
    pub fn assemble(location: &Location) -> Self {
        let images = [&location.image1, &location.image2]
            .into_iter()
            .map(|src| src.trim())
            .filter(|src| !src.is_empty())
            .map(PanelImage::new)
            .collect();

        Self {
            location_id: location.id,
            title: location.name.clone(),
            body: location.tooltip.clone(),
            images,
            anchor: location.position(),
            width: PANEL_WIDTH,
        }
    }
}
