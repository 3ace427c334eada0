use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type LocationId = i64;

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

// One point of interest as it appears in the data file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub tooltip: String,
    pub category: String,
    #[serde(default)]
    pub image1: String,
    #[serde(default)]
    pub image2: String,
}

impl Location {
    pub fn position(&self) -> LatLng {
        LatLng {
            lat: self.latitude,
            lng: self.longitude,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapStyles {
    /// Category name -> CSS color string.
    #[serde(default)]
    pub marker: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSettings {
    pub default_center: LatLng,
    pub default_zoom: u8,
    #[serde(default)]
    pub styles: MapStyles,
}

/// The whole dataset, loaded as one snapshot and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapData {
    pub locations: Vec<Location>,
    pub map_settings: MapSettings,
}

impl MapData {
    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn find(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn contains(&self, id: LocationId) -> bool {
        self.find(id).is_some()
    }
}
