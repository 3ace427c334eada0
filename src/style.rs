use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::constants::{FALLBACK_MARKER_COLOR, MARKER_FONT_SIZE_PX, MARKER_GLYPH};
use crate::model::MapData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleResolution {
    Mapped,
    /// Category had no entry in the style map.
    Fallback,
}

/// Marker label handed to the map canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerStyle {
    pub glyph: &'static str,
    pub color: String,
    pub font_size_px: u32,
    pub resolution: StyleResolution,
}

/// Resolves the label for a marker of `category`.
///
/// Pure: no logging here. Callers that care about gaps use [`style_gaps`].
pub fn resolve_marker_style(category: &str, style_map: &HashMap<String, String>) -> MarkerStyle {
    let (color, resolution) = match style_map.get(category) {
        Some(color) => (color.clone(), StyleResolution::Mapped),
        None => (FALLBACK_MARKER_COLOR.to_string(), StyleResolution::Fallback),
    };

    MarkerStyle {
        glyph: MARKER_GLYPH,
        color,
        font_size_px: MARKER_FONT_SIZE_PX,
        resolution,
    }
}

/// Distinct categories used by locations but missing from `styles.marker`, sorted.
pub fn style_gaps(data: &MapData) -> BTreeSet<&str> {
    let styles = &data.map_settings.styles.marker;
    data.locations
        .iter()
        .map(|l| l.category.as_str())
        .filter(|c| !styles.contains_key(*c))
        .collect()
}
