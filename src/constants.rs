// Port configuration
pub const DEFAULT_PORT: u16 = 3001;

// Data locations
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const DEFAULT_DATA_FILE: &str = "public/data/locations.json";

// Marker label
pub const MARKER_GLYPH: &str = "●";
pub const MARKER_FONT_SIZE_PX: u32 = 20;
// Used when a category has no entry in `styles.marker`
pub const FALLBACK_MARKER_COLOR: &str = "#9e9e9e";

// Detail panel: width is fixed, content wraps inside it
pub const PANEL_WIDTH: u32 = 512;
pub const PANEL_IMAGE_WIDTH: u32 = 240;
pub const PANEL_IMAGE_HEIGHT: u32 = 160;

// Credential lookup, first non-blank wins
pub const API_KEY_ENV_VARS: &[&str] = &["POIMAP_MAPS_API_KEY", "GOOGLE_MAPS_API_KEY"];

// SSE
pub const VIEW_CHANNEL_CAPACITY: usize = 64;
pub const KEEP_ALIVE_SECS: u64 = 15;
