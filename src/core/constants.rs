//! Core constants derived from Leaflet defaults and the station-map defaults.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Web Mercator sphere radius in metres (EPSG:3857).
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude limit of the Web Mercator projection.
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Highest zoom level any base layer serves.
pub const DEFAULT_MAX_ZOOM: f64 = 18.0;

/// Default padding (pixels) kept around fitted bounds.
pub const DEFAULT_FIT_PADDING: f64 = 0.0;

/// Station marker radius in pixels.
pub const MARKER_RADIUS: f64 = 8.0;

/// Station marker stroke width in pixels.
pub const MARKER_WEIGHT: f64 = 2.0;

/// Station marker stroke opacity.
pub const MARKER_OPACITY: f32 = 0.8;

/// Station marker fill opacity.
pub const MARKER_FILL_OPACITY: f32 = 0.6;

/// Fallback marker colour when a feature carries none (Leaflet's default blue).
pub const DEFAULT_MARKER_COLOR: &str = "#3388ff";

/// Maximum distance in pixels a marker may be from a cluster centre.
pub const CLUSTER_RADIUS: f64 = 60.0;

/// Zoom level at and above which markers are never clustered.
pub const DISABLE_CLUSTERING_AT_ZOOM: f64 = 9.0;

/// Maximum width of the scale control in pixels.
pub const SCALE_MAX_WIDTH: f64 = 100.0;

/// Text shown for any absent popup value.
pub const MISSING_VALUE: &str = "N/A";
