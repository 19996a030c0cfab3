//! # vs30-map
//!
//! Station map for Vs30 soil-stiffness datasets.
//!
//! A GeoJSON feature collection of seismic stations is projected onto a
//! tiled map as clustered circle markers with popups, optionally paired with
//! a sortable table. The map surface is an injected [`MapProvider`], so the
//! whole view runs headless in tests and behind an egui widget in the viewer.

pub mod core;
pub mod data;
pub mod layers;
pub mod prelude;
pub mod spatial;
pub mod tiles;
pub mod ui;
pub mod view;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::ViewConfig,
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::{Map, MapProvider},
    viewport::Viewport,
};

pub use data::{
    collection::Collection,
    feature::{Feature, FeatureCollection, FeatureProperties},
    source::{DataFetcher, DataSource, HttpFetcher},
};

pub use layers::{marker::CircleMarker, tile::BaseLayer};

pub use spatial::clustering::{Cluster, ClusteringConfig, MarkerClusterGroup};

pub use ui::{popup::PopupContent, table::DataTable};

pub use view::{ViewBuilder, Vs30View};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Error type alias for convenience
pub type Error = MapError;
