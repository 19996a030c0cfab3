//! Prelude module for common vs30-map types and traits
//!
//! `use vs30_map::prelude::*;` brings in everything needed to build a view,
//! feed it stations and inspect what it rendered.

pub use crate::core::{
    builder::MapBuilder,
    config::ViewConfig,
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::{ClickTarget, Map, MapOptions, MapProvider},
    viewport::Viewport,
};

pub use crate::data::{
    collection::{Collection, ListenerId},
    feature::{Feature, FeatureCollection, FeatureProperties, PointGeometry},
    source::{fetch_features, DataFetcher, DataSource, HttpFetcher},
};

#[cfg(feature = "tokio-runtime")]
pub use crate::data::source::spawn_fetch;

pub use crate::layers::{
    marker::{CircleMarker, CircleMarkerStyle},
    tile::{default_base_layers, BaseLayer, TileLayer, TileLayerOptions},
};

pub use crate::spatial::clustering::{Cluster, ClusteringConfig, MarkerClusterGroup};

pub use crate::tiles::{TileCache, TileLoader, TileSource};

pub use crate::ui::{
    controls::{LayerControl, ScaleBar, ScaleControl},
    popup::PopupContent,
    table::{feature_table, DataTable, SortKey},
};

#[cfg(feature = "egui")]
pub use crate::ui::widget::MapPanel;

pub use crate::view::{render_features, ViewBuilder, Vs30View};

pub use crate::{MapError, Result};
