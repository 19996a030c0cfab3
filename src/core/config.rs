//! Configuration for a station view
//!
//! Every field has a default, so a config file only needs the keys it
//! changes. [`crate::view::ViewBuilder`] overrides individual fields on top.

use crate::{
    core::{
        constants::{DEFAULT_FIT_PADDING, DEFAULT_MAX_ZOOM},
        geo::{LatLng, Point},
    },
    layers::marker::CircleMarkerStyle,
    spatial::clustering::ClusteringConfig,
    MapError, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// GeoJSON endpoint; unused when features are supplied directly
    pub url: Option<String>,
    pub show_table: bool,
    pub clustering: ClusteringConfig,
    pub marker: CircleMarkerStyle,
    /// Pixels kept clear on each side when fitting to the stations
    pub fit_padding: f64,
    pub viewport_size: Point,
    /// View shown before any data has been rendered
    pub initial_center: LatLng,
    pub initial_zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Decoded tiles kept by the GUI surface
    pub tile_cache_size: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            url: None,
            show_table: true,
            clustering: ClusteringConfig::default(),
            marker: CircleMarkerStyle::default(),
            fit_padding: DEFAULT_FIT_PADDING,
            viewport_size: Point::new(800.0, 600.0),
            initial_center: LatLng::new(0.0, 0.0),
            initial_zoom: 1.0,
            min_zoom: 0.0,
            max_zoom: DEFAULT_MAX_ZOOM,
            tile_cache_size: 512,
        }
    }
}

impl ViewConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ViewConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        log::debug!("loading view config from {}", path.display());
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.viewport_size.x <= 0.0 || self.viewport_size.y <= 0.0 {
            return Err(MapError::Config(format!(
                "viewport size must be positive, got {}x{}",
                self.viewport_size.x, self.viewport_size.y
            )));
        }
        if !(0.0..=DEFAULT_MAX_ZOOM).contains(&self.min_zoom) || self.min_zoom > self.max_zoom {
            return Err(MapError::Config(format!(
                "invalid zoom range {}..={}",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.fit_padding < 0.0 || self.clustering.max_cluster_radius < 0.0 {
            return Err(MapError::Config(
                "fit padding and cluster radius must not be negative".to_string(),
            ));
        }
        if self.marker.radius <= 0.0 {
            return Err(MapError::Config("marker radius must be positive".to_string()));
        }
        Ok(())
    }
}
