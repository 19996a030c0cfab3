//! Fluent construction of a [`Map`]

use crate::{
    core::{
        config::ViewConfig,
        geo::{LatLng, Point},
        map::{Map, MapOptions, MapProvider},
        viewport::Viewport,
    },
    layers::tile::{default_base_layers, BaseLayer},
    spatial::clustering::ClusteringConfig,
};

pub struct MapBuilder {
    center: LatLng,
    zoom: f64,
    size: Point,
    map_options: MapOptions,
    clustering: ClusteringConfig,
    base_layers: Vec<BaseLayer>,
    active_layer: usize,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self {
            center: LatLng::default(),
            zoom: 1.0,
            size: Point::new(800.0, 600.0),
            map_options: MapOptions::default(),
            clustering: ClusteringConfig::default(),
            base_layers: Vec::new(),
            active_layer: 0,
        }
    }

    /// Starts from the viewport and clustering settings of a view config
    pub fn from_config(config: &ViewConfig) -> Self {
        Self::new()
            .with_center_and_zoom(config.initial_center, config.initial_zoom)
            .with_size(config.viewport_size)
            .with_zoom_limits(Some(config.min_zoom), Some(config.max_zoom))
            .with_clustering(config.clustering)
    }

    pub fn with_center_and_zoom(mut self, center: LatLng, zoom: f64) -> Self {
        self.center = center;
        self.zoom = zoom;
        self
    }

    pub fn with_size(mut self, size: Point) -> Self {
        self.size = size;
        self
    }

    pub fn with_map_options(mut self, options: MapOptions) -> Self {
        self.map_options = options;
        self
    }

    pub fn with_dragging(mut self, enabled: bool) -> Self {
        self.map_options.dragging = enabled;
        self
    }

    pub fn with_scroll_wheel_zoom(mut self, enabled: bool) -> Self {
        self.map_options.scroll_wheel_zoom = enabled;
        self
    }

    pub fn with_zoom_limits(mut self, min_zoom: Option<f64>, max_zoom: Option<f64>) -> Self {
        self.map_options.min_zoom = min_zoom;
        self.map_options.max_zoom = max_zoom;
        self
    }

    pub fn with_attribution_control(mut self, enabled: bool) -> Self {
        self.map_options.attribution_control = enabled;
        self
    }

    pub fn with_scale_control(mut self, enabled: bool) -> Self {
        self.map_options.scale_control = enabled;
        self
    }

    pub fn with_clustering(mut self, clustering: ClusteringConfig) -> Self {
        self.clustering = clustering;
        self
    }

    /// Adds a base layer; the first one added is active unless
    /// [`with_active_layer`](Self::with_active_layer) says otherwise
    pub fn with_base_layer(mut self, layer: BaseLayer) -> Self {
        self.base_layers.push(layer);
        self
    }

    /// Terrain, street, greyscale and satellite, terrain active
    pub fn with_default_base_layers(mut self) -> Self {
        self.base_layers.extend(default_base_layers());
        self
    }

    pub fn with_active_layer(mut self, index: usize) -> Self {
        self.active_layer = index;
        self
    }

    pub fn build(self) -> Map {
        let viewport = Viewport::new(self.center, self.zoom, self.size);
        let mut map = Map::with_options(viewport, self.map_options, self.clustering);
        for (i, layer) in self.base_layers.into_iter().enumerate() {
            map.add_base_layer(layer, i == self.active_layer);
        }
        map
    }
}

impl Default for MapBuilder {
    fn default() -> Self {
        Self::new()
    }
}
