use crate::{
    core::{
        geo::{LatLng, LatLngBounds, Point},
        viewport::Viewport,
    },
    layers::{marker::CircleMarker, tile::BaseLayer},
    spatial::clustering::{Cluster, ClusteringConfig, MarkerClusterGroup},
    ui::{
        controls::{LayerControl, ScaleBar, ScaleControl},
        popup::PopupContent,
    },
    Result,
};

/// Pixel radius of a multi-marker cluster symbol
pub const CLUSTER_ICON_RADIUS: f64 = 20.0;

/// The mapping surface a view draws into.
///
/// [`Map`] is the built-in implementation; tests and embedders can supply
/// their own.
pub trait MapProvider: Send {
    /// Registers a base layer with the layer switcher
    fn add_base_layer(&mut self, layer: BaseLayer, active: bool);

    /// Removes every marker from the clustering layer
    fn clear_markers(&mut self);

    fn add_marker(&mut self, marker: CircleMarker);

    /// Moves the viewport so that `bounds` is fully visible
    fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: f64) -> Result<()>;

    fn markers(&self) -> &[CircleMarker];

    fn marker_count(&self) -> usize {
        self.markers().len()
    }

    fn viewport(&self) -> &Viewport;
}

#[derive(Debug, Clone)]
pub struct MapOptions {
    pub dragging: bool,
    pub scroll_wheel_zoom: bool,
    pub double_click_zoom: bool,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    pub attribution_control: bool,
    pub scale_control: bool,
    pub zoom_delta: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            dragging: true,
            scroll_wheel_zoom: true,
            double_click_zoom: true,
            min_zoom: None,
            max_zoom: None,
            attribution_control: true,
            scale_control: true,
            zoom_delta: 1.0,
        }
    }
}

/// What a click on the map hit
#[derive(Debug, Clone, PartialEq)]
pub enum ClickTarget {
    /// A single marker; its popup is now open
    Marker(usize),
    /// A cluster; the map zoomed to its bounds
    Cluster(usize),
    Nothing,
}

/// Headless map: viewport, base-layer switcher, scale control and a marker
/// clustering layer. Holds no rendering resources.
pub struct Map {
    viewport: Viewport,
    options: MapOptions,
    layer_control: LayerControl,
    scale_control: ScaleControl,
    markers: MarkerClusterGroup,
    open_popup: Option<usize>,
}

impl Map {
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self::with_options(
            Viewport::new(center, zoom, size),
            MapOptions::default(),
            ClusteringConfig::default(),
        )
    }

    pub fn with_options(viewport: Viewport, options: MapOptions, clustering: ClusteringConfig) -> Self {
        let mut map = Self {
            viewport,
            options,
            layer_control: LayerControl::new(),
            scale_control: ScaleControl::default(),
            markers: MarkerClusterGroup::new(clustering),
            open_popup: None,
        };

        if let (Some(min), Some(max)) = (map.options.min_zoom, map.options.max_zoom) {
            map.viewport.set_zoom_limits(min, max);
        }

        map
    }

    pub fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.viewport.set_view(center, zoom);
    }

    pub fn pan(&mut self, delta: Point) {
        if self.options.dragging {
            self.viewport.pan(delta);
        }
    }

    pub fn zoom_to(&mut self, zoom: f64, focus_point: Option<Point>) {
        self.viewport.zoom_to(zoom, focus_point);
    }

    pub fn zoom_in(&mut self, focus_point: Option<Point>) {
        self.zoom_to(self.viewport.zoom + self.options.zoom_delta, focus_point);
    }

    pub fn zoom_out(&mut self, focus_point: Option<Point>) {
        self.zoom_to(self.viewport.zoom - self.options.zoom_delta, focus_point);
    }

    pub fn set_size(&mut self, size: Point) {
        self.viewport.set_size(size);
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn select_base_layer(&mut self, name: &str) -> Result<()> {
        self.layer_control.select(name)?;
        log::info!("base layer switched to {:?}", name);
        Ok(())
    }

    pub fn active_base_layer(&self) -> Option<&BaseLayer> {
        self.layer_control.active()
    }

    pub fn base_layers(&self) -> &[BaseLayer] {
        self.layer_control.layers()
    }

    /// Attribution of the active base layer
    pub fn attribution(&self) -> Vec<&str> {
        if !self.options.attribution_control {
            return Vec::new();
        }
        self.active_base_layer()
            .map(BaseLayer::attribution)
            .unwrap_or_default()
    }

    pub fn scale(&self) -> Option<ScaleBar> {
        self.options
            .scale_control
            .then(|| self.scale_control.compute(&self.viewport))
    }

    pub fn clusters(&self) -> Vec<Cluster> {
        self.markers.clusters(&self.viewport)
    }

    /// Topmost single marker under a container pixel
    pub fn marker_at(&self, pixel: &Point) -> Option<usize> {
        self.clusters()
            .iter()
            .filter(|cluster| cluster.is_single())
            .flat_map(|cluster| cluster.members.iter().copied())
            .filter(|&index| self.markers.markers()[index].hit_test(&self.viewport, pixel))
            .last()
    }

    /// Handles a click: opens a marker's popup, or zooms into a cluster
    pub fn click(&mut self, pixel: &Point) -> Result<ClickTarget> {
        if let Some(index) = self.marker_at(pixel) {
            self.open_popup = Some(index);
            return Ok(ClickTarget::Marker(index));
        }

        let hit = self.clusters().into_iter().rev().find(|cluster| {
            !cluster.is_single()
                && self.viewport.lat_lng_to_pixel(&cluster.center).distance_to(pixel) <= CLUSTER_ICON_RADIUS
        });

        match hit {
            Some(cluster) => {
                self.open_popup = None;
                self.viewport.fit_bounds(&cluster.bounds, None)?;
                Ok(ClickTarget::Cluster(cluster.id))
            }
            None => {
                self.open_popup = None;
                Ok(ClickTarget::Nothing)
            }
        }
    }

    /// The open popup and the marker it belongs to
    pub fn open_popup(&self) -> Option<(&CircleMarker, &PopupContent)> {
        let marker = self.markers.markers().get(self.open_popup?)?;
        Some((marker, marker.popup()?))
    }

    pub fn close_popup(&mut self) {
        self.open_popup = None;
    }
}

impl MapProvider for Map {
    fn add_base_layer(&mut self, layer: BaseLayer, active: bool) {
        self.layer_control.add_base_layer(layer, active);
    }

    fn clear_markers(&mut self) {
        self.open_popup = None;
        self.markers.clear_layers();
    }

    fn add_marker(&mut self, marker: CircleMarker) {
        self.markers.add_layer(marker);
    }

    fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: f64) -> Result<()> {
        self.viewport.fit_bounds(bounds, Some(padding))
    }

    fn markers(&self) -> &[CircleMarker] {
        self.markers.markers()
    }

    fn viewport(&self) -> &Viewport {
        &self.viewport
    }
}

impl Default for Map {
    fn default() -> Self {
        Self::with_options(Viewport::default(), MapOptions::default(), ClusteringConfig::default())
    }
}

impl std::fmt::Debug for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map")
            .field("viewport", &self.viewport)
            .field("base_layers", &self.layer_control.names())
            .field("markers", &self.markers)
            .finish()
    }
}
