use crate::{
    core::{
        geo::{Point, TileCoord},
        viewport::Viewport,
    },
    layers::base::LayerProperties,
    tiles::source::{visible_tiles, TileSource},
    MapError, Result,
};
use serde::{Deserialize, Serialize};

const ESRI_SERVICES: &str = "http://services.arcgisonline.com/ArcGIS/rest/services";
const MAPQUEST_ATTRIBUTION: &str =
    "Maps provided by <a href=\"http://open.mapquest.com\" target=\"_blank\">MapQuest</a>";

/// Configuration for a tile layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLayerOptions {
    /// URL template, e.g. `http://{s}.example.com/{z}/{x}/{y}.png`
    pub url_template: String,
    /// Values substituted for `{s}`
    pub subdomains: Vec<String>,
    pub attribution: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for TileLayerOptions {
    fn default() -> Self {
        Self {
            url_template: String::new(),
            subdomains: Vec::new(),
            attribution: String::new(),
            min_zoom: 0,
            max_zoom: 18,
        }
    }
}

/// A single URL-template tile source
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    properties: LayerProperties,
    options: TileLayerOptions,
}

impl TileLayer {
    pub fn new(id: impl Into<String>, options: TileLayerOptions) -> Self {
        let id = id.into();
        Self {
            properties: LayerProperties::new(id.clone(), id),
            options,
        }
    }

    pub fn id(&self) -> &str {
        &self.properties.id
    }

    pub fn options(&self) -> &TileLayerOptions {
        &self.options
    }

    pub fn attribution(&self) -> &str {
        &self.options.attribution
    }

    /// Subdomain for a tile, rotated by `|x + y| mod len`
    fn subdomain(&self, coord: TileCoord) -> Option<&str> {
        if self.options.subdomains.is_empty() {
            return None;
        }
        let index = (coord.x as u64 + coord.y as u64) % self.options.subdomains.len() as u64;
        self.options.subdomains.get(index as usize).map(String::as_str)
    }

    /// Tiles to draw for the viewport, or none when it is zoomed past this source
    pub fn visible_tiles(&self, viewport: &Viewport) -> Vec<(TileCoord, Point)> {
        if viewport.zoom.round() < self.options.min_zoom as f64 {
            return Vec::new();
        }
        visible_tiles(viewport, self.options.max_zoom)
    }
}

impl TileSource for TileLayer {
    fn url(&self, coord: TileCoord) -> String {
        self.options
            .url_template
            .replace("{s}", self.subdomain(coord).unwrap_or(""))
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }

    fn max_zoom(&self) -> u8 {
        self.options.max_zoom
    }
}

/// A named entry in the base-layer switcher. Greyscale stacks two tile sets,
/// so a base layer is an ordered group painted bottom to top.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseLayer {
    name: String,
    layers: Vec<TileLayer>,
}

impl BaseLayer {
    pub fn new(name: impl Into<String>, layers: Vec<TileLayer>) -> Result<Self> {
        let name = name.into();
        if layers.is_empty() {
            return Err(MapError::Layer(format!("base layer {name:?} has no tile layers")));
        }
        Ok(Self { name, layers })
    }

    fn single(name: &str, options: TileLayerOptions) -> Self {
        Self {
            name: name.to_string(),
            layers: vec![TileLayer::new(name.to_ascii_lowercase(), options)],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    /// Attributions of the member layers, blanks skipped
    pub fn attribution(&self) -> Vec<&str> {
        self.layers
            .iter()
            .map(TileLayer::attribution)
            .filter(|a| !a.is_empty())
            .collect()
    }

    /// Esri World Topo
    pub fn terrain() -> Self {
        Self::single(
            "Terrain",
            TileLayerOptions {
                url_template: format!("{ESRI_SERVICES}/World_Topo_Map/MapServer/tile/{{z}}/{{y}}/{{x}}"),
                attribution: "Esri, HERE, DeLorme, TomTom, USGS, NGA, USDA, EPA, NPS".to_string(),
                ..TileLayerOptions::default()
            },
        )
    }

    /// MapQuest OpenStreetMap
    pub fn street() -> Self {
        Self::single(
            "Street",
            TileLayerOptions {
                url_template: "http://{s}.mqcdn.com/tiles/1.0.0/osm/{z}/{x}/{y}.png".to_string(),
                subdomains: mapquest_subdomains(),
                attribution: format!(
                    "{MAPQUEST_ATTRIBUTION}, <a href=\"http://www.openstreetmap.org/\" target=\"_blank\">OpenStreetMap</a> and contributors."
                ),
                max_zoom: 18,
                ..TileLayerOptions::default()
            },
        )
    }

    /// Esri light grey canvas: base tiles with the reference overlay on top
    pub fn greyscale() -> Self {
        Self {
            name: "Greyscale".to_string(),
            layers: vec![
                TileLayer::new(
                    "greyscale-base",
                    TileLayerOptions {
                        url_template: format!(
                            "{ESRI_SERVICES}/Canvas/World_Light_Gray_Base/MapServer/tile/{{z}}/{{y}}/{{x}}"
                        ),
                        attribution: "&copy;2014 Esri, DeLorme, HERE".to_string(),
                        ..TileLayerOptions::default()
                    },
                ),
                TileLayer::new(
                    "greyscale-reference",
                    TileLayerOptions {
                        url_template: format!(
                            "{ESRI_SERVICES}/Canvas/World_Light_Gray_Reference/MapServer/tile/{{z}}/{{y}}/{{x}}"
                        ),
                        ..TileLayerOptions::default()
                    },
                ),
            ],
        }
    }

    /// MapQuest aerial imagery
    pub fn satellite() -> Self {
        Self::single(
            "Satellite",
            TileLayerOptions {
                url_template: "http://{s}.mqcdn.com/tiles/1.0.0/sat/{z}/{x}/{y}.jpg".to_string(),
                subdomains: mapquest_subdomains(),
                attribution: format!("{MAPQUEST_ATTRIBUTION} (portions courtesy NASA/JPL and USDA)."),
                max_zoom: 18,
                ..TileLayerOptions::default()
            },
        )
    }
}

fn mapquest_subdomains() -> Vec<String> {
    (1..=4).map(|i| format!("otile{i}")).collect()
}

/// The four switchable base layers, default (terrain) first
pub fn default_base_layers() -> Vec<BaseLayer> {
    vec![
        BaseLayer::terrain(),
        BaseLayer::street(),
        BaseLayer::greyscale(),
        BaseLayer::satellite(),
    ]
}
