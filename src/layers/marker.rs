use crate::{
    core::{
        constants::{
            DEFAULT_MARKER_COLOR, MARKER_FILL_OPACITY, MARKER_OPACITY, MARKER_RADIUS,
            MARKER_WEIGHT,
        },
        geo::{LatLng, LatLngBounds, Point},
        viewport::Viewport,
    },
    data::feature::Feature,
    layers::base::LayerProperties,
    ui::popup::PopupContent,
};
use serde::{Deserialize, Serialize};

/// Stroke and fill settings shared by every station marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleMarkerStyle {
    /// Radius in screen pixels
    pub radius: f64,
    /// Stroke width in pixels
    pub weight: f64,
    pub opacity: f32,
    pub fill_opacity: f32,
}

impl Default for CircleMarkerStyle {
    fn default() -> Self {
        Self {
            radius: MARKER_RADIUS,
            weight: MARKER_WEIGHT,
            opacity: MARKER_OPACITY,
            fill_opacity: MARKER_FILL_OPACITY,
        }
    }
}

/// Circle marker of fixed screen radius; stroke and fill share one colour.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleMarker {
    properties: LayerProperties,
    position: LatLng,
    style: CircleMarkerStyle,
    color: String,
    popup: Option<PopupContent>,
}

impl CircleMarker {
    pub fn new(id: impl Into<String>, position: LatLng) -> Self {
        Self {
            properties: LayerProperties::new(id, "Marker"),
            position,
            style: CircleMarkerStyle::default(),
            color: DEFAULT_MARKER_COLOR.to_string(),
            popup: None,
        }
    }

    /// Marker for one station: positioned at the feature, coloured by its
    /// `color` property, popup bound.
    pub fn from_feature(id: impl Into<String>, feature: &Feature, style: CircleMarkerStyle) -> Self {
        let mut marker = Self::new(id, feature.lat_lng())
            .with_style(style)
            .with_popup(PopupContent::from_feature(feature));
        if let Some(color) = feature.color() {
            marker = marker.with_color(color);
        }
        if let Some(name) = feature.properties.name_text() {
            marker.properties.name = name;
        }
        marker
    }

    pub fn with_style(mut self, style: CircleMarkerStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_popup(mut self, popup: PopupContent) -> Self {
        self.popup = Some(popup);
        self
    }

    pub fn id(&self) -> &str {
        &self.properties.id
    }

    pub fn name(&self) -> &str {
        &self.properties.name
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn style(&self) -> &CircleMarkerStyle {
        &self.style
    }

    /// Colour exactly as the feed supplied it
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Colour as RGB; unparseable values fall back to the default marker colour
    pub fn rgb(&self) -> [u8; 3] {
        parse_color(&self.color)
            .or_else(|| parse_color(DEFAULT_MARKER_COLOR))
            .unwrap_or([0x33, 0x88, 0xff])
    }

    pub fn popup(&self) -> Option<&PopupContent> {
        self.popup.as_ref()
    }

    pub fn bounds(&self) -> LatLngBounds {
        LatLngBounds::new(self.position, self.position)
    }

    /// Whether a container pixel falls inside the drawn circle, stroke included
    pub fn hit_test(&self, viewport: &Viewport, pixel: &Point) -> bool {
        let center = viewport.lat_lng_to_pixel(&self.position);
        center.distance_to(pixel) <= self.style.radius + self.style.weight / 2.0
    }
}

/// Parses `#rgb`, `#rrggbb` or a basic CSS colour name
pub fn parse_color(color: &str) -> Option<[u8; 3]> {
    let color = color.trim();
    if let Some(hex) = color.strip_prefix('#') {
        let digits = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<Vec<u8>>>()?;
        return match digits.as_slice() {
            [r, g, b] => Some([r * 17, g * 17, b * 17]),
            [r1, r0, g1, g0, b1, b0] => Some([r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0]),
            _ => None,
        };
    }

    let rgb = match color.to_ascii_lowercase().as_str() {
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "lime" => [0, 255, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "orange" => [255, 165, 0],
        "purple" => [128, 0, 128],
        "gray" | "grey" => [128, 128, 128],
        _ => return None,
    };
    Some(rgb)
}
