//! Station features as delivered by the Vs30 GeoJSON feed.
//!
//! Only point geometries are meaningful here. Properties the map reads are
//! typed fields; anything else is kept in `extra` so nothing is lost when a
//! feature is re-serialized.

use crate::{core::geo::LatLng, MapError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};

/// Point geometry in GeoJSON `[lon, lat]` order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeometry", into = "RawGeometry")]
pub struct PointGeometry {
    pub lon: f64,
    pub lat: f64,
}

impl PointGeometry {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn lat_lng(&self) -> LatLng {
        LatLng::from_lon_lat(self.lon, self.lat)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    coordinates: Vec<f64>,
}

impl TryFrom<RawGeometry> for PointGeometry {
    type Error = String;

    fn try_from(raw: RawGeometry) -> std::result::Result<Self, Self::Error> {
        if let Some(kind) = raw.kind.as_deref() {
            if kind != "Point" {
                return Err(format!("unsupported geometry type {kind:?}, expected \"Point\""));
            }
        }
        match raw.coordinates.as_slice() {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Ok(Self::new(*lon, *lat)),
            [_, _, ..] => Err("point coordinates must be finite".to_string()),
            other => Err(format!(
                "point needs [lon, lat], got {} coordinate(s)",
                other.len()
            )),
        }
    }
}

impl From<PointGeometry> for RawGeometry {
    fn from(point: PointGeometry) -> Self {
        Self {
            kind: Some("Point".to_string()),
            coordinates: vec![point.lon, point.lat],
        }
    }
}

/// Descriptive station properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_sta: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vs30: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d_max: Option<Value>,
    #[serde(flatten)]
    pub extra: JsonMap<String, Value>,
}

impl FeatureProperties {
    pub fn named(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: Some(Value::String(name.into())),
            color: Some(color.into()),
            ..Self::default()
        }
    }

    /// Station name as display text, if present
    pub fn name_text(&self) -> Option<String> {
        present(self.name.as_ref()).map(display_value)
    }
}

/// A single station record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub geometry: PointGeometry,
    #[serde(default)]
    pub properties: FeatureProperties,
}

impl Feature {
    pub fn new(id: impl Into<Value>, lon: f64, lat: f64, properties: FeatureProperties) -> Self {
        Self {
            id: Some(id.into()),
            geometry: PointGeometry::new(lon, lat),
            properties,
        }
    }

    /// Marker position; GeoJSON `[lon, lat]` reversed
    pub fn lat_lng(&self) -> LatLng {
        self.geometry.lat_lng()
    }

    pub fn color(&self) -> Option<&str> {
        self.properties.color.as_deref()
    }

    /// Feature id as display text, empty when the feature has none
    pub fn id_text(&self) -> String {
        self.id.as_ref().map(display_value).unwrap_or_default()
    }
}

/// Ordered set of station features
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: Some("FeatureCollection".to_string()),
            features,
        }
    }

    /// Parses a response body. A body that is itself a JSON string holding the
    /// document (double-encoded) is unwrapped once.
    pub fn from_body(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        let value = match value {
            Value::String(inner) => serde_json::from_str(&inner)?,
            other => other,
        };
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let collection: FeatureCollection = serde_json::from_value(value)
            .map_err(|e| MapError::ParseError(format!("Invalid GeoJSON: {e}")))?;

        match collection.kind.as_deref() {
            None | Some("FeatureCollection") => Ok(collection),
            Some(other) => Err(MapError::ParseError(format!(
                "expected a FeatureCollection, got {other:?}"
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }
}

/// Filters out values the feed uses to mean "absent": missing, null, false,
/// zero, NaN and the empty string.
pub fn present(value: Option<&Value>) -> Option<&Value> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64().map_or(false, |f| f == 0.0 || f.is_nan()) => None,
        other => Some(other),
    }
}

/// Renders a JSON value the way a person reads it: strings unquoted and
/// integral floats without a trailing `.0`.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_geojson_parsing() {
        let body = r##"
        {
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "id": 1,
                    "properties": {"name": "A", "color": "#f00", "vs30": 760, "site_class": "B"},
                    "geometry": {"type": "Point", "coordinates": [-122.0, 37.0, 0.5]}
                }
            ]
        }
        "##;

        let collection = FeatureCollection::from_body(body).unwrap();
        assert_eq!(collection.len(), 1);

        let feature = &collection.features[0];
        assert_eq!(feature.lat_lng(), LatLng::new(37.0, -122.0));
        assert_eq!(feature.color(), Some("#f00"));
        assert_eq!(feature.id_text(), "1");
        assert_eq!(feature.properties.name_text().as_deref(), Some("A"));
        assert_eq!(feature.properties.extra.get("site_class"), Some(&json!("B")));
    }

    #[test]
    fn test_double_encoded_body() {
        let inner = r#"{"type":"FeatureCollection","features":[{"id":"x","geometry":{"coordinates":[1,2]},"properties":{}}]}"#;
        let body = serde_json::to_string(inner).unwrap();

        let collection = FeatureCollection::from_body(&body).unwrap();
        assert_eq!(collection.features[0].lat_lng(), LatLng::new(2.0, 1.0));
        assert_eq!(collection.features[0].id_text(), "x");
    }

    #[test]
    fn test_geometry_without_type_is_accepted() {
        let feature: Feature = serde_json::from_value(json!({
            "id": 1,
            "properties": {"name": "A", "color": "#f00"},
            "geometry": {"coordinates": [-122, 37]}
        }))
        .unwrap();
        assert_eq!(feature.lat_lng(), LatLng::new(37.0, -122.0));
    }

    #[test]
    fn test_malformed_geometry_is_rejected() {
        let missing = FeatureCollection::from_value(json!({
            "features": [{"properties": {}}]
        }));
        assert!(matches!(missing, Err(MapError::ParseError(_))));

        let short = FeatureCollection::from_value(json!({
            "features": [{"geometry": {"coordinates": [1.0]}}]
        }));
        assert!(short.is_err());

        let polygon = FeatureCollection::from_value(json!({
            "features": [{"geometry": {"type": "Polygon", "coordinates": [0.0, 0.0]}}]
        }));
        assert!(polygon.is_err());
    }

    #[test]
    fn test_wrong_document_type_is_rejected() {
        let result = FeatureCollection::from_value(json!({"type": "Feature", "features": []}));
        assert!(matches!(result, Err(MapError::ParseError(_))));
    }

    #[test]
    fn test_present_follows_truthiness() {
        assert!(present(None).is_none());
        assert!(present(Some(&json!(null))).is_none());
        assert!(present(Some(&json!(""))).is_none());
        assert!(present(Some(&json!(0))).is_none());
        assert!(present(Some(&json!(false))).is_none());
        assert!(present(Some(&json!("CE.12345"))).is_some());
        assert!(present(Some(&json!(312.5))).is_some());
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("SASW")), "SASW");
        assert_eq!(display_value(&json!(760)), "760");
        assert_eq!(display_value(&json!(760.0)), "760");
        assert_eq!(display_value(&json!(312.5)), "312.5");
        assert_eq!(display_value(&json!(-3)), "-3");
    }
}
