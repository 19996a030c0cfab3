use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};
use vs30_map::prelude::*;

/// Serves a fixed body and counts requests
struct MockFetcher {
    body: std::result::Result<String, String>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    fn ok(body: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            body: Ok(body.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn raw(body: &str) -> Arc<Self> {
        Arc::new(Self {
            body: Ok(body.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            body: Err("connection refused".to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> vs30_map::Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        self.body.clone().map_err(MapError::ParseError)
    }
}

/// Map surface that records every call it receives
#[derive(Default)]
struct RecordingMap {
    viewport: Viewport,
    base_layers: Vec<(String, bool)>,
    markers: Vec<CircleMarker>,
    fits: Vec<LatLngBounds>,
    clears: usize,
}

impl MapProvider for RecordingMap {
    fn add_base_layer(&mut self, layer: BaseLayer, active: bool) {
        self.base_layers.push((layer.name().to_string(), active));
    }

    fn clear_markers(&mut self) {
        self.clears += 1;
        self.markers.clear();
    }

    fn add_marker(&mut self, marker: CircleMarker) {
        self.markers.push(marker);
    }

    fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: f64) -> vs30_map::Result<()> {
        self.fits.push(bounds.clone());
        self.viewport.fit_bounds(bounds, Some(padding))
    }

    fn markers(&self) -> &[CircleMarker] {
        &self.markers
    }

    fn viewport(&self) -> &Viewport {
        &self.viewport
    }
}

fn stations() -> serde_json::Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "id": 3,
                "geometry": {"type": "Point", "coordinates": [-122.27, 37.80]},
                "properties": {"name": "Oakland", "color": "#f00", "index": 1, "net_sta": "CE.58224", "method": "SASW", "vs30": 285, "d_max": 30}
            },
            {
                "id": 1,
                "geometry": {"type": "Point", "coordinates": [-118.17, 34.14]},
                "properties": {"name": "Pasadena", "color": "#0f0", "index": 2}
            },
            {
                "id": 2,
                "geometry": {"type": "Point", "coordinates": [-117.16, 32.72]},
                "properties": {"name": "Oakland", "color": "#00f", "index": 3, "vs30": null}
            }
        ]
    })
}

#[tokio::test]
async fn test_load_renders_one_marker_per_feature() {
    let fetcher = MockFetcher::ok(stations());
    let mut view = ViewBuilder::new()
        .url("https://example.com/vs30.json")
        .fetcher(fetcher.clone())
        .build_default()
        .unwrap();

    assert_eq!(view.with_map(|map| map.marker_count()), Some(0));
    assert_eq!(view.load().await.unwrap(), 3);
    assert_eq!(fetcher.calls(), ["https://example.com/vs30.json"]);

    let positions = view
        .with_map(|map| map.markers().iter().map(CircleMarker::position).collect::<Vec<_>>())
        .unwrap();
    assert_eq!(
        positions,
        vec![
            LatLng::new(37.80, -122.27),
            LatLng::new(34.14, -118.17),
            LatLng::new(32.72, -117.16),
        ]
    );

    let viewport_bounds = view.with_map(|map| map.viewport().bounds()).unwrap();
    for position in &positions {
        assert!(viewport_bounds.contains(position));
    }
}

#[tokio::test]
async fn test_double_encoded_body_is_unwrapped() {
    let encoded = serde_json::to_string(&stations().to_string()).unwrap();
    let mut view = ViewBuilder::new()
        .url("https://example.com/vs30.json")
        .fetcher(MockFetcher::raw(&encoded))
        .build_default()
        .unwrap();

    assert_eq!(view.load().await.unwrap(), 3);
    assert_eq!(view.data().len(), 3);
}

#[tokio::test]
async fn test_failed_load_leaves_view_untouched() {
    let mut view = ViewBuilder::new()
        .url("https://example.com/vs30.json")
        .fetcher(MockFetcher::failing())
        .build(RecordingMap::default())
        .unwrap();

    assert!(view.load().await.is_err());
    assert!(view.data().is_empty());
    view.with_map(|map| {
        assert_eq!(map.clears, 0);
        assert!(map.fits.is_empty());
    });
}

#[tokio::test]
async fn test_malformed_body_leaves_view_untouched() {
    let fetcher = MockFetcher::raw(r#"{"features": [{"geometry": {"coordinates": [1.0]}}]}"#);
    let mut view = ViewBuilder::new()
        .url("https://example.com/vs30.json")
        .fetcher(fetcher)
        .build(RecordingMap::default())
        .unwrap();

    assert!(matches!(view.load().await, Err(MapError::ParseError(_))));
    assert_eq!(view.with_map(|map| map.markers.len()), Some(0));
}

#[test]
fn test_base_layers_registered_terrain_active() {
    let view = ViewBuilder::new()
        .data(Vec::new())
        .build(RecordingMap::default())
        .unwrap();

    let layers = view.with_map(|map| map.base_layers.clone()).unwrap();
    assert_eq!(
        layers,
        vec![
            ("Terrain".to_string(), true),
            ("Street".to_string(), false),
            ("Greyscale".to_string(), false),
            ("Satellite".to_string(), false),
        ]
    );
}

#[test]
fn test_empty_collection_is_guarded_in_both_configurations() {
    for show_table in [true, false] {
        let mut view = ViewBuilder::new()
            .data(Vec::new())
            .show_table(show_table)
            .build(RecordingMap::default())
            .unwrap();
        view.reset(Vec::new());

        view.with_map(|map| {
            assert_eq!(map.markers.len(), 0);
            assert!(map.fits.is_empty(), "empty data must not fit bounds");
            assert_eq!(map.viewport, Viewport::default());
        });
        assert_eq!(view.table_rows().map(|rows| rows.len()), show_table.then_some(0));
    }
}

#[test]
fn test_reset_leaves_no_stale_markers() {
    let features = FeatureCollection::from_value(stations()).unwrap().into_features();
    let mut view = ViewBuilder::new()
        .data(features.clone())
        .build(RecordingMap::default())
        .unwrap();
    assert_eq!(view.with_map(|map| map.markers.len()), Some(3));

    view.reset(features[1..2].to_vec());

    view.with_map(|map| {
        assert_eq!(map.markers.len(), 1);
        assert_eq!(map.markers[0].position(), LatLng::new(34.14, -118.17));
        assert_eq!(map.fits.len(), 2);
    });
    assert_eq!(view.table_rows().unwrap(), vec![vec!["1".to_string(), "Pasadena".to_string()]]);
}

#[test]
fn test_missing_vs30_renders_na() {
    let features = FeatureCollection::from_value(stations()).unwrap().into_features();
    let view = ViewBuilder::new().data(features).build_default().unwrap();

    let popups: Vec<String> = view
        .with_map(|map| {
            map.markers()
                .iter()
                .map(|marker| marker.popup().map(PopupContent::to_html).unwrap_or_default())
                .collect()
        })
        .unwrap();

    assert!(popups[0].contains("285 m/s"));
    assert!(popups[0].contains("30 m</td>"));
    assert!(popups[1].contains("N/A m/s"));
    assert!(popups[1].contains("N/A m</td>"));
    assert!(popups[2].contains("N/A m/s"));
}

#[test]
fn test_sorts_reorder_the_same_rows() {
    let features = FeatureCollection::from_value(stations()).unwrap().into_features();
    let view = ViewBuilder::new().data(features).build_default().unwrap();

    view.with_table_mut(|table| table.select_sort("byid").unwrap());
    let by_id = view.table_rows().unwrap();
    view.with_table_mut(|table| table.select_sort("byname").unwrap());
    let by_name = view.table_rows().unwrap();

    let ids = |rows: &[Vec<String>]| rows.iter().map(|row| row[0].clone()).collect::<Vec<_>>();
    assert_eq!(ids(&by_id), ["1", "2", "3"]);
    // the two Oakland rows keep their collection order
    assert_eq!(ids(&by_name), ["3", "2", "1"]);

    let mut a = by_id.clone();
    let mut b = by_name.clone();
    a.sort();
    b.sort();
    assert_eq!(a, b);
}

#[test]
fn test_single_feature_example() {
    let features = FeatureCollection::from_value(json!({
        "features": [{"id": 1, "properties": {"name": "A", "color": "#f00"}, "geometry": {"coordinates": [-122, 37]}}]
    }))
    .unwrap()
    .into_features();

    let view = ViewBuilder::new().data(features).build_default().unwrap();

    view.with_map(|map| {
        assert_eq!(map.marker_count(), 1);
        let marker = &map.markers()[0];
        assert_eq!(marker.position(), LatLng::new(37.0, -122.0));
        assert_eq!(marker.color(), "#f00");
    });
    assert_eq!(
        view.table_rows().unwrap(),
        vec![vec!["1".to_string(), "A".to_string()]]
    );
}

#[test]
fn test_map_only_view() {
    let features = FeatureCollection::from_value(stations()).unwrap().into_features();
    let view = ViewBuilder::new()
        .data(features)
        .show_table(false)
        .build_default()
        .unwrap();

    assert!(!view.show_table());
    assert!(view.table_rows().is_none());
    assert_eq!(view.with_map(|map| map.marker_count()), Some(3));
}

#[test]
fn test_config_drives_marker_style() {
    let config = ViewConfig::from_json_str(r#"{"marker": {"radius": 12}, "show_table": false}"#).unwrap();
    let features = FeatureCollection::from_value(stations()).unwrap().into_features();
    let view = ViewBuilder::new().config(config).data(features).build_default().unwrap();

    view.with_map(|map| {
        let style = map.markers()[0].style();
        assert_eq!(style.radius, 12.0);
        assert_eq!(style.weight, 2.0);
    });
    assert!(!view.show_table());
}

#[test]
fn test_listener_observes_resets() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut collection = Collection::default();
    let sink = Arc::clone(&seen);
    collection.on_reset(move |features: &[Feature]| sink.lock().unwrap().push(features.len()));

    let features = FeatureCollection::from_value(stations()).unwrap().into_features();
    collection.reset(features);
    collection.reset(Vec::new());

    assert_eq!(*seen.lock().unwrap(), vec![3, 0]);
}

#[test]
fn test_markers_join_cluster_whose_centre_drifted() {
    let mut map = Map::new(LatLng::new(0.0, 0.0), 2.0, Point::new(1200.0, 800.0));
    let features: Vec<Feature> = [598.0, 656.0, 670.0]
        .into_iter()
        .enumerate()
        .map(|(i, x)| {
            let position = map.viewport().unproject(&Point::new(x, 512.0), Some(2.0));
            Feature::new(i as u64, position.lng, position.lat, FeatureProperties::named("S", "#f00"))
        })
        .collect();

    render_features(&mut map, &features, CircleMarkerStyle::default(), 0.0).unwrap();
    map.set_view(LatLng::new(0.0, 0.0), 2.0);

    let clusters = map.clusters();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].members, vec![0, 1, 2]);
}
