//! The station view: one collection of features drawn as clustered circle
//! markers, and optionally listed in a sortable table.
//!
//! The map and the table are both observers of the collection. Resetting the
//! collection re-renders them synchronously, so the marker set is always a
//! pure function of the current features.

use crate::{
    core::{
        builder::MapBuilder,
        config::ViewConfig,
        geo::LatLngBounds,
        map::{Map, MapProvider},
    },
    data::{
        collection::Collection,
        feature::Feature,
        source::{fetch_features, DataFetcher, DataSource, HttpFetcher},
    },
    layers::{
        marker::{CircleMarker, CircleMarkerStyle},
        tile::default_base_layers,
    },
    ui::table::{feature_table, DataTable},
    MapError, Result,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// Clears the map, adds one marker per feature and fits the view to them.
/// An empty slice only clears; the viewport is left where it was.
pub fn render_features<P: MapProvider + ?Sized>(
    map: &mut P,
    features: &[Feature],
    style: CircleMarkerStyle,
    padding: f64,
) -> Result<usize> {
    map.clear_markers();
    if features.is_empty() {
        log::debug!("no stations to render");
        return Ok(0);
    }

    let mut bounds = LatLngBounds::empty();
    for (i, feature) in features.iter().enumerate() {
        let marker = CircleMarker::from_feature(format!("station-{i}"), feature, style);
        bounds.extend(&marker.position());
        map.add_marker(marker);
    }
    map.fit_bounds(&bounds, padding)?;

    log::debug!("rendered {} station marker(s)", features.len());
    Ok(features.len())
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| MapError::Layer("view state lock poisoned".to_string()))
}

pub struct ViewBuilder {
    config: ViewConfig,
    data: Option<Vec<Feature>>,
    fetcher: Option<Arc<dyn DataFetcher>>,
}

impl ViewBuilder {
    pub fn new() -> Self {
        Self {
            config: ViewConfig::default(),
            data: None,
            fetcher: None,
        }
    }

    /// Replaces the whole config; call before the field setters
    pub fn config(mut self, config: ViewConfig) -> Self {
        self.config = config;
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = Some(url.into());
        self
    }

    /// Preloaded features; takes precedence over a URL
    pub fn data(mut self, features: Vec<Feature>) -> Self {
        self.data = Some(features);
        self
    }

    pub fn show_table(mut self, show: bool) -> Self {
        self.config.show_table = show;
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn DataFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Builds the view on the given map surface. Inline data is rendered
    /// immediately; a URL source waits for [`Vs30View::load`].
    pub fn build<P: MapProvider + 'static>(self, mut provider: P) -> Result<Vs30View<P>> {
        self.config.validate()?;

        let source = match (self.data, self.config.url.clone()) {
            (Some(features), _) => DataSource::Inline(features),
            (None, Some(url)) => DataSource::Url(url),
            (None, None) => {
                return Err(MapError::Config(
                    "a view needs either a data url or inline features".to_string(),
                ))
            }
        };

        for (i, layer) in default_base_layers().into_iter().enumerate() {
            provider.add_base_layer(layer, i == 0);
        }

        let initial = match &source {
            DataSource::Inline(features) => features.clone(),
            DataSource::Url(_) => Vec::new(),
        };

        let map = Arc::new(Mutex::new(provider));
        let mut data = Collection::new(initial);

        let style = self.config.marker;
        let padding = self.config.fit_padding;
        let map_listener = Arc::clone(&map);
        data.on_reset(move |features: &[Feature]| match map_listener.lock() {
            Ok(mut map) => {
                if let Err(e) = render_features(&mut *map, features, style, padding) {
                    log::warn!("failed to render stations: {}", e);
                }
            }
            Err(_) => log::warn!("map lock poisoned, skipping render"),
        });

        let table = self.config.show_table.then(|| Arc::new(Mutex::new(feature_table())));
        if let Some(table) = &table {
            let table_listener = Arc::clone(table);
            data.on_reset(move |features: &[Feature]| {
                if let Ok(mut table) = table_listener.lock() {
                    table.render(features);
                }
            });
        }

        let view = Vs30View {
            config: self.config,
            source,
            data,
            map,
            table,
            fetcher: self
                .fetcher
                .unwrap_or_else(|| Arc::new(HttpFetcher::new()) as Arc<dyn DataFetcher>),
        };

        if matches!(view.source, DataSource::Inline(_)) {
            view.render()?;
        }
        Ok(view)
    }

    /// Builds on a headless [`Map`] sized and limited by the config
    pub fn build_default(self) -> Result<Vs30View<Map>> {
        let map = MapBuilder::from_config(&self.config).build();
        self.build(map)
    }
}

impl Default for ViewBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Station view over an injected map surface
pub struct Vs30View<P: MapProvider + 'static = Map> {
    config: ViewConfig,
    source: DataSource,
    data: Collection<Feature>,
    map: Arc<Mutex<P>>,
    table: Option<Arc<Mutex<DataTable<Feature>>>>,
    fetcher: Arc<dyn DataFetcher>,
}

impl Vs30View<Map> {
    pub fn builder() -> ViewBuilder {
        ViewBuilder::new()
    }
}

impl<P: MapProvider + 'static> Vs30View<P> {
    /// Redraws map and table from the current collection
    pub fn render(&self) -> Result<()> {
        let features = self.data.data();
        {
            let mut map = lock(&self.map)?;
            render_features(&mut *map, features, self.config.marker, self.config.fit_padding)?;
        }
        if let Some(table) = &self.table {
            lock(table)?.render(features);
        }
        Ok(())
    }

    /// Replaces the collection wholesale; map and table follow
    pub fn reset(&mut self, features: Vec<Feature>) {
        self.data.reset(features);
    }

    /// Fetches the configured URL and resets the collection with the result.
    /// On failure the view keeps its previous state and the error is returned.
    pub async fn load(&mut self) -> Result<usize> {
        let url = match &self.source {
            DataSource::Url(url) => url.clone(),
            DataSource::Inline(features) => return Ok(features.len()),
        };
        log::info!("loading stations from {}", url);
        let result = fetch_features(self.fetcher.as_ref(), &url).await;
        self.apply(result)
    }

    /// Applies the outcome of a fetch performed elsewhere, e.g. on a runtime
    /// the UI thread does not own
    pub fn apply(&mut self, result: Result<Vec<Feature>>) -> Result<usize> {
        match result {
            Ok(features) => {
                let count = features.len();
                self.reset(features);
                Ok(count)
            }
            Err(e) => {
                log::warn!("station data unavailable, keeping current view: {}", e);
                Err(e)
            }
        }
    }

    pub fn data(&self) -> &[Feature] {
        self.data.data()
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn fetcher(&self) -> Arc<dyn DataFetcher> {
        Arc::clone(&self.fetcher)
    }

    pub fn show_table(&self) -> bool {
        self.table.is_some()
    }

    pub fn with_map<R>(&self, f: impl FnOnce(&P) -> R) -> Option<R> {
        self.map.lock().ok().map(|map| f(&*map))
    }

    pub fn with_map_mut<R>(&self, f: impl FnOnce(&mut P) -> R) -> Option<R> {
        self.map.lock().ok().map(|mut map| f(&mut *map))
    }

    /// `None` when the view was built without a table
    pub fn with_table_mut<R>(&self, f: impl FnOnce(&mut DataTable<Feature>) -> R) -> Option<R> {
        let table = self.table.as_ref()?;
        table.lock().ok().map(|mut table| f(&mut *table))
    }

    /// Formatted table rows in display order, `None` without a table
    pub fn table_rows(&self) -> Option<Vec<Vec<String>>> {
        self.with_table_mut(|table| table.rows())
    }
}

impl<P: MapProvider + 'static> std::fmt::Debug for Vs30View<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vs30View")
            .field("source", &self.source.url())
            .field("features", &self.data.len())
            .field("show_table", &self.table.is_some())
            .finish()
    }
}
