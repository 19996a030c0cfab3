use crate::{
    core::{
        constants::{CLUSTER_RADIUS, DISABLE_CLUSTERING_AT_ZOOM},
        geo::{LatLng, LatLngBounds, Point},
        viewport::Viewport,
    },
    layers::marker::CircleMarker,
    spatial::index::{SpatialIndex, SpatialItem},
};
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Configuration for clustering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Maximum pixel distance from a cluster centre for a marker to join it
    pub max_cluster_radius: f64,
    /// At or above this zoom every marker is shown on its own
    pub disable_clustering_at_zoom: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            max_cluster_radius: CLUSTER_RADIUS,
            disable_clustering_at_zoom: DISABLE_CLUSTERING_AT_ZOOM,
        }
    }
}

/// A group of markers drawn as one symbol at the current zoom
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: usize,
    /// Mean of the members' projected positions
    pub center: LatLng,
    pub bounds: LatLngBounds,
    /// Indices into [`MarkerClusterGroup::markers`], ascending
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }
}

struct Pending {
    sum: Point,
    center: Point,
    /// Grid cell the centre currently lies in
    cell: (i64, i64),
    bounds: LatLngBounds,
    members: Vec<usize>,
}

impl Pending {
    fn new(index: usize, pixel: Point, position: &LatLng, radius: f64) -> Self {
        let mut bounds = LatLngBounds::empty();
        bounds.extend(position);
        Self {
            sum: pixel,
            center: pixel,
            cell: grid_cell(&pixel, radius),
            bounds,
            members: vec![index],
        }
    }

    fn add(&mut self, index: usize, pixel: Point, position: &LatLng, radius: f64) {
        self.sum = self.sum.add(&pixel);
        self.members.push(index);
        self.center = self.sum.multiply(1.0 / self.members.len() as f64);
        self.cell = grid_cell(&self.center, radius);
        self.bounds.extend(position);
    }
}

/// Cells are one radius wide, so any centre within the radius of a pixel
/// lies in the pixel's cell or one of its eight neighbours.
fn grid_cell(pixel: &Point, radius: f64) -> (i64, i64) {
    ((pixel.x / radius).floor() as i64, (pixel.y / radius).floor() as i64)
}

/// Container of circle markers that groups nearby markers into clusters.
/// Markers are only ever cleared and re-added wholesale.
pub struct MarkerClusterGroup {
    config: ClusteringConfig,
    markers: Vec<CircleMarker>,
    index: SpatialIndex<()>,
}

impl MarkerClusterGroup {
    pub fn new(config: ClusteringConfig) -> Self {
        Self {
            config,
            markers: Vec::new(),
            index: SpatialIndex::new(),
        }
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    pub fn clear_layers(&mut self) {
        self.markers.clear();
        self.index.clear();
    }

    pub fn add_layer(&mut self, marker: CircleMarker) {
        let id = self.markers.len();
        self.index.insert(SpatialItem::new(id, marker.position(), ()));
        self.markers.push(marker);
    }

    pub fn markers(&self) -> &[CircleMarker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Indices of markers inside `bounds`, ascending
    pub fn markers_in(&self, bounds: &LatLngBounds) -> Vec<usize> {
        let mut ids: Vec<usize> = self.index.query(bounds).iter().map(|item| item.id).collect();
        ids.sort_unstable();
        ids
    }

    /// Clusters of the markers in (or within one radius of) the viewport.
    ///
    /// Greedy distance-grid clustering in pixel space at the viewport's integer
    /// zoom: markers are visited in insertion order and each joins the nearest
    /// cluster whose centre lies within the radius, otherwise starts its own.
    pub fn clusters(&self, viewport: &Viewport) -> Vec<Cluster> {
        let zoom = viewport.zoom.round();
        let radius = self.config.max_cluster_radius;
        let margin = Point::new(radius, radius);
        let search = LatLngBounds::new(
            viewport.pixel_to_lat_lng(&Point::new(-margin.x, viewport.size.y + margin.y)),
            viewport.pixel_to_lat_lng(&Point::new(viewport.size.x + margin.x, -margin.y)),
        );
        let visible = self.markers_in(&search);

        let singles = zoom >= self.config.disable_clustering_at_zoom || radius <= 0.0;
        let mut pending: Vec<Pending> = Vec::new();
        let mut grid: FxHashMap<(i64, i64), Vec<usize>> = FxHashMap::default();

        for index in visible {
            let position = self.markers[index].position();
            let pixel = viewport.project(&position, Some(zoom));

            if singles {
                pending.push(Pending::new(index, pixel, &position, 1.0));
                continue;
            }

            let cell = grid_cell(&pixel, radius);
            let mut nearest: Option<(usize, f64)> = None;
            for dx in -1..=1 {
                for dy in -1..=1 {
                    let Some(candidates) = grid.get(&(cell.0 + dx, cell.1 + dy)) else {
                        continue;
                    };
                    for &candidate in candidates {
                        let distance = pending[candidate].center.distance_to(&pixel);
                        let closer = nearest.map_or(true, |(best, best_distance)| {
                            distance < best_distance || (distance == best_distance && candidate < best)
                        });
                        if distance <= radius && closer {
                            nearest = Some((candidate, distance));
                        }
                    }
                }
            }

            match nearest {
                Some((cluster, _)) => {
                    let before = pending[cluster].cell;
                    pending[cluster].add(index, pixel, &position, radius);
                    let after = pending[cluster].cell;
                    // the mean moved into another cell; re-file it there
                    if after != before {
                        if let Some(filed) = grid.get_mut(&before) {
                            filed.retain(|&candidate| candidate != cluster);
                        }
                        grid.entry(after).or_default().push(cluster);
                    }
                }
                None => {
                    grid.entry(cell).or_default().push(pending.len());
                    pending.push(Pending::new(index, pixel, &position, radius));
                }
            }
        }

        log::debug!(
            "clustered {} marker(s) into {} group(s) at zoom {}",
            self.markers.len(),
            pending.len(),
            zoom
        );

        pending
            .into_iter()
            .enumerate()
            .map(|(id, group)| Cluster {
                id,
                center: viewport.unproject(&group.center, Some(zoom)),
                bounds: group.bounds,
                members: group.members,
            })
            .collect()
    }
}

impl Default for MarkerClusterGroup {
    fn default() -> Self {
        Self::new(ClusteringConfig::default())
    }
}

impl std::fmt::Debug for MarkerClusterGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerClusterGroup")
            .field("config", &self.config)
            .field("markers", &self.markers.len())
            .finish()
    }
}
