use crate::core::geo::{LatLng, LatLngBounds};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A point item indexed by position, stored as `[lng, lat]`
#[derive(Debug, Clone)]
pub struct SpatialItem<T> {
    pub id: usize,
    pub position: LatLng,
    pub data: T,
}

impl<T> SpatialItem<T> {
    pub fn new(id: usize, position: LatLng, data: T) -> Self {
        Self { id, position, data }
    }

    fn coords(&self) -> [f64; 2] {
        [self.position.lng, self.position.lat]
    }
}

impl<T> PartialEq for SpatialItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> RTreeObject for SpatialItem<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.coords())
    }
}

impl<T> PointDistance for SpatialItem<T> {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let [x, y] = self.coords();
        let dx = x - point[0];
        let dy = y - point[1];
        dx * dx + dy * dy
    }
}

/// R-tree over point items
pub struct SpatialIndex<T> {
    rtree: RTree<SpatialItem<T>>,
}

impl<T> SpatialIndex<T> {
    pub fn new() -> Self {
        Self { rtree: RTree::new() }
    }

    /// Bulk-loads an index; faster than repeated inserts for a full rebuild
    pub fn bulk_load(items: Vec<SpatialItem<T>>) -> Self {
        Self {
            rtree: RTree::bulk_load(items),
        }
    }

    pub fn insert(&mut self, item: SpatialItem<T>) {
        self.rtree.insert(item);
    }

    /// Items inside `bounds`, in no particular order
    pub fn query(&self, bounds: &LatLngBounds) -> Vec<&SpatialItem<T>> {
        let envelope = AABB::from_corners(
            [bounds.south_west.lng, bounds.south_west.lat],
            [bounds.north_east.lng, bounds.north_east.lat],
        );
        self.rtree.locate_in_envelope(&envelope).collect()
    }

    pub fn nearest(&self, position: &LatLng) -> Option<&SpatialItem<T>> {
        self.rtree.nearest_neighbor(&[position.lng, position.lat])
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn clear(&mut self) {
        self.rtree = RTree::new();
    }
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_by_bounds() {
        let index = SpatialIndex::bulk_load(vec![
            SpatialItem::new(0, LatLng::new(37.0, -122.0), "sf"),
            SpatialItem::new(1, LatLng::new(34.0, -118.0), "la"),
            SpatialItem::new(2, LatLng::new(40.7, -74.0), "nyc"),
        ]);
        assert_eq!(index.len(), 3);

        let west_coast = LatLngBounds::from_coords(30.0, -125.0, 40.0, -115.0);
        let mut found: Vec<usize> = index.query(&west_coast).iter().map(|item| item.id).collect();
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn test_nearest_and_clear() {
        let mut index = SpatialIndex::new();
        index.insert(SpatialItem::new(0, LatLng::new(0.0, 0.0), ()));
        index.insert(SpatialItem::new(1, LatLng::new(10.0, 10.0), ()));

        assert_eq!(index.nearest(&LatLng::new(9.0, 9.0)).map(|item| item.id), Some(1));

        index.clear();
        assert!(index.is_empty());
        assert!(index.nearest(&LatLng::new(0.0, 0.0)).is_none());
    }
}
