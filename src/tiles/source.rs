use crate::core::{
    constants::TILE_SIZE,
    geo::{Point, TileCoord},
    viewport::Viewport,
};

/// Anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;

    fn max_zoom(&self) -> u8 {
        18
    }
}

/// Tiles covering the viewport at its integer zoom, with the container pixel of
/// each tile's top-left corner. Columns wrap around the antimeridian; rows
/// outside the world are skipped.
pub fn visible_tiles(viewport: &Viewport, max_zoom: u8) -> Vec<(TileCoord, Point)> {
    let zoom = viewport.zoom.round().clamp(0.0, max_zoom as f64);
    let z = zoom as u8;
    let tile = TILE_SIZE as f64;
    let count = 1_i64 << z;

    let center = viewport.project(&viewport.center, Some(zoom));
    let half = viewport.size.multiply(0.5 * 2_f64.powf(zoom - viewport.zoom));
    let min_x = ((center.x - half.x) / tile).floor() as i64;
    let max_x = ((center.x + half.x) / tile).ceil() as i64 - 1;
    let min_y = ((center.y - half.y) / tile).floor().max(0.0) as i64;
    let max_y = (((center.y + half.y) / tile).ceil() as i64 - 1).min(count - 1);

    let mut tiles = Vec::new();
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let wrapped = x.rem_euclid(count);
            let world = Point::new(x as f64 * tile, y as f64 * tile);
            let screen = viewport.world_to_container(&world, zoom);
            tiles.push((TileCoord::new(wrapped as u32, y as u32, z), screen));
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;

    #[test]
    fn test_whole_world_at_zoom_zero() {
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 0.0, Point::new(256.0, 256.0));
        let tiles = visible_tiles(&viewport, 18);
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].0, TileCoord::new(0, 0, 0));
        assert!(tiles[0].1.x.abs() < 1e-9 && tiles[0].1.y.abs() < 1e-9);
    }

    #[test]
    fn test_tiles_cover_viewport() {
        let viewport = Viewport::new(LatLng::new(37.0, -122.0), 8.0, Point::new(800.0, 600.0));
        let tiles = visible_tiles(&viewport, 18);
        assert!(tiles.len() >= 12);
        assert!(tiles.iter().all(|(coord, _)| coord.is_valid() && coord.z == 8));
    }
}
