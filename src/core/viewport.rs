use crate::core::constants::{DEFAULT_MAX_ZOOM, EARTH_RADIUS, MAX_LATITUDE, TILE_SIZE};
use crate::core::geo::{LatLng, LatLngBounds, Point};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
    /// Pixel origin for coordinate transformations (to avoid precision issues)
    pixel_origin: Option<Point>,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        let mut viewport = Self {
            center,
            zoom: zoom.clamp(0.0, DEFAULT_MAX_ZOOM),
            size,
            min_zoom: 0.0,
            max_zoom: DEFAULT_MAX_ZOOM,
            pixel_origin: None,
        };
        viewport.update_pixel_origin();
        viewport
    }

    /// Sets center and zoom together
    pub fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.center = Self::clamp_center(center);
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.update_pixel_origin();
    }

    /// Sets the center of the viewport with bounds checking
    pub fn set_center(&mut self, center: LatLng) {
        self.center = Self::clamp_center(center);
        self.update_pixel_origin();
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.update_pixel_origin();
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
        self.update_pixel_origin();
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.set_zoom(self.zoom);
    }

    /// Gets the scale factor for the current zoom level
    pub fn scale(&self) -> f64 {
        2_f64.powf(self.zoom)
    }

    /// Projects a LatLng to world pixel coordinates at the given zoom level (EPSG:3857)
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let z = zoom.unwrap_or(self.zoom);
        let scale = TILE_SIZE as f64 * 2_f64.powf(z);

        let lat = LatLng::clamp_lat(lat_lng.lat);
        let x = lat_lng.lng.to_radians() * EARTH_RADIUS;
        let y = (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS;

        let world = 2.0 * PI * EARTH_RADIUS;
        let pixel_x = (x + PI * EARTH_RADIUS) / world * scale;
        let pixel_y = (-y + PI * EARTH_RADIUS) / world * scale;

        Point::new(pixel_x, pixel_y)
    }

    /// Unprojects world pixel coordinates back to LatLng at the given zoom level
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let z = zoom.unwrap_or(self.zoom);
        let scale = TILE_SIZE as f64 * 2_f64.powf(z);

        let world = 2.0 * PI * EARTH_RADIUS;
        let x = (pixel.x / scale) * world - PI * EARTH_RADIUS;
        let y = PI * EARTH_RADIUS - (pixel.y / scale) * world;

        let lng = (x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();

        LatLng::new(lat, lng)
    }

    /// Gets or calculates the pixel origin for this viewport
    pub fn get_pixel_origin(&self) -> Point {
        self.pixel_origin
            .unwrap_or_else(|| self.project(&self.center, None).floor())
    }

    fn update_pixel_origin(&mut self) {
        self.pixel_origin = Some(self.project(&self.center, None).floor());
    }

    /// Converts a geographical coordinate to container pixel coordinates
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        let layer_point = self.project(lat_lng, None).subtract(&self.get_pixel_origin());
        Point::new(
            layer_point.x + self.size.x / 2.0,
            layer_point.y + self.size.y / 2.0,
        )
    }

    /// Converts container pixel coordinates back to geographical coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        let layer_point = Point::new(pixel.x - self.size.x / 2.0, pixel.y - self.size.y / 2.0);
        self.unproject(&layer_point.add(&self.get_pixel_origin()), None)
    }

    /// Converts a world pixel (at `zoom`) to container coordinates at the current zoom
    pub fn world_to_container(&self, world: &Point, zoom: f64) -> Point {
        let scale = 2_f64.powf(self.zoom - zoom);
        let center = self.project(&self.center, None);
        Point::new(
            world.x * scale - center.x + self.size.x / 2.0,
            world.y * scale - center.y + self.size.y / 2.0,
        )
    }

    /// Pans the viewport by the given pixel offset
    pub fn pan(&mut self, delta: Point) {
        let center_px = self.project(&self.center, None);
        let new_center = self.unproject(&center_px.add(&delta), None);
        self.set_center(new_center);
    }

    /// Zooms the viewport to a specific level, keeping `focus_point` stationary if given
    pub fn zoom_to(&mut self, zoom: f64, focus_point: Option<Point>) {
        let new_zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < 0.001 {
            return;
        }

        match focus_point {
            Some(focus_screen) => {
                let focus_latlng = self.pixel_to_lat_lng(&focus_screen);
                self.zoom = new_zoom;
                self.update_pixel_origin();

                let new_focus_screen = self.lat_lng_to_pixel(&focus_latlng);
                self.pan(new_focus_screen.subtract(&focus_screen));
            }
            None => {
                self.zoom = new_zoom;
                self.update_pixel_origin();
            }
        }
    }

    /// Gets the current viewport bounds in geographical coordinates
    pub fn bounds(&self) -> LatLngBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&self.size);

        LatLngBounds::new(LatLng::new(se.lat, nw.lng), LatLng::new(nw.lat, se.lng))
    }

    /// Highest integer zoom at which `bounds` fits inside the viewport minus `padding`
    pub fn bounds_zoom(&self, bounds: &LatLngBounds, padding: f64) -> f64 {
        let available = Point::new(self.size.x - 2.0 * padding, self.size.y - 2.0 * padding);
        let mut best_zoom = self.min_zoom;

        for test_zoom in (self.min_zoom.ceil() as i32)..=(self.max_zoom.floor() as i32) {
            let zoom = test_zoom as f64;
            let nw = self.project(&bounds.north_west(), Some(zoom));
            let se = self.project(&bounds.south_east(), Some(zoom));

            if (se.x - nw.x).abs() <= available.x && (se.y - nw.y).abs() <= available.y {
                best_zoom = zoom;
            } else {
                break;
            }
        }

        best_zoom
    }

    /// Fits the viewport to contain the given bounds
    pub fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: Option<f64>) -> Result<()> {
        if !bounds.is_valid() {
            return Err(MapError::InvalidBounds(
                "cannot fit an empty bounds".to_string(),
            ));
        }

        let padding = padding.unwrap_or(0.0);
        let zoom = self.bounds_zoom(bounds, padding);

        // Center on the projected midpoint so Mercator stretch does not skew the view
        let nw = self.project(&bounds.north_west(), Some(zoom));
        let se = self.project(&bounds.south_east(), Some(zoom));
        let center = self.unproject(&nw.add(&se).multiply(0.5), Some(zoom));

        self.set_view(center, zoom);
        Ok(())
    }

    /// Gets the resolution in meters per pixel at the current zoom level and center latitude
    pub fn resolution(&self) -> f64 {
        let earth_circumference = 2.0 * PI * EARTH_RADIUS;
        earth_circumference * self.center.lat.to_radians().cos() / (TILE_SIZE as f64 * self.scale())
    }

    fn clamp_center(center: LatLng) -> LatLng {
        LatLng::new(
            center.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            center.lng.clamp(-180.0, 180.0),
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0.0, Point::new(800.0, 600.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_creation() {
        let viewport = Viewport::new(
            LatLng::new(40.7128, -74.0060),
            10.0,
            Point::new(800.0, 600.0),
        );

        assert_eq!(viewport.zoom, 10.0);
        assert_eq!(viewport.center.lat, 40.7128);
        assert_eq!(viewport.size.x, 800.0);
    }

    #[test]
    fn test_coordinate_conversion() {
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 1.0, Point::new(512.0, 512.0));

        let center_lat_lng = viewport.pixel_to_lat_lng(&Point::new(256.0, 256.0));
        assert!(center_lat_lng.lat.abs() < 0.01);
        assert!(center_lat_lng.lng.abs() < 0.01);

        let pixel = viewport.lat_lng_to_pixel(&LatLng::new(0.0, 0.0));
        assert!((pixel.x - 256.0).abs() < 1.0);
        assert!((pixel.y - 256.0).abs() < 1.0);
    }

    #[test]
    fn test_zoom_limits() {
        let mut viewport = Viewport::default();
        viewport.set_zoom_limits(2.0, 15.0);

        viewport.set_zoom(1.0);
        assert_eq!(viewport.zoom, 2.0);

        viewport.set_zoom(20.0);
        assert_eq!(viewport.zoom, 15.0);
    }

    #[test]
    fn test_pan() {
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0), 1.0, Point::new(512.0, 512.0));

        let original_center = viewport.center;
        viewport.pan(Point::new(10.0, 10.0));

        assert_ne!(viewport.center, original_center);
        assert!(viewport.center.lng > 0.0);
        assert!(viewport.center.lat < 0.0);
    }

    #[test]
    fn test_fit_bounds_contains_all_points() {
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0), 2.0, Point::new(800.0, 600.0));
        let bounds = LatLngBounds::from_coords(34.0, -122.0, 38.0, -117.0);

        viewport.fit_bounds(&bounds, None).unwrap();

        assert!(viewport.zoom >= 5.0 && viewport.zoom <= 7.0);
        let view = viewport.bounds();
        assert!(view.contains(&bounds.south_west));
        assert!(view.contains(&bounds.north_east));
    }

    #[test]
    fn test_fit_single_point_goes_to_max_zoom() {
        let mut viewport = Viewport::default();
        let point = LatLng::new(37.0, -122.0);
        let bounds = LatLngBounds::new(point, point);

        viewport.fit_bounds(&bounds, None).unwrap();

        assert_eq!(viewport.zoom, DEFAULT_MAX_ZOOM);
        assert!((viewport.center.lat - 37.0).abs() < 1e-6);
        assert!((viewport.center.lng + 122.0).abs() < 1e-6);
    }

    #[test]
    fn test_fit_empty_bounds_is_an_error() {
        let mut viewport = Viewport::default();
        let before = viewport.clone();

        assert!(viewport.fit_bounds(&LatLngBounds::empty(), None).is_err());
        assert_eq!(viewport, before);
    }

    #[test]
    fn test_resolution_halves_per_zoom() {
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0), 3.0, Point::new(512.0, 512.0));
        let coarse = viewport.resolution();
        viewport.set_zoom(4.0);
        assert!((coarse / viewport.resolution() - 2.0).abs() < 1e-9);
    }
}
