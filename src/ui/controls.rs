use crate::{
    core::{constants::SCALE_MAX_WIDTH, geo::Point, viewport::Viewport},
    layers::tile::BaseLayer,
    MapError, Result,
};

/// Base-layer switcher. Radio semantics: once any layer is registered exactly
/// one of them is active.
#[derive(Debug, Clone, Default)]
pub struct LayerControl {
    layers: Vec<BaseLayer>,
    active: Option<usize>,
}

impl LayerControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a base layer. The first layer becomes active unless a later
    /// one is added with `active` set.
    pub fn add_base_layer(&mut self, layer: BaseLayer, active: bool) {
        log::debug!("base layer {:?} registered (active: {})", layer.name(), active);
        self.layers.push(layer);
        if active || self.active.is_none() {
            self.active = Some(self.layers.len() - 1);
        }
    }

    pub fn select(&mut self, name: &str) -> Result<()> {
        let index = self
            .layers
            .iter()
            .position(|layer| layer.name() == name)
            .ok_or_else(|| MapError::Layer(format!("no base layer named {name:?}")))?;
        self.active = Some(index);
        Ok(())
    }

    pub fn active(&self) -> Option<&BaseLayer> {
        self.active.and_then(|index| self.layers.get(index))
    }

    pub fn layers(&self) -> &[BaseLayer] {
        &self.layers
    }

    pub fn names(&self) -> Vec<&str> {
        self.layers.iter().map(BaseLayer::name).collect()
    }
}

/// One line of the scale bar
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleLine {
    pub label: String,
    /// Bar length in pixels, at most the control's max width
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScaleBar {
    pub metric: Option<ScaleLine>,
    pub imperial: Option<ScaleLine>,
}

/// Distance scale measured across the vertical middle of the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleControl {
    pub max_width: f64,
    pub metric: bool,
    pub imperial: bool,
}

impl Default for ScaleControl {
    fn default() -> Self {
        Self {
            max_width: SCALE_MAX_WIDTH,
            metric: true,
            imperial: true,
        }
    }
}

impl ScaleControl {
    pub fn compute(&self, viewport: &Viewport) -> ScaleBar {
        let y = viewport.size.y / 2.0;
        let left = viewport.pixel_to_lat_lng(&Point::new(0.0, y));
        let right = viewport.pixel_to_lat_lng(&Point::new(self.max_width, y));
        let max_meters = left.distance_to(&right);

        ScaleBar {
            metric: self.metric.then(|| self.metric_line(max_meters)),
            imperial: self.imperial.then(|| self.imperial_line(max_meters)),
        }
    }

    fn metric_line(&self, max_meters: f64) -> ScaleLine {
        let meters = round_number(max_meters);
        let label = if meters < 1000.0 {
            format!("{} m", format_number(meters))
        } else {
            format!("{} km", format_number(meters / 1000.0))
        };
        self.line(label, meters / max_meters)
    }

    fn imperial_line(&self, max_meters: f64) -> ScaleLine {
        let max_feet = max_meters * 3.2808399;
        if max_feet > 5280.0 {
            let max_miles = max_feet / 5280.0;
            let miles = round_number(max_miles);
            self.line(format!("{} mi", format_number(miles)), miles / max_miles)
        } else {
            let feet = round_number(max_feet);
            self.line(format!("{} ft", format_number(feet)), feet / max_feet)
        }
    }

    fn line(&self, label: String, ratio: f64) -> ScaleLine {
        let width = if ratio.is_finite() {
            (self.max_width * ratio).round()
        } else {
            0.0
        };
        ScaleLine { label, width }
    }
}

/// Largest of 1, 2, 3, 5 or 10 times a power of ten not above `value`
pub fn round_number(value: f64) -> f64 {
    if value <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    let pow10 = 10_f64.powf(value.log10().floor());
    let d = value / pow10;
    let d = if d >= 10.0 {
        10.0
    } else if d >= 5.0 {
        5.0
    } else if d >= 3.0 {
        3.0
    } else if d >= 2.0 {
        2.0
    } else {
        1.0
    };
    pow10 * d
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        // trims float noise such as 0.30000000000000004
        let text = format!("{:.6}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;
    use crate::layers::tile::default_base_layers;

    #[test]
    fn test_layer_control_radio() {
        let mut control = LayerControl::new();
        assert!(control.active().is_none());

        for (i, layer) in default_base_layers().into_iter().enumerate() {
            control.add_base_layer(layer, i == 0);
        }
        assert_eq!(control.active().map(BaseLayer::name), Some("Terrain"));

        control.select("Satellite").unwrap();
        assert_eq!(control.active().map(BaseLayer::name), Some("Satellite"));

        assert!(control.select("Moon").is_err());
        assert_eq!(control.active().map(BaseLayer::name), Some("Satellite"));
        assert_eq!(control.names(), ["Terrain", "Street", "Greyscale", "Satellite"]);
    }

    #[test]
    fn test_round_number() {
        assert_eq!(round_number(7.0), 5.0);
        assert_eq!(round_number(2500.0), 2000.0);
        assert_eq!(round_number(39.0), 30.0);
        assert_eq!(round_number(100.0), 100.0);
        assert_eq!(round_number(0.0), 0.0);
    }

    #[test]
    fn test_scale_bar_lines() {
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 5.0, Point::new(800.0, 600.0));
        let bar = ScaleControl::default().compute(&viewport);

        // ~489 km across 100 px at zoom 5 on the equator
        let metric = bar.metric.unwrap();
        assert_eq!(metric.label, "300 km");
        assert!(metric.width > 0.0 && metric.width <= 100.0);

        let imperial = bar.imperial.unwrap();
        assert_eq!(imperial.label, "300 mi");
        assert!(imperial.width <= 100.0);
    }

    #[test]
    fn test_scale_switches_units_when_zoomed_in() {
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 17.0, Point::new(800.0, 600.0));
        let bar = ScaleControl::default().compute(&viewport);

        assert!(bar.metric.unwrap().label.ends_with(" m"));
        assert!(bar.imperial.unwrap().label.ends_with(" ft"));
    }
}
