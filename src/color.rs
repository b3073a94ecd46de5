use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::CategoryValue;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            hsl_to_color32(Hsl::new(hue, 0.75, 0.55))
        })
        .collect()
}

/// Heatmap ramp: `t` in 0..=1 runs from translucent blue to opaque red.
pub fn heat_color(t: f32) -> Color32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let base = hsl_to_color32(Hsl::new(240.0 * (1.0 - t), 0.85, 0.5));
    let alpha = (40.0 + 200.0 * t) as u8;
    Color32::from_rgba_unmultiplied(base.r(), base.g(), base.b(), alpha)
}

// ---------------------------------------------------------------------------
// Color mapping: category value → Color32
// ---------------------------------------------------------------------------

/// Maps the values of one categorical attribute to distinct colours.
/// Colours follow value order, so the same value set always gets the same
/// colours regardless of how it is sorted for display.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<CategoryValue, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new(values: impl IntoIterator<Item = CategoryValue>) -> Self {
        let values: BTreeSet<CategoryValue> = values.into_iter().collect();
        let palette = generate_palette(values.len());
        ColorMap {
            mapping: values.into_iter().zip(palette).collect(),
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &CategoryValue) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::AirportType;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(4);
        assert_eq!(p.len(), 4);
        assert_ne!(p[0], p[2]);
    }

    #[test]
    fn heat_ramp_endpoints() {
        let cold = heat_color(0.0);
        let hot = heat_color(1.0);
        assert!(cold.b() > cold.r());
        assert!(hot.r() > hot.b());
        assert_eq!(heat_color(f32::NAN), cold);
    }

    #[test]
    fn unknown_values_get_default_colour() {
        let cm = ColorMap::new([CategoryValue::Type(AirportType::Heliport)]);
        assert_ne!(cm.color_for(&CategoryValue::Type(AirportType::Heliport)), Color32::GRAY);
        assert_eq!(cm.color_for(&CategoryValue::Type(AirportType::Closed)), Color32::GRAY);
    }
}
