use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{MarkerShape, Plot, PlotPoints, Points, Polygon};

use crate::color::heat_color;
use crate::data::model::AirportRecord;
use crate::data::spatial::{WeightedPoint, coordinates};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Kernel density grid
// ---------------------------------------------------------------------------

/// Gaussian kernel density sampled on a regular lon/lat grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    pub lon_min: f64,
    pub lat_min: f64,
    pub cell: f64,
    pub cols: usize,
    pub rows: usize,
    /// Row-major, `rows * cols` values.
    pub values: Vec<f64>,
    pub max: f64,
}

impl DensityGrid {
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }
}

/// Accumulate `points` into a grid with `cells` cells along the longer axis.
/// The grid spans the points padded by three bandwidths.
pub fn density_grid(points: &[WeightedPoint], cells: usize, bandwidth: f64) -> Option<DensityGrid> {
    if points.is_empty() || cells == 0 || !(bandwidth > 0.0) {
        return None;
    }
    let pad = 3.0 * bandwidth;
    let (mut lon_min, mut lon_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut lat_min, mut lat_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        lon_min = lon_min.min(p.longitude);
        lon_max = lon_max.max(p.longitude);
        lat_min = lat_min.min(p.latitude);
        lat_max = lat_max.max(p.latitude);
    }
    lon_min -= pad;
    lat_min -= pad;
    let width = lon_max + pad - lon_min;
    let height = lat_max + pad - lat_min;

    let cell = width.max(height) / cells as f64;
    let cols = ((width / cell).ceil() as usize).max(1);
    let rows = ((height / cell).ceil() as usize).max(1);

    let two_h2 = 2.0 * bandwidth * bandwidth;
    let reach = (pad / cell).ceil() as isize;
    let mut values = vec![0.0; rows * cols];

    for p in points {
        let pc = ((p.longitude - lon_min) / cell) as isize;
        let pr = ((p.latitude - lat_min) / cell) as isize;
        for r in (pr - reach).max(0)..=(pr + reach).min(rows as isize - 1) {
            for c in (pc - reach).max(0)..=(pc + reach).min(cols as isize - 1) {
                let lon = lon_min + (c as f64 + 0.5) * cell;
                let lat = lat_min + (r as f64 + 0.5) * cell;
                let d2 = (lon - p.longitude).powi(2) + (lat - p.latitude).powi(2);
                values[r as usize * cols + c as usize] += p.weight * (-d2 / two_h2).exp();
            }
        }
    }

    let max = values.iter().copied().fold(0.0, f64::max);
    Some(DensityGrid {
        lon_min,
        lat_min,
        cell,
        cols,
        rows,
        values,
        max,
    })
}

// ---------------------------------------------------------------------------
// Map panel
// ---------------------------------------------------------------------------

/// Nearest airport to (`lon`, `lat`) within `max_deg`.
fn nearest<'a>(
    airports: &[(&'a AirportRecord, (f64, f64))],
    lon: f64,
    lat: f64,
    max_deg: f64,
) -> Option<&'a AirportRecord> {
    airports
        .iter()
        .map(|(rec, (alat, alon))| (*rec, (alon - lon).powi(2) + (alat - lat).powi(2)))
        .filter(|(_, d2)| *d2 <= max_deg * max_deg)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(rec, _)| rec)
}

/// Density heatmap with the airports drawn on top and a hover tooltip.
pub fn airport_map(ui: &mut Ui, state: &AppState, visible: &[&AirportRecord]) {
    let Some(views) = &state.views else {
        return;
    };
    if views.heat.points.is_empty() {
        ui.colored_label(Color32::YELLOW, "No valid location data available to plot.");
        return;
    }

    let airports: Vec<(&AirportRecord, (f64, f64))> = visible
        .iter()
        .filter_map(|rec| coordinates(rec).map(|c| (*rec, c)))
        .collect();

    let grid = density_grid(
        &views.heat.points,
        state.config.heatmap_cells,
        state.config.heatmap_bandwidth_deg,
    );

    let plot = Plot::new("airport_map")
        .height(420.0)
        .data_aspect(1.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    let response = plot.show(ui, |plot_ui| {
        if let Some(grid) = &grid {
            for r in 0..grid.rows {
                for c in 0..grid.cols {
                    let v = grid.value(r, c);
                    if grid.max <= 0.0 || v < grid.max * 0.02 {
                        continue;
                    }
                    let x0 = grid.lon_min + c as f64 * grid.cell;
                    let y0 = grid.lat_min + r as f64 * grid.cell;
                    let (x1, y1) = (x0 + grid.cell, y0 + grid.cell);
                    let cell = Polygon::new(PlotPoints::new(vec![
                        [x0, y0],
                        [x1, y0],
                        [x1, y1],
                        [x0, y1],
                    ]))
                    .fill_color(heat_color((v / grid.max) as f32))
                    .stroke(Stroke::NONE);
                    plot_ui.polygon(cell);
                }
            }
        }

        let positions: PlotPoints = airports.iter().map(|(_, (lat, lon))| [*lon, *lat]).collect();
        plot_ui.points(
            Points::new(positions)
                .radius(2.5)
                .color(Color32::from_rgba_unmultiplied(200, 30, 0, 160)),
        );

        if let Some((lat, lon)) = views.center {
            plot_ui.points(
                Points::new(PlotPoints::new(vec![[lon, lat]]))
                    .radius(5.0)
                    .shape(MarkerShape::Cross)
                    .color(Color32::WHITE)
                    .name("Centroid"),
            );
        }

        plot_ui
            .pointer_coordinate()
            .and_then(|p| nearest(&airports, p.x, p.y, 0.05))
    });

    if let Some(rec) = response.inner {
        response.response.on_hover_ui(|ui: &mut Ui| {
            ui.label(format!("Name: {}", rec.name));
            ui.label(format!("Type: {}", rec.airport_type));
            ui.label(format!(
                "Elevation (ft): {}",
                rec.elevation_ft.map_or_else(|| "n/a".to_string(), |e| format!("{e:.0}"))
            ));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(latitude: f64, longitude: f64, weight: f64) -> WeightedPoint {
        WeightedPoint {
            latitude,
            longitude,
            weight,
        }
    }

    #[test]
    fn no_points_no_grid() {
        assert!(density_grid(&[], 10, 0.1).is_none());
        assert!(density_grid(&[pt(43.0, -71.0, 1.0)], 0, 0.1).is_none());
        assert!(density_grid(&[pt(43.0, -71.0, 1.0)], 10, 0.0).is_none());
    }

    #[test]
    fn density_peaks_near_the_cluster() {
        let pts = [
            pt(42.0, -72.0, 1.0),
            pt(42.01, -72.01, 1.0),
            pt(42.02, -71.99, 1.0),
            pt(44.0, -70.0, 1.0),
        ];
        let grid = density_grid(&pts, 40, 0.1).unwrap();
        assert_eq!(grid.values.len(), grid.rows * grid.cols);

        let at = |lat: f64, lon: f64| {
            let c = ((lon - grid.lon_min) / grid.cell) as usize;
            let r = ((lat - grid.lat_min) / grid.cell) as usize;
            grid.value(r, c)
        };
        assert!(at(42.0, -72.0) > at(44.0, -70.0));
        assert!(at(43.0, -71.0) < at(44.0, -70.0));
        assert!(grid.max >= at(42.0, -72.0));
    }

    #[test]
    fn weights_scale_density() {
        let light = density_grid(&[pt(43.0, -71.0, 1.0)], 20, 0.1).unwrap();
        let heavy = density_grid(&[pt(43.0, -71.0, 3.0)], 20, 0.1).unwrap();
        assert!((heavy.max - 3.0 * light.max).abs() < 1e-9);
    }
}
