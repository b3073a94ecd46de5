use std::collections::BTreeSet;
use std::f32::consts::TAU;

use eframe::egui::{Color32, Pos2, RichText, Sense, Shape, Stroke, Ui, Vec2};
use egui_plot::{Bar, BarChart, Legend, Plot};

use crate::color::ColorMap;
use crate::data::aggregate::{Counts, Histogram};
use crate::data::model::{CategoryValue, ElevationCategory};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Bar chart: airports per type
// ---------------------------------------------------------------------------

/// One bar per group, coloured and named so the legend doubles as axis labels.
pub fn count_bar_chart(ui: &mut Ui, id: &str, counts: &Counts) {
    if counts.is_empty() {
        ui.label("No data.");
        return;
    }
    let colors = ColorMap::new(counts.entries.iter().map(|(v, _)| *v));

    Plot::new(id)
        .height(240.0)
        .legend(Legend::default())
        .y_axis_label("Airports")
        .show_x(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            for (i, (value, n)) in counts.entries.iter().enumerate() {
                let label = value.to_string();
                let bar = Bar::new(i as f64, *n as f64)
                    .width(0.7)
                    .name(&label)
                    .fill(colors.color_for(value));
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(&label));
            }
        });
}

// ---------------------------------------------------------------------------
// Pie chart: elevation-category proportions
// ---------------------------------------------------------------------------

/// Wedges no wider than this keep every polygon convex.
const MAX_WEDGE_STEP: f32 = TAU / 72.0;

fn wedge_points(center: Pos2, radius: f32, start: f32, sweep: f32) -> Vec<Pos2> {
    let steps = ((sweep / MAX_WEDGE_STEP).ceil() as usize).max(1);
    let mut pts = Vec::with_capacity(steps + 2);
    pts.push(center);
    for s in 0..=steps {
        let a = start + sweep * s as f32 / steps as f32;
        pts.push(center + radius * Vec2::angled(a));
    }
    pts
}

/// Fractions of the total for each entry, in entry order.
pub fn proportions(entries: &[(CategoryValue, usize)]) -> Vec<f32> {
    let total: usize = entries.iter().map(|(_, n)| n).sum();
    if total == 0 {
        return vec![0.0; entries.len()];
    }
    entries
        .iter()
        .map(|(_, n)| *n as f32 / total as f32)
        .collect()
}

const ALL_HIDDEN: &str = "Please select at least one elevation category to display the pie chart.";
const NO_PIE_DATA: &str = "No data available for the selected elevation categories.";

/// Slices left once `hidden` categories are removed, or the notice to show
/// instead of the chart.
fn pie_slices(
    entries: &[(CategoryValue, usize)],
    hidden: &BTreeSet<ElevationCategory>,
) -> Result<Vec<(CategoryValue, usize)>, &'static str> {
    let shown: Vec<(CategoryValue, usize)> = entries
        .iter()
        .filter(|(v, _)| match v {
            CategoryValue::Elevation(c) => !hidden.contains(c),
            _ => true,
        })
        .copied()
        .collect();

    if shown.is_empty() && !entries.is_empty() {
        Err(ALL_HIDDEN)
    } else if shown.iter().all(|(_, n)| *n == 0) {
        Err(NO_PIE_DATA)
    } else {
        Ok(shown)
    }
}

pub fn elevation_pie(ui: &mut Ui, state: &AppState) {
    let Some(views) = &state.views else {
        return;
    };
    let entries = match pie_slices(&views.elevation_counts.entries, &state.pie_hidden) {
        Ok(entries) => entries,
        Err(notice) => {
            ui.colored_label(Color32::YELLOW, notice);
            return;
        }
    };

    let colors = ColorMap::new(views.elevation_counts.entries.iter().map(|(v, _)| *v));
    let shares = proportions(&entries);

    ui.horizontal(|ui: &mut Ui| {
        let size = Vec2::splat(220.0);
        let (response, painter) = ui.allocate_painter(size, Sense::hover());
        let center = response.rect.center();
        let radius = size.x * 0.45;

        // Start at 12 o'clock and run clockwise.
        let mut angle = -TAU / 4.0;
        for ((value, _), share) in entries.iter().zip(&shares) {
            let sweep = share * TAU;
            if sweep <= 0.0 {
                continue;
            }
            let color = colors.color_for(value);
            let pts = wedge_points(center, radius, angle, sweep);
            for w in 1..pts.len() - 1 {
                painter.add(Shape::convex_polygon(
                    vec![pts[0], pts[w], pts[w + 1]],
                    color,
                    Stroke::NONE,
                ));
            }
            angle += sweep;
        }
        painter.circle_stroke(center, radius, Stroke::new(1.0, ui.visuals().weak_text_color()));

        ui.vertical(|ui: &mut Ui| {
            for ((value, n), share) in entries.iter().zip(&shares) {
                let text = format!("{value}: {n} ({:.1}%)", share * 100.0);
                ui.label(RichText::new(text).color(colors.color_for(value)));
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

pub fn elevation_histogram(ui: &mut Ui, hist: &Histogram) {
    if hist.bins.is_empty() {
        ui.label("No elevation data.");
        return;
    }
    let bars: Vec<Bar> = hist
        .bins
        .iter()
        .map(|b| {
            let width = (b.end - b.start).max(1.0);
            Bar::new((b.start + b.end) / 2.0, b.count as f64)
                .width(width * 0.95)
                .name(format!("{:.0}–{:.0} ft", b.start, b.end))
        })
        .collect();

    Plot::new("elevation_histogram")
        .height(220.0)
        .x_axis_label("Elevation (ft)")
        .y_axis_label("Count")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .color(Color32::LIGHT_BLUE)
                    .name("Histogram of elevation"),
            );
        });
}

/// Show the "no data" state in place of a chart section.
pub fn empty_notice(ui: &mut Ui) {
    ui.add_space(8.0);
    ui.vertical_centered(|ui: &mut Ui| {
        ui.label(RichText::new("No airports match the current filters.").italics());
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proportions_sum_to_one() {
        let entries = vec![
            (CategoryValue::Elevation(ElevationCategory::Low), 3),
            (CategoryValue::Elevation(ElevationCategory::High), 1),
        ];
        let p = proportions(&entries);
        assert_eq!(p, vec![0.75, 0.25]);
        assert_eq!(proportions(&[]), Vec::<f32>::new());
    }

    #[test]
    fn hiding_every_category_asks_for_a_selection() {
        use ElevationCategory::*;
        let entries = vec![(CategoryValue::Elevation(Low), 3), (CategoryValue::Elevation(High), 1)];

        let all: BTreeSet<ElevationCategory> = [Low, Medium, High].into_iter().collect();
        assert_eq!(pie_slices(&entries, &all), Err(ALL_HIDDEN));

        let some: BTreeSet<ElevationCategory> = [High].into_iter().collect();
        assert_eq!(pie_slices(&entries, &some), Ok(vec![(CategoryValue::Elevation(Low), 3)]));

        assert_eq!(pie_slices(&[], &BTreeSet::new()), Err(NO_PIE_DATA));
    }

    #[test]
    fn wedges_are_split_into_narrow_steps() {
        let pts = wedge_points(Pos2::ZERO, 10.0, 0.0, TAU / 2.0);
        assert!(pts.len() >= 38);
        assert_eq!(pts[0], Pos2::ZERO);
        for w in pts[1..].windows(2) {
            assert!((w[1] - w[0]).length() <= 10.0 * MAX_WEDGE_STEP + 1e-3);
        }
        assert!(pts[1..].iter().all(|p| (p.to_vec2().length() - 10.0).abs() < 1e-3));
    }
}
