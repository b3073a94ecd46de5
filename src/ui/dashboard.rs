use eframe::egui::{self, Color32, ScrollArea, Ui};

use crate::data::aggregate::AggFn;
use crate::data::model::{AirportRecord, Attribute, Metric};
use crate::state::AppState;
use crate::ui::{charts, heatmap, tables};

// ---------------------------------------------------------------------------
// Central panel: data, charts and analysis
// ---------------------------------------------------------------------------

fn metric_combo(ui: &mut Ui, id: &str, metric: &mut Metric) {
    egui::ComboBox::from_id_salt(id)
        .selected_text(metric.label())
        .show_ui(ui, |ui: &mut Ui| {
            for m in Metric::ALL {
                ui.selectable_value(metric, m, m.label());
            }
        });
}

fn attribute_combo(ui: &mut Ui, id: &str, attribute: &mut Attribute) {
    egui::ComboBox::from_id_salt(id)
        .selected_text(attribute.label())
        .show_ui(ui, |ui: &mut Ui| {
            for a in Attribute::ALL {
                ui.selectable_value(attribute, a, a.label());
            }
        });
}

/// Render the dashboard in the central panel.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("New England Airports Data Explorer");

    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to explore airports  (File → Open…)");
        });
        return;
    }

    if let Some(err) = &state.filter_error {
        ui.colored_label(Color32::RED, format!("Invalid filter: {err}"));
        return;
    }
    let Some(views) = &state.views else {
        return;
    };

    let mut options = state.options;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            let visible = state.visible_airports();

            // ---- Filtered data ----
            ui.collapsing("Filtered Airport Data", |ui: &mut Ui| {
                tables::airport_table(ui, "filtered_table", &visible, 300.0);
            });

            if views.is_empty() {
                charts::empty_notice(ui);
                return;
            }

            // ---- Visualizations ----
            ui.separator();
            ui.heading("Visualizations");

            ui.strong(format!(
                "Airport Type Distribution ({} airports)",
                views.summary.counts_by_type.total()
            ));
            charts::count_bar_chart(ui, "type_bar_chart", &views.summary.counts_by_type);

            ui.add_space(8.0);
            ui.strong("Elevation Category Proportion");
            charts::elevation_pie(ui, state);

            ui.add_space(8.0);
            ui.horizontal(|ui: &mut Ui| {
                ui.strong("Airport Locations Map");
                ui.label("weight:");
                egui::ComboBox::from_id_salt("heat_weight")
                    .selected_text(options.heat_weight.map_or("count", Metric::label))
                    .show_ui(ui, |ui: &mut Ui| {
                        ui.selectable_value(&mut options.heat_weight, None, "count");
                        for m in Metric::ALL {
                            ui.selectable_value(&mut options.heat_weight, Some(m), m.label());
                        }
                    });
            });
            heatmap::airport_map(ui, state, &visible);

            ui.add_space(8.0);
            ui.strong(format!(
                "Elevation Distribution ({} airports)",
                views.histogram.total()
            ));
            charts::elevation_histogram(ui, &views.histogram);

            // ---- Analysis ----
            ui.separator();
            ui.heading("Summary Statistics");
            tables::summary(ui, &views.summary);

            ui.separator();
            ui.horizontal(|ui: &mut Ui| {
                ui.heading("Pivot Table");
                attribute_combo(ui, "pivot_rows", &mut options.pivot_rows);
                ui.label("×");
                attribute_combo(ui, "pivot_cols", &mut options.pivot_cols);
                egui::ComboBox::from_id_salt("pivot_agg")
                    .selected_text(options.pivot_agg.to_string())
                    .show_ui(ui, |ui: &mut Ui| {
                        for agg in AggFn::ALL {
                            ui.selectable_value(&mut options.pivot_agg, agg, agg.to_string());
                        }
                    });
                if options.pivot_agg != AggFn::Count {
                    ui.label("of");
                    metric_combo(ui, "pivot_metric", &mut options.pivot_metric);
                }
            });
            tables::pivot_table(ui, &views.pivot);

            ui.separator();
            ui.horizontal(|ui: &mut Ui| {
                ui.heading("Top");
                ui.add(egui::DragValue::new(&mut options.top_n).range(1..=100));
                ui.label("by");
                metric_combo(ui, "top_metric", &mut options.top_metric);
            });
            let top: Vec<&AirportRecord> = views.top.iter().collect();
            tables::airport_table(ui, "top_table", &top, 260.0);
        });

    state.set_options(options);
}
