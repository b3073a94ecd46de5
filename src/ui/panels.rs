use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::NumericRange;
use crate::data::model::{Attribute, CategoryValue, Metric};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let groups: Vec<(Attribute, Vec<CategoryValue>)> = vec![
        (
            Attribute::State,
            dataset.states.iter().map(|s| CategoryValue::State(*s)).collect(),
        ),
        (
            Attribute::Type,
            dataset.types.iter().map(|t| CategoryValue::Type(*t)).collect(),
        ),
        (
            Attribute::ElevationCategory,
            dataset
                .elevation_categories
                .iter()
                .map(|c| CategoryValue::Elevation(*c))
                .collect(),
        ),
    ];
    let extents = Metric::ALL.map(|m| (m, dataset.extent(m)));

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Categorical filters (collapsible) ----
            for (attribute, values) in &groups {
                let n_selected = values.iter().filter(|v| state.is_selected(v)).count();
                let header_text = format!("{}  ({n_selected}/{})", attribute.label(), values.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(attribute.label())
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all(*attribute);
                        }
                        for value in values {
                            let mut checked = state.is_selected(value);
                            // The last selected value stays selected.
                            let locked = checked && n_selected == 1;
                            let resp = ui.add_enabled(
                                !locked,
                                egui::Checkbox::new(&mut checked, value.to_string()),
                            );
                            if resp.changed() {
                                state.toggle_filter_value(*value);
                            }
                        }
                    });
            }

            ui.separator();
            ui.strong("Numeric Filters");
            for (metric, extent) in extents {
                range_filter(ui, state, metric, extent.map(|e| (e.min, e.max)));
            }

            ui.separator();
            ui.strong("Pie Chart Categories");
            let categories: Vec<_> = state
                .views
                .as_ref()
                .map(|v| {
                    v.elevation_counts
                        .entries
                        .iter()
                        .filter_map(|(value, _)| match value {
                            CategoryValue::Elevation(c) => Some(*c),
                            _ => None,
                        })
                        .collect()
                })
                .unwrap_or_default();
            for category in categories {
                let mut shown = !state.pie_hidden.contains(&category);
                if ui
                    .checkbox(&mut shown, format!("Show {category} Elevation"))
                    .changed()
                {
                    state.toggle_pie_category(category);
                }
            }

            if let Some(err) = &state.filter_error {
                ui.separator();
                ui.label(RichText::new(err).color(Color32::RED));
            }
        });
}

/// Min/max sliders for one numeric column, off by default.
fn range_filter(ui: &mut Ui, state: &mut AppState, metric: Metric, extent: Option<(f64, f64)>) {
    let Some((lo, hi)) = extent else {
        ui.label(RichText::new(format!("{}: no data", metric.label())).weak());
        return;
    };

    let current = state.filters.range(metric);
    let mut enabled = current.is_some();
    if ui.checkbox(&mut enabled, metric.label()).changed() {
        let range = enabled.then(|| NumericRange::new(lo, hi));
        state.set_range(metric, range);
        return;
    }

    let Some(mut range) = current else {
        return;
    };
    let min_changed = ui
        .add(egui::Slider::new(&mut range.min, lo..=hi).text("min"))
        .changed();
    let max_changed = ui
        .add(egui::Slider::new(&mut range.max, lo..=hi).text("max"))
        .changed();
    if min_changed || max_changed {
        state.set_range(metric, Some(range));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let visible = state.views.as_ref().map_or(0, |v| v.summary.total);
            ui.label(format!("{} airports loaded, {visible} visible", ds.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open airport data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}
