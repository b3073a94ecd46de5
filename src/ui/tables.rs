use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::aggregate::{PivotTable, Summary};
use crate::data::model::AirportRecord;

const ROW_HEIGHT: f32 = 18.0;

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "–".to_string(), |v| format!("{v:.0}"))
}

/// Display a pivot cell; absent cells are not zero.
pub fn fmt_cell(v: Option<f64>) -> String {
    match v {
        None => "no data".to_string(),
        Some(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => format!("{v:.2}"),
    }
}

// ---------------------------------------------------------------------------
// Airport listing (filtered data, top-N)
// ---------------------------------------------------------------------------

pub fn airport_table(ui: &mut Ui, id: &str, airports: &[&AirportRecord], max_height: f32) {
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .max_scroll_height(max_height)
            .column(Column::auto())
            .column(Column::auto().at_least(180.0).clip(true))
            .columns(Column::auto(), 5)
            .column(Column::remainder())
            .header(ROW_HEIGHT + 2.0, |mut header| {
                for title in [
                    "Ident",
                    "Name",
                    "State",
                    "Type",
                    "Elevation (ft)",
                    "Runway (ft)",
                    "Lat / Lon",
                    "Municipality",
                ] {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, airports.len(), |mut row| {
                    let rec = airports[row.index()];
                    row.col(|ui: &mut Ui| {
                        ui.label(&rec.ident);
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(&rec.name);
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.state.code());
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.airport_type.as_str());
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(fmt_opt(rec.elevation_ft));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(fmt_opt(rec.runway_length_ft));
                    });
                    row.col(|ui: &mut Ui| {
                        let pos = match (rec.latitude_deg, rec.longitude_deg) {
                            (Some(lat), Some(lon)) => format!("{lat:.3}, {lon:.3}"),
                            _ => "–".to_string(),
                        };
                        ui.label(pos);
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.municipality.as_deref().unwrap_or("–"));
                    });
                });
            });
    });
}

// ---------------------------------------------------------------------------
// Pivot table
// ---------------------------------------------------------------------------

pub fn pivot_table(ui: &mut Ui, table: &PivotTable) {
    if table.rows.is_empty() {
        ui.label("No data.");
        return;
    }
    ui.push_id("pivot_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(60.0))
            .columns(Column::auto().at_least(70.0), table.columns.len())
            .header(ROW_HEIGHT + 2.0, |mut header| {
                header.col(|ui: &mut Ui| {
                    ui.strong(format!(
                        "{} \\ {}",
                        table.row_attribute.label(),
                        table.col_attribute.label()
                    ));
                });
                for col in &table.columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(col.to_string());
                    });
                }
            })
            .body(|mut body| {
                for row_value in &table.rows {
                    body.row(ROW_HEIGHT, |mut row| {
                        row.col(|ui: &mut Ui| {
                            ui.strong(row_value.to_string());
                        });
                        for col_value in &table.columns {
                            let cell = table.get(row_value, col_value);
                            row.col(|ui: &mut Ui| {
                                let text = RichText::new(fmt_cell(cell));
                                ui.label(if cell.is_none() { text.weak() } else { text });
                            });
                        }
                    });
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

pub fn summary(ui: &mut Ui, summary: &Summary) {
    ui.label(format!("Total Airports: {}", summary.total));
    match summary.mean_elevation {
        Some(mean) => ui.label(format!("Average Elevation: {mean:.2} ft")),
        None => ui.label("Average Elevation: n/a"),
    };
    ui.label("Airport Counts by Type:");
    ui.indent("type_counts", |ui: &mut Ui| {
        for (value, n) in &summary.counts_by_type.entries {
            ui.monospace(format!("{value}: {n}"));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_cells_read_no_data() {
        assert_eq!(fmt_cell(None), "no data");
        assert_eq!(fmt_cell(Some(0.0)), "0");
        assert_eq!(fmt_cell(Some(3.0)), "3");
        assert_eq!(fmt_cell(Some(2.5)), "2.50");
    }
}
