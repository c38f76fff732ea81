use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use std::collections::BTreeSet;

use crate::data::aggregate::KeyMetrics;
use crate::data::model::{ColumnProfile, IncidentTable, NumericSummary};
use crate::data::view::DashboardView;

/// The four headline numbers side by side.
pub fn metrics_row(ui: &mut Ui, metrics: &KeyMetrics) {
    let items = [
        ("Total Unique Incidents", metrics.total_incidents),
        ("Active Incidents", metrics.active_incidents),
        ("Resolved Incidents", metrics.resolved_incidents),
        ("Closed Incidents", metrics.closed_incidents),
    ];
    ui.columns(items.len(), |cols: &mut [Ui]| {
        for (col, (label, value)) in cols.iter_mut().zip(items) {
            col.vertical_centered(|ui: &mut Ui| {
                ui.label(label);
                ui.label(RichText::new(value.to_string()).size(28.0).strong());
            });
        }
    });
}

/// Shape of the loaded table, per-column information and summary
/// statistics of the numeric columns.
pub fn dataset_overview(ui: &mut Ui, table: &IncidentTable, profiles: &[ColumnProfile]) {
    ui.label(format!("Number of rows: {}", table.len()));
    ui.label(format!("Number of columns: {}", table.columns.len()));

    egui::CollapsingHeader::new("Column information")
        .id_salt("column_info")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("column_info_grid")
                .striped(true)
                .num_columns(4)
                .show(ui, |ui: &mut Ui| {
                    for heading in ["Column", "Type", "Non-null", "Missing"] {
                        ui.strong(heading);
                    }
                    ui.end_row();
                    for profile in profiles {
                        ui.label(profile.name.as_str());
                        ui.label(profile.kind.label());
                        ui.label(profile.non_null.to_string());
                        ui.label(profile.missing.to_string());
                        ui.end_row();
                    }
                });
        });

    egui::CollapsingHeader::new("Summary statistics")
        .id_salt("summary_stats")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let numeric: Vec<(&str, &NumericSummary)> = profiles
                .iter()
                .filter_map(|p| p.numeric.as_ref().map(|s| (p.name.as_str(), s)))
                .collect();
            if numeric.is_empty() {
                ui.label("No numeric columns.");
                return;
            }
            egui::Grid::new("summary_grid")
                .striped(true)
                .num_columns(9)
                .show(ui, |ui: &mut Ui| {
                    for heading in ["Column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"] {
                        ui.strong(heading);
                    }
                    ui.end_row();
                    for (name, stats) in numeric {
                        ui.label(name);
                        ui.label(stats.count.to_string());
                        ui.label(format!("{:.3}", stats.mean));
                        ui.label(stats.std.map_or_else(|| "-".to_string(), |s| format!("{s:.3}")));
                        for value in [stats.min, stats.q1, stats.median, stats.q3, stats.max] {
                            ui.label(format!("{value:.3}"));
                        }
                        ui.end_row();
                    }
                });
        });
}

/// Column chooser plus the first rows of the filtered table. Returns the
/// column whose checkbox was flipped this frame, if any.
pub fn preview_table(
    ui: &mut Ui,
    view: &DashboardView,
    selected: &BTreeSet<String>,
) -> Option<String> {
    let mut toggled: Option<String> = None;
    egui::CollapsingHeader::new("Columns to display")
        .id_salt("preview_columns")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal_wrapped(|ui: &mut Ui| {
                for name in &view.filtered.columns {
                    let mut checked = selected.contains(name);
                    if ui.checkbox(&mut checked, name.as_str()).changed() {
                        toggled = Some(name.clone());
                    }
                }
            });
        });

    let shown: Vec<usize> = view
        .filtered
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| selected.contains(*name))
        .map(|(i, _)| i)
        .collect();

    if shown.is_empty() {
        ui.label("Please select at least one column to display.");
    } else {
        let rows = view.preview();
        egui::ScrollArea::horizontal()
            .id_salt("preview_scroll")
            .show(ui, |ui: &mut Ui| {
                TableBuilder::new(ui)
                    .striped(true)
                    .resizable(true)
                    .max_scroll_height(320.0)
                    .columns(Column::auto().at_least(60.0), shown.len())
                    .header(20.0, |mut header| {
                        for &idx in &shown {
                            header.col(|ui: &mut Ui| {
                                ui.strong(view.filtered.columns[idx].as_str());
                            });
                        }
                    })
                    .body(|body| {
                        body.rows(18.0, rows.len(), |mut row| {
                            let record = &rows[row.index()];
                            for &idx in &shown {
                                row.col(|ui: &mut Ui| {
                                    ui.label(record.cells.get(idx).map_or("", String::as_str));
                                });
                            }
                        });
                    });
            });
    }

    toggled
}
