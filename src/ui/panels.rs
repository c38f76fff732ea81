use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::model::{display_value, CategoricalColumn};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// A selection change requested by a checkbox or button this frame.
enum FilterAction {
    Toggle(CategoricalColumn, String),
    SelectAll(CategoricalColumn),
    Clear(CategoricalColumn),
}

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Options");
    ui.separator();

    let Some(table) = state.table.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    let mut actions: Vec<FilterAction> = Vec::new();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            date_range_filter(ui, state);
            ui.separator();

            // ---- Per-column multi-selects (collapsible) ----
            for col in CategoricalColumn::ALL {
                let all_values = table.distinct_values(col);
                let selected = state.filters.selection(col);
                let n_selected = selected.map_or(all_values.len(), |s| s.len());
                let header_text = format!("{}  ({n_selected}/{})", col.label(), all_values.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col.name())
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                actions.push(FilterAction::SelectAll(col));
                            }
                            if ui.small_button("None").clicked() {
                                actions.push(FilterAction::Clear(col));
                            }
                        });

                        for val in all_values {
                            let mut checked = selected.map_or(true, |s| s.contains(val));
                            if ui.checkbox(&mut checked, display_value(val)).changed() {
                                actions.push(FilterAction::Toggle(col, val.clone()));
                            }
                        }
                    });
            }
        });

    // Apply after the loop so the widgets above read a consistent state.
    for action in actions {
        match action {
            FilterAction::Toggle(col, val) => state.toggle_filter_value(col, &val),
            FilterAction::SelectAll(col) => state.select_all(col),
            FilterAction::Clear(col) => state.select_none(col),
        }
    }
}

fn date_range_filter(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Opened At");

    let Some((min, max)) = state.opened_bounds else {
        ui.label("No parseable opened dates.");
        return;
    };

    let mut enabled = state.filters.opened.is_some();
    if ui.checkbox(&mut enabled, "Limit to date range").changed() {
        if enabled {
            state.set_date_range(min, max);
        } else {
            state.clear_date_range();
        }
    }

    let Some(range) = state.filters.opened else {
        return;
    };
    let mut start = range.start;
    let mut end = range.end;
    let mut changed = false;

    egui::Grid::new("opened_range").num_columns(2).show(ui, |ui: &mut Ui| {
        ui.label("From");
        changed |= ui
            .add(DatePickerButton::new(&mut start).id_salt("opened_from"))
            .changed();
        ui.end_row();
        ui.label("To");
        changed |= ui
            .add(DatePickerButton::new(&mut end).id_salt("opened_to"))
            .changed();
        ui.end_row();
    });

    if changed {
        state.set_date_range(start.clamp(min, max), end.clamp(min, max));
    }
    if ui.small_button("Reset").clicked() {
        state.reset_date_range();
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
            if ui.button("Reload").clicked() {
                state.notice = None;
                state.reload();
                ui.close_menu();
            }
            let can_export = state.table.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export category chart…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(table), Some(view)) = (&state.table, &state.view) {
            ui.label(format!(
                "{}: {} rows loaded, {} matching",
                state.source.display(),
                table.len(),
                view.filtered.len()
            ));
        }

        if let Some(msg) = &state.notice {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::LIGHT_GREEN));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open incident event log")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.notice = None;
        state.open_source(&path);
    }
}

pub fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export category chart")
        .add_filter("HTML", &["html"])
        .set_file_name(state.settings.export_path.to_string_lossy())
        .save_file();

    if let Some(path) = file {
        state.export_category_chart(&path);
    }
}
