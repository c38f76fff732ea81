use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::model::CategoricalColumn;
use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct IncidentInsightApp {
    pub state: AppState,
}

impl IncidentInsightApp {
    /// Start the app with the configured source already loaded.
    pub fn new(mut state: AppState) -> Self {
        let source = state.source.clone();
        state.open_source(&source);
        Self { state }
    }
}

impl eframe::App for IncidentInsightApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: dashboard ----
        egui::CentralPanel::default().show(ctx, |ui| {
            dashboard(ui, &mut self.state);
        });
    }
}

fn dashboard(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Incident Log Analyzer");
    ui.label("Analyze incident trends and key metrics.");
    ui.separator();

    if let Some(msg) = &state.status_message {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(RichText::new(msg).color(Color32::RED).size(16.0));
        });
        return;
    }

    let Some(view) = &state.view else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open an incident log to begin  (File → Open…)");
        });
        return;
    };

    let mut toggled_column = None;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Key Metrics");
            table::metrics_row(ui, &view.metrics);
            if view.filtered.is_empty() {
                ui.label(RichText::new("No incidents match the current filters.").italics());
            }
            ui.separator();

            ui.strong("Incident Trends and Distributions");
            ui.label("Incident Count by State");
            plot::count_bar_chart(
                ui,
                "state_counts",
                CategoricalColumn::IncidentState.label(),
                &view.state_counts,
            );

            ui.label(format!(
                "Top {} Incident Categories",
                state.settings.top_categories
            ));
            plot::count_bar_chart(
                ui,
                "category_counts",
                CategoricalColumn::Category.label(),
                &view.category_counts,
            );

            ui.label("Incident Distribution by Priority");
            plot::pie_chart(ui, &view.priority);

            ui.label("Incidents Opened Over Time");
            plot::time_series_chart(ui, &view.opened_per_day);
            ui.separator();

            if let Some(source) = &state.table {
                ui.strong("Dataset Overview");
                table::dataset_overview(ui, source, &state.column_profiles);
                ui.separator();
            }

            ui.strong("Filtered Incident Data Sample");
            toggled_column = table::preview_table(ui, view, &state.preview_columns);
        });

    if let Some(name) = toggled_column {
        state.toggle_preview_column(&name);
    }
}
