mod app;
mod color;
mod config;
mod data;
mod error;
mod export;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use eframe::egui;

use app::IncidentInsightApp;
use config::Settings;
use data::loader::load_table;
use state::AppState;

#[derive(Parser)]
#[command(name = "incident-insight")]
#[command(about = "Explore an incident event log: filters, counts and trends", long_about = None)]
struct Cli {
    /// JSON settings file (defaults to ./incident-insight.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Incident event log CSV
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive dashboard (default)
    Dashboard,
    /// Write the top category bar chart of the whole log to an HTML file
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        top: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut settings = Settings::resolve(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        settings.data_path = data;
    }

    match cli.command.unwrap_or(Commands::Dashboard) {
        Commands::Dashboard => run_dashboard(settings),
        Commands::Export { out, top } => {
            let out = out.unwrap_or_else(|| settings.export_path.clone());
            let top = top.unwrap_or(settings.top_categories);
            let table = load_table(&settings.data_path)?;
            export::write_category_chart(&table, &out, top)
                .with_context(|| format!("exporting category chart to {}", out.display()))?;
            println!("Plot saved to {}", out.display());
            Ok(())
        }
    }
}

fn run_dashboard(settings: Settings) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    let state = AppState::new(settings);
    eframe::run_native(
        "Incident Log Analyzer",
        options,
        Box::new(move |_cc| Ok(Box::new(IncidentInsightApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("dashboard failed: {e}"))
}
