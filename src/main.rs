//! Native service status dashboard
//!
//! Shows monitored services as a list or as an animated topology around a
//! central hub, driven by an entity list and a live health map.

mod app;
mod feed;
mod graph;
mod settings;
mod theme;

use clap::Parser;
use eframe::egui;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default, Parser)]
#[command(version, about = "Service status dashboard with a live topology view")]
pub struct Args {
    /// JSON file holding the entity list
    #[arg(long)]
    pub entities: Option<PathBuf>,

    /// JSON file holding the live health map
    #[arg(long, requires = "entities")]
    pub health: Option<PathBuf>,

    /// Seconds between feed polls
    #[arg(long)]
    pub poll_secs: Option<f32>,

    /// Use the built-in demo feed
    #[arg(long)]
    pub demo: bool,

    /// View to open with
    #[arg(long, value_enum)]
    pub view: Option<graph::View>,
}

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_title("Service Status"),
        persist_window: true,
        ..Default::default()
    };

    // No retry: a missing drawing backend means this host can't run the dashboard
    let result = eframe::run_native(
        "Service Status",
        options,
        Box::new(|cc| Ok(Box::new(app::DashboardApp::new(cc, args)))),
    );
    if let Err(ref e) = result {
        tracing::error!("Failed to open the dashboard window: {}", e);
    }
    result
}
