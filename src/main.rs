mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use anyhow::{Context, Result};
use app::InnovaDashboardApp;
use clap::Parser;
use config::Cli;
use data::aggregate::summarize;
use data::filter::{apply, FilterOptions};
use eframe::egui;

fn main() -> Result<()> {
    let cli = Cli::parse();
    config::init_logging(cli.log_level.as_deref());

    if cli.is_headless() {
        return run_headless(&cli);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Dashboard de Innovación – InnovaChile Corfo",
        options,
        Box::new(move |_cc| Ok(Box::new(InnovaDashboardApp::from_cli(&cli)))),
    )
    .map_err(|e| anyhow::anyhow!("ejecutando la ventana: {e}"))
}

/// Load, filter, then export and/or print the summary without a window.
fn run_headless(cli: &Cli) -> Result<()> {
    let path = cli.file.as_deref().context("no se indicó un archivo de entrada")?;
    let dataset = data::loader::load_dataset(path)
        .with_context(|| format!("cargando {}", path.display()))?;
    log::info!("Loaded {} projects from {}", dataset.len(), path.display());

    let criteria = cli.criteria(&FilterOptions::from_dataset(&dataset));
    let Some(view) = apply(&dataset, &criteria).into_view() else {
        log::warn!("No rows match the selected filters; nothing written");
        return Ok(());
    };

    if let Some(out) = &cli.export {
        data::export::export_to_path(&view, out)?;
    }
    if cli.summary {
        let json = serde_json::to_string_pretty(&summarize(&view))
            .context("serializando el resumen")?;
        println!("{json}");
    }
    Ok(())
}
