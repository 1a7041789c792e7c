use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::config::Cli;
use crate::state::{AppState, Report};
use crate::ui::{charts, panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InnovaDashboardApp {
    pub state: AppState,
}

impl InnovaDashboardApp {
    /// Build the app, opening the file given on the command line (if any)
    /// with the requested initial filters.
    pub fn from_cli(cli: &Cli) -> Self {
        let mut state = AppState {
            export_name: cli.export_name.clone(),
            ..AppState::default()
        };
        if let Some(path) = &cli.file {
            state.open_path(path);
            if let Some(criteria) = state.session.as_ref().map(|s| cli.criteria(&s.options)) {
                state.set_criteria(criteria);
            }
        }
        Self { state }
    }
}

impl eframe::App for InnovaDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: metrics, charts, table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            dashboard(ui, &self.state);
        });
    }
}

fn dashboard(ui: &mut Ui, state: &AppState) {
    let (session, summary) = match (&state.session, &state.report) {
        (Some(session), Report::Ready { summary, .. }) => (session, summary),
        (Some(_), Report::Empty) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label(
                    RichText::new("No hay datos que coincidan con los filtros seleccionados.")
                        .color(Color32::YELLOW)
                        .heading(),
                );
            });
            return;
        }
        _ => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Abra un archivo para ver los proyectos  (Archivo → Abrir…)");
            });
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Indicadores Clave");
            charts::metrics(ui, summary);
            ui.separator();

            // A chart is skipped when its column is missing from the source.
            if !summary.by_innovation_type.is_empty() {
                charts::vertical_bar_chart(
                    ui,
                    "by_innovation_type",
                    "Proyectos por Tipo de Innovación",
                    &summary.by_innovation_type.descending(),
                    &session.type_colors,
                );
                ui.separator();
            }

            charts::vertical_bar_chart(
                ui,
                "by_region",
                "Cantidad de Proyectos por Región",
                &summary.by_region.descending(),
                &session.region_colors,
            );
            ui.separator();

            charts::horizontal_bar_chart(
                ui,
                "by_sector",
                "Cantidad de Proyectos por Sector Económico",
                &summary.by_sector.ascending(),
                &session.sector_colors,
            );
            ui.separator();

            ui.heading("Tabla de Datos Filtrada");
            if let Some(view) = state.view() {
                table::filtered_table(ui, &view);
            }
        });
}
