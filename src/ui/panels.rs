use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::color::ColorMap;
use crate::state::{AppState, Report};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filtros");
    ui.separator();

    let Some(session) = &state.session else {
        ui.label("No hay datos cargados.");
        return;
    };

    // Clone what we need so we can mutate state inside the closures.
    let options = session.options.clone();
    let criteria = session.criteria.clone();
    let missing = session.dataset.schema.missing.clone();
    let region_colors = session.region_colors.clone();
    let sector_colors = session.sector_colors.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Award year range ----
            ui.strong("Año de adjudicación");
            let (min, max) = options.year_bounds;
            let (mut lo, mut hi) = criteria.years;
            let from = ui.add(egui::Slider::new(&mut lo, min..=max).text("desde"));
            let to = ui.add(egui::Slider::new(&mut hi, min..=max).text("hasta"));
            if from.changed() || to.changed() {
                state.set_years(lo, hi);
            }
            ui.separator();

            // ---- Region / sector multi-selects ----
            let toggled = multi_select(
                ui,
                "Región",
                &options.regions,
                &criteria.regions,
                &region_colors,
            );
            match toggled {
                Selection::All => state.select_all_regions(true),
                Selection::None => state.select_all_regions(false),
                Selection::Toggle(region) => state.toggle_region(&region),
                Selection::Unchanged => {}
            }

            let toggled = multi_select(
                ui,
                "Sector económico",
                &options.sectors,
                &criteria.sectors,
                &sector_colors,
            );
            match toggled {
                Selection::All => state.select_all_sectors(true),
                Selection::None => state.select_all_sectors(false),
                Selection::Toggle(sector) => state.toggle_sector(&sector),
                Selection::Unchanged => {}
            }

            // ---- Schema gaps ----
            if !missing.is_empty() {
                ui.separator();
                ui.label(RichText::new("Columnas no encontradas").color(Color32::YELLOW));
                for col in &missing {
                    ui.label(RichText::new(format!("• {col}")).small());
                }
            }
        });
}

/// What the user did in a multi-select this frame.
enum Selection {
    Unchanged,
    All,
    None,
    Toggle(String),
}

/// Collapsible checkbox list with select-all / select-none buttons.
fn multi_select(
    ui: &mut Ui,
    title: &str,
    all_values: &BTreeSet<String>,
    selected: &BTreeSet<String>,
    colors: &ColorMap,
) -> Selection {
    let mut action = Selection::Unchanged;

    // Show count of selected / total in the header
    let header_text = format!("{title}  ({}/{})", selected.len(), all_values.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("Todos").clicked() {
                    action = Selection::All;
                }
                if ui.small_button("Ninguno").clicked() {
                    action = Selection::None;
                }
            });

            for val in all_values {
                let mut checked = selected.contains(val);
                let text = RichText::new(val).color(colors.color_for(val));
                if ui.checkbox(&mut checked, text).changed() {
                    action = Selection::Toggle(val.clone());
                }
            }
        });

    action
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Archivo", |ui: &mut Ui| {
            if ui.button("Abrir…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = matches!(state.report, Report::Ready { .. });
            if ui
                .add_enabled(can_export, egui::Button::new("Exportar CSV…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(session) = &state.session {
            let visible = match &state.report {
                Report::Ready { indices, .. } => indices.len(),
                _ => 0,
            };
            ui.label(format!(
                "{} ({}): {} proyectos cargados, {} visibles",
                session
                    .source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                session.dataset.variant,
                session.dataset.len(),
                visible
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Abrir datos de proyectos")
        .add_filter(
            "Archivos compatibles",
            &["csv", "txt", "xlsx", "xlsm", "xlsb", "xls", "ods", "parquet", "pq", "json"],
        )
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("Planilla", &["xlsx", "xlsm", "xlsb", "xls", "ods"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}

pub fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Exportar datos filtrados")
        .set_file_name(state.export_name.as_str())
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        match state.export_to(&path) {
            Ok(()) => {
                state.status_message = None;
            }
            Err(e) => {
                log::error!("Export failed: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
