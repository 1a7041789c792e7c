use eframe::egui::{ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::filter::FilteredView;

const ROW_HEIGHT: f32 = 18.0;

/// Render the filtered rows with every column of the dataset.
pub fn filtered_table(ui: &mut Ui, view: &FilteredView<'_>) {
    let table = &view.dataset.table;

    ScrollArea::horizontal()
        .id_salt("filtered_table_scroll")
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .vscroll(false)
                .columns(Column::auto().at_least(80.0), table.columns.len())
                .header(ROW_HEIGHT + 4.0, |mut header| {
                    for name in &table.columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(ROW_HEIGHT, view.len(), |mut row| {
                        let cells = &table.rows[view.indices[row.index()]];
                        for cell in cells {
                            row.col(|ui: &mut Ui| {
                                ui.label(cell.to_string());
                            });
                        }
                    });
                });
        });
}
