use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::filter::FilteredView;
use super::model::CellValue;

/// Name offered for the exported file.
pub const DEFAULT_EXPORT_NAME: &str = "datos_innovacion_filtrados.csv";

/// Write the rows of a view as comma-separated UTF-8 text with a header row
/// of canonical column names.  Nulls are written as empty fields and
/// fractional amounts use a decimal comma, the way the loader reads them.
pub fn write_csv<W: Write>(view: &FilteredView<'_>, writer: W) -> Result<()> {
    let table = &view.dataset.table;
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&table.columns)
        .context("escribiendo la cabecera CSV")?;
    for &i in &view.indices {
        let row = &table.rows[i];
        out.write_record(row.iter().map(export_field))
            .with_context(|| format!("escribiendo la fila CSV {i}"))?;
    }
    out.flush().context("vaciando la salida CSV")?;
    Ok(())
}

fn export_field(cell: &CellValue) -> String {
    match cell {
        CellValue::Float(v) => v.to_string().replace('.', ","),
        other => other.to_string(),
    }
}

/// Render a view to an in-memory CSV document.
pub fn to_csv_bytes(view: &FilteredView<'_>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(view, &mut buf)?;
    Ok(buf)
}

/// Export a view to a file, replacing it if it exists.
pub fn export_to_path(view: &FilteredView<'_>, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creando {}", path.display()))?;
    write_csv(view, std::io::BufWriter::new(file))
        .with_context(|| format!("exportando a {}", path.display()))?;
    log::info!("Exported {} rows to {}", view.len(), path.display());
    Ok(())
}
