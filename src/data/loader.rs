use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Date32Type, Float32Type, Float64Type, Int32Type, Int64Type};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Days, NaiveDate};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::{LoadError, Result};
use super::model::{CellValue, Dataset, RawTable, SourceVariant};
use super::normalize;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load and normalize a project dataset in one step.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let raw = load_file(path)?;
    log::debug!(
        "Read {} rows x {} columns from {} ({})",
        raw.rows.len(),
        raw.headers.len(),
        path.display(),
        raw.variant
    );
    Ok(normalize::normalize(raw))
}

/// Load a raw table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – delimited text, `;` (preferred) or `,` separated
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – first worksheet
/// * `.parquet`      – flat columns of strings, numbers and dates
/// * `.json`         – `[{ "Region": "...", ... }, ...]`
pub fn load_file(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" => load_delimited(path),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_spreadsheet(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        other => Err(LoadError::UnsupportedExtension(other.to_string())),
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| LoadError::FileRead {
        path: PathBuf::from(path),
        source,
    })
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse delimited text.  Every cell is kept as text here; typing happens in
/// the normalizer.  Invalid UTF-8 is replaced rather than rejected.
pub fn parse_delimited(bytes: &[u8]) -> Result<RawTable> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or(&[]);
    let delimiter = sniff_delimiter(&String::from_utf8_lossy(first_line));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(LoadError::MissingHeader);
    }

    let mut table = RawTable::new(headers, SourceVariant::DelimitedText);
    for result in reader.byte_records() {
        let record = result?;
        let row = record
            .iter()
            .map(|field| CellValue::text(&String::from_utf8_lossy(field)))
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

fn load_delimited(path: &Path) -> Result<RawTable> {
    parse_delimited(&read_bytes(path)?)
}

/// Pick `;` unless the header line clearly uses `,`.
fn sniff_delimiter(header_line: &str) -> u8 {
    let semicolons = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if commas > semicolons {
        b','
    } else {
        b';'
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Read the first worksheet of a workbook.  The first row is the header.
fn load_spreadsheet(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(LoadError::NoSheets)?;
    let range = workbook.worksheet_range(&first)?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or(LoadError::MissingHeader)?
        .iter()
        .map(|cell| cell.to_string())
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(LoadError::MissingHeader);
    }

    let mut table = RawTable::new(headers, SourceVariant::Spreadsheet);
    for row in rows {
        table.push_row(row.iter().map(spreadsheet_cell).collect());
    }
    Ok(table)
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        // `as_datetime` honours the workbook's 1904 date system.
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|t| CellValue::Date(t.date()))
            .unwrap_or(CellValue::Null),
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

/// Serial of 9999-12-31, the last day a workbook can store.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Convert a spreadsheet serial day number (1900 date system) to a date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.trunc() as u64))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Region": "Metropolitana", "Año Adjudicacion": 2019, ... },
///   ...
/// ]
/// ```
///
/// Columns are the union of keys in first-seen order.
pub fn parse_json(text: &str) -> Result<RawTable> {
    let root: JsonValue = serde_json::from_str(text)?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::JsonLayout("se esperaba un arreglo en la raíz".into()))?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::JsonLayout(format!("la fila {i} no es un objeto")))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    if headers.is_empty() {
        return Err(LoadError::MissingHeader);
    }

    let mut table = RawTable::new(headers, SourceVariant::Json);
    for rec in records {
        let row = table
            .headers
            .iter()
            .map(|h| rec.get(h).map(json_cell).unwrap_or(CellValue::Null))
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

fn load_json(path: &Path) -> Result<RawTable> {
    let bytes = read_bytes(path)?;
    parse_json(&String::from_utf8_lossy(&bytes))
}

fn json_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::text(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Text(b.to_string()),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet table.  Column names become headers; strings,
/// integers, floats and `Date32` columns are carried over, anything else is
/// rendered as text.
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::FileRead {
        path: PathBuf::from(path),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    if headers.is_empty() {
        return Err(LoadError::MissingHeader);
    }
    let reader = builder.build()?;

    let mut table = RawTable::new(headers, SourceVariant::Parquet);
    for batch_result in reader {
        let batch = batch_result?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| arrow_cell(col, row))
                .collect();
            table.push_row(cells);
        }
    }
    Ok(table)
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::text(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => CellValue::text(col.as_string::<i64>().value(row)),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Date32 => {
            let days = col.as_primitive::<Date32Type>().value(row);
            NaiveDate::from_ymd_opt(1970, 1, 1)
                .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(days as i64)))
                .map(CellValue::Date)
                .unwrap_or(CellValue::Null)
        }
        DataType::Boolean => CellValue::Text(col.as_boolean().value(row).to_string()),
        other => CellValue::Text(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const VERSION_ONE: &str = "Año Adjudicacion;Region;Sector Economico;Financiamiento Innova\n\
                               2019;Metropolitana;TIC;$1.000.000\n\
                               2020;Biobío;Agrícola;N/D\n";

    #[test]
    fn test_parse_delimited_semicolon() {
        let raw = parse_delimited(VERSION_ONE.as_bytes()).unwrap();
        assert_eq!(raw.variant, SourceVariant::DelimitedText);
        assert_eq!(raw.headers.len(), 4);
        assert_eq!(raw.headers[0], "Año Adjudicacion");
        assert_eq!(raw.rows.len(), 2);
        assert_eq!(raw.rows[0][3], CellValue::Text("$1.000.000".into()));
        assert_eq!(raw.rows[1][1], CellValue::Text("Biobío".into()));
    }

    #[test]
    fn test_parse_delimited_comma_detected() {
        let raw = parse_delimited(b"Region,Sector\nMaule,TIC\n").unwrap();
        assert_eq!(raw.headers, vec!["Region", "Sector"]);
        assert_eq!(raw.rows[0][0], CellValue::Text("Maule".into()));
    }

    #[test]
    fn test_parse_delimited_strips_bom_and_pads_rows() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"Region;Sector;Monto\nMaule;TIC\n");
        let raw = parse_delimited(&bytes).unwrap();
        assert_eq!(raw.headers[0], "Region");
        assert_eq!(raw.rows[0].len(), 3);
        assert_eq!(raw.rows[0][2], CellValue::Null);
    }

    #[test]
    fn test_parse_delimited_empty_input() {
        let err = parse_delimited(b"").unwrap_err();
        assert!(matches!(err, LoadError::MissingHeader));
    }

    #[test]
    fn test_parse_json_records() {
        let raw = parse_json(r#"[{"Region":"Maule","Año":2019},{"Region":null,"Monto":1.5}]"#)
            .unwrap();
        assert_eq!(raw.variant, SourceVariant::Json);
        assert_eq!(raw.headers.len(), 3);
        let region = raw.headers.iter().position(|h| h == "Region").unwrap();
        let monto = raw.headers.iter().position(|h| h == "Monto").unwrap();
        assert_eq!(raw.rows[0][region], CellValue::Text("Maule".into()));
        assert_eq!(raw.rows[1][region], CellValue::Null);
        assert_eq!(raw.rows[1][monto], CellValue::Float(1.5));
        assert_eq!(raw.rows[0][monto], CellValue::Null);
    }

    #[test]
    fn test_parse_json_rejects_non_array() {
        let err = parse_json(r#"{"Region":"Maule"}"#).unwrap_err();
        assert!(matches!(err, LoadError::JsonLayout(_)));
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(
            excel_serial_to_date(43466.0),
            NaiveDate::from_ymd_opt(2019, 1, 1)
        );
        assert_eq!(
            excel_serial_to_date(43466.75),
            NaiveDate::from_ymd_opt(2019, 1, 1)
        );
        assert_eq!(excel_serial_to_date(0.0), None);
        assert_eq!(excel_serial_to_date(f64::NAN), None);
        assert_eq!(excel_serial_to_date(20_150_623.0), None);
    }

    #[test]
    fn test_spreadsheet_cell_dates_follow_date_system() {
        use calamine::{ExcelDateTime, ExcelDateTimeType};

        let expected = NaiveDate::from_ymd_opt(2015, 6, 23).unwrap();
        let in_1900 = ExcelDateTime::new(42178.0, ExcelDateTimeType::DateTime, false);
        let in_1904 = ExcelDateTime::new(40716.0, ExcelDateTimeType::DateTime, true);
        assert_eq!(spreadsheet_cell(&Data::DateTime(in_1900)), CellValue::Date(expected));
        assert_eq!(spreadsheet_cell(&Data::DateTime(in_1904)), CellValue::Date(expected));
        assert_eq!(spreadsheet_cell(&Data::Float(1.5e6)), CellValue::Float(1.5e6));
        assert_eq!(spreadsheet_cell(&Data::Empty), CellValue::Null);
    }

    #[test]
    fn test_load_spreadsheet_first_sheet() {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("proyectos.xlsx");

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let sheet = workbook.add_worksheet();
        let headers = [
            "Año Adjudicación",
            "Región",
            "Sector Económico",
            "Financiamiento Innova",
            "Inicio Actividad Económica",
        ];
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        sheet.write_number(1, 0, 2019.0).unwrap();
        sheet.write_string(1, 1, "Metropolitana").unwrap();
        sheet.write_string(1, 2, "TIC").unwrap();
        sheet.write_number(1, 3, 1_000_000.0).unwrap();
        let start = ExcelDateTime::from_ymd(2015, 6, 23).unwrap();
        sheet
            .write_datetime_with_format(1, 4, &start, &date_format)
            .unwrap();
        workbook.save(&path).unwrap();

        let dataset = load_dataset(&path).unwrap();
        assert_eq!(dataset.variant, SourceVariant::Spreadsheet);
        assert_eq!(
            dataset.table.columns,
            vec![
                "ano_adjudicacion",
                "region",
                "sector_economico",
                "financiamiento_innova",
                "inicio_actividad_economica",
            ]
        );
        assert!(dataset.schema.missing.contains(&"tipo_innovacion".to_string()));

        let rec = &dataset.records[0];
        assert_eq!(dataset.len(), 1);
        assert_eq!(rec.award_year, 2019);
        assert_eq!(rec.region.as_deref(), Some("Metropolitana"));
        assert_eq!(rec.funding, Some(1_000_000.0));
        assert_eq!(rec.activity_start, NaiveDate::from_ymd_opt(2015, 6, 23));
    }

    #[test]
    fn test_load_parquet_columns() {
        use std::sync::Arc;

        use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("proyectos.parquet");

        let batch = RecordBatch::try_from_iter(vec![
            (
                "Año Adjudicación",
                Arc::new(Int64Array::from(vec![2019, 2020])) as ArrayRef,
            ),
            (
                "Región",
                Arc::new(StringArray::from(vec![Some("Maule"), None])) as ArrayRef,
            ),
            (
                "Financiamiento Innova",
                Arc::new(Float64Array::from(vec![1234.5, 2_000_000.0])) as ArrayRef,
            ),
            (
                "Inicio Actividad Económica",
                Arc::new(Date32Array::from(vec![16609, 0])) as ArrayRef,
            ),
        ])
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let dataset = load_dataset(&path).unwrap();
        assert_eq!(dataset.variant, SourceVariant::Parquet);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].award_year, 2019);
        assert_eq!(dataset.records[0].region.as_deref(), Some("Maule"));
        assert_eq!(dataset.records[1].region, None);
        assert_eq!(dataset.records[0].funding, Some(1234.5));
        assert_eq!(
            dataset.records[0].activity_start,
            NaiveDate::from_ymd_opt(2015, 6, 23)
        );
        assert_eq!(
            dataset.records[1].activity_start,
            NaiveDate::from_ymd_opt(1970, 1, 1)
        );
    }

    #[test]
    fn test_load_file_dispatch_and_errors() {
        let dir = TempDir::new().unwrap();

        let csv_path = dir.path().join("proyectos.csv");
        let mut f = std::fs::File::create(&csv_path).unwrap();
        f.write_all(VERSION_ONE.as_bytes()).unwrap();
        let raw = load_file(&csv_path).unwrap();
        assert_eq!(raw.rows.len(), 2);

        let err = load_file(&dir.path().join("notes.pdf")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedExtension(ref e) if e == "pdf"));

        let err = load_file(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, LoadError::FileRead { .. }));
    }

    #[test]
    fn test_load_dataset_normalizes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("proyectos.csv");
        std::fs::write(&path, VERSION_ONE).unwrap();

        let dataset = load_dataset(&path).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].award_year, 2019);
        assert_eq!(dataset.records[0].funding, Some(1_000_000.0));
        assert_eq!(dataset.records[1].funding, None);
    }
}
