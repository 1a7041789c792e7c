use chrono::NaiveDate;

use super::loader::excel_serial_to_date;
use super::model::{CellValue, Dataset, RawTable, Record, SchemaReport, Table};

// ---------------------------------------------------------------------------
// Designated columns
// ---------------------------------------------------------------------------

/// How a designated column is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Year,
    Category,
    Currency,
    Date,
}

/// The columns the dashboard understands.  Everything else is carried along
/// as text for the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    AwardYear,
    Region,
    Sector,
    InnovationType,
    Funding,
    PrivateContribution,
    CertifiedLawAmount,
    ActivityStart,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::AwardYear,
        Column::Region,
        Column::Sector,
        Column::InnovationType,
        Column::Funding,
        Column::PrivateContribution,
        Column::CertifiedLawAmount,
        Column::ActivityStart,
    ];

    /// Name used in the normalized table and the export.
    pub fn canonical(self) -> &'static str {
        self.aliases()[0]
    }

    /// Canonical header spellings accepted for this column.  The first entry
    /// is the name the column is renamed to.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::AwardYear => &[
                "ano_adjudicacion",
                "ano_de_adjudicacion",
                "anio_adjudicacion",
                "ano",
            ],
            Column::Region => &["region", "region_ejecucion"],
            Column::Sector => &["sector_economico", "sector"],
            Column::InnovationType => &["tipo_innovacion", "tipo_de_innovacion"],
            Column::Funding => &["financiamiento_innova", "monto_financiamiento_innova"],
            Column::PrivateContribution => &[
                "aprobado_privado_pecuniario",
                "monto_aprobado_privado_pecuniario",
            ],
            Column::CertifiedLawAmount => &["monto_certificado_ley", "certificado_ley"],
            Column::ActivityStart => &[
                "inicio_actividad_economica",
                "fecha_inicio_actividad_economica",
            ],
        }
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            Column::AwardYear => ColumnKind::Year,
            Column::Region | Column::Sector | Column::InnovationType => ColumnKind::Category,
            Column::Funding | Column::PrivateContribution | Column::CertifiedLawAmount => {
                ColumnKind::Currency
            }
            Column::ActivityStart => ColumnKind::Date,
        }
    }
}

// ---------------------------------------------------------------------------
// Header canonicalization
// ---------------------------------------------------------------------------

fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'ä' | 'â' | 'Á' | 'À' | 'Ä' | 'Â' => 'a',
        'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'Ó' | 'Ò' | 'Ö' | 'Ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => 'u',
        'ñ' | 'Ñ' => 'n',
        other => other,
    }
}

/// Canonical form of a raw header: accents folded, lowercase, punctuation
/// dropped, whitespace runs turned into a single `_`.
///
/// `"  Año Adjudicación "` → `"ano_adjudicacion"`,
/// `"Financiamiento (Innova)"` → `"financiamiento_innova"`.
pub fn canonical_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.trim().chars().map(fold_accent) {
        if ch.is_whitespace() || ch == '_' {
            pending_sep = !out.is_empty();
        } else if ch.is_alphanumeric() {
            if pending_sep {
                out.push('_');
                pending_sep = false;
            }
            out.extend(ch.to_lowercase());
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Value coercion
// ---------------------------------------------------------------------------

/// Parse a currency amount.  In text, dots are thousands separators and a
/// comma is the decimal mark; symbols and spaces are ignored.  A lone dot
/// that is not followed by exactly three digits reads as a decimal point.
///
/// `"$12.345.678"` → `Some(12345678.0)`, `"1234.5"` → `Some(1234.5)`,
/// `"N/D"` → `None`.
pub fn parse_currency(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Float(v) if v.is_finite() => Some(*v),
        CellValue::Integer(i) => Some(*i as f64),
        CellValue::Text(s) => parse_currency_text(s),
        _ => None,
    }
}

fn parse_currency_text(s: &str) -> Option<f64> {
    let kept: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '-' | ',' | '.'))
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let number = if kept.contains(',') {
        kept.replace('.', "").replace(',', ".")
    } else if lone_decimal_point(&kept) {
        kept
    } else {
        kept.replace('.', "")
    };
    number.parse::<f64>().ok()
}

/// `1234.5` has a decimal point; `1.234` is a thousands group.
fn lone_decimal_point(s: &str) -> bool {
    let mut parts = s.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(fraction), None) => fraction.len() != 3,
        _ => false,
    }
}

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Parse a calendar date.  Slash and dash dates without a leading year are
/// read day-first; a trailing time part is ignored.  Numbers are taken as
/// spreadsheet serial days and rejected outside the range a workbook can hold.
pub fn parse_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(d) => Some(*d),
        CellValue::Float(v) => excel_serial_to_date(*v),
        CellValue::Integer(i) => excel_serial_to_date(*i as f64),
        CellValue::Text(s) => {
            let date_part = s.trim().split(['T', ' ']).next()?;
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        }
        CellValue::Null => None,
    }
}

/// Parse an award year; anything unreadable becomes 0.
pub fn parse_year(cell: &CellValue) -> i32 {
    match cell {
        CellValue::Integer(i) => i32::try_from(*i).unwrap_or(0),
        CellValue::Float(v) => float_year(*v),
        CellValue::Text(s) => {
            let s = s.trim();
            s.parse::<i32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(float_year))
                .unwrap_or(0)
        }
        CellValue::Date(_) | CellValue::Null => 0,
    }
}

fn float_year(v: f64) -> i32 {
    if v.is_finite() && v.abs() < i32::MAX as f64 {
        v.trunc() as i32
    } else {
        0
    }
}

fn parse_category(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Null => None,
        CellValue::Text(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Coerce one cell of a designated column.  Returns the new cell and whether
/// a non-empty input was lost in the process.
fn coerce(kind: ColumnKind, cell: &CellValue) -> (CellValue, bool) {
    let coerced = match kind {
        ColumnKind::Year => {
            let year = parse_year(cell);
            return (CellValue::Integer(year as i64), year == 0 && !cell.is_null());
        }
        ColumnKind::Category => parse_category(cell).map(CellValue::Text),
        ColumnKind::Currency => parse_currency(cell).map(CellValue::Float),
        ColumnKind::Date => parse_date(cell).map(CellValue::Date),
    };
    let failed = coerced.is_none() && !cell.is_null();
    (coerced.unwrap_or(CellValue::Null), failed)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Match canonical headers to designated columns.  Returns, per designated
/// column, the index of the header it was found at.
fn resolve_columns(canonical: &[String]) -> Vec<(Column, Option<usize>)> {
    Column::ALL
        .iter()
        .map(|&col| {
            let idx = col
                .aliases()
                .iter()
                .find_map(|alias| canonical.iter().position(|h| h == alias));
            (col, idx)
        })
        .collect()
}

/// Validate canonical headers against the designated columns.
pub fn check_schema(canonical: &[String]) -> SchemaReport {
    let resolved = resolve_columns(canonical);
    let missing = resolved
        .iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(col, _)| col.canonical().to_string())
        .collect();
    let extra = canonical
        .iter()
        .enumerate()
        .filter(|(i, _)| !resolved.iter().any(|(_, idx)| *idx == Some(*i)))
        .map(|(_, name)| name.clone())
        .collect();
    SchemaReport { missing, extra }
}

/// Make canonical names unique by suffixing repeats with `_2`, `_3`, …
fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let mut candidate = name.clone();
        let mut n = 2;
        while out.contains(&candidate) {
            candidate = format!("{name}_{n}");
            n += 1;
        }
        out.push(candidate);
    }
    out
}

/// Turn a raw table into a dataset: canonical headers, designated columns
/// renamed and coerced, one typed [`Record`] per row.
///
/// Missing designated columns are not an error: they are listed in the
/// schema report and the corresponding record fields stay empty.
pub fn normalize(raw: RawTable) -> Dataset {
    let mut columns = dedupe(raw.headers.iter().map(|h| canonical_name(h)).collect());
    let schema = check_schema(&columns);
    let resolved = resolve_columns(&columns);

    for (col, idx) in &resolved {
        if let Some(i) = idx {
            columns[*i] = col.canonical().to_string();
        }
    }

    if !schema.is_complete() {
        log::warn!(
            "Source is missing designated columns {:?}; they will be empty",
            schema.missing
        );
    }

    let mut failures = vec![0usize; Column::ALL.len()];
    let mut rows = raw.rows;
    for row in &mut rows {
        for (slot, (col, idx)) in resolved.iter().enumerate() {
            let Some(i) = idx else { continue };
            let (cell, failed) = coerce(col.kind(), &row[*i]);
            row[*i] = cell;
            if failed {
                failures[slot] += 1;
            }
        }
    }
    for ((col, _), n) in resolved.iter().zip(&failures) {
        if *n > 0 {
            log::debug!("{n} values in '{}' could not be parsed", col.canonical());
        }
    }

    let index_of = |target: Column| {
        resolved
            .iter()
            .find(|(col, _)| *col == target)
            .and_then(|(_, idx)| *idx)
    };
    let year = index_of(Column::AwardYear);
    let region = index_of(Column::Region);
    let sector = index_of(Column::Sector);
    let innovation_type = index_of(Column::InnovationType);
    let funding = index_of(Column::Funding);
    let private_contribution = index_of(Column::PrivateContribution);
    let certified = index_of(Column::CertifiedLawAmount);
    let activity_start = index_of(Column::ActivityStart);

    let cell = |row: &Vec<CellValue>, idx: Option<usize>| idx.map(|i| row[i].clone());

    let records = rows
        .iter()
        .map(|row| Record {
            award_year: cell(row, year).map(|c| parse_year(&c)).unwrap_or(0),
            region: cell(row, region).and_then(|c| parse_category(&c)),
            sector: cell(row, sector).and_then(|c| parse_category(&c)),
            innovation_type: cell(row, innovation_type).and_then(|c| parse_category(&c)),
            funding: cell(row, funding).and_then(|c| c.as_f64()),
            private_contribution: cell(row, private_contribution).and_then(|c| c.as_f64()),
            certified_law_amount: cell(row, certified).and_then(|c| c.as_f64()),
            activity_start: cell(row, activity_start).and_then(|c| parse_date(&c)),
        })
        .collect();

    Dataset {
        table: Table { columns, rows },
        records,
        schema,
        variant: raw.variant,
    }
}
