use std::fmt;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the project table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell. Loaders produce `Text`/`Integer`/`Float`/`Date`
/// depending on what the source format carries; the normalizer then coerces
/// the designated columns to their final type.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Null,
}

// -- Manual Eq/Ord so cells can be sorted and deduplicated --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Integer(_) => 1,
                Float(_) => 2,
                Date(_) => 3,
                Text(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Build a text cell, mapping blank strings to `Null`.
    pub fn text(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            CellValue::Null
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Source variant
// ---------------------------------------------------------------------------

/// Which flavour of input a table came from. Only used for reporting; both
/// variants map onto the same canonical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceVariant {
    /// Semicolon-delimited export (version 1).
    DelimitedText,
    /// Uploaded workbook (version 2).
    Spreadsheet,
    Parquet,
    Json,
}

impl fmt::Display for SourceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceVariant::DelimitedText => "texto delimitado",
            SourceVariant::Spreadsheet => "planilla",
            SourceVariant::Parquet => "parquet",
            SourceVariant::Json => "json",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// RawTable – loader output, headers untouched
// ---------------------------------------------------------------------------

/// A table exactly as read from disk: original headers, every row padded or
/// truncated to the header width.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    pub variant: SourceVariant,
}

impl RawTable {
    pub fn new(headers: Vec<String>, variant: SourceVariant) -> Self {
        Self {
            headers,
            rows: Vec::new(),
            variant,
        }
    }

    /// Append a row, fitting it to the header width.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.headers.len(), CellValue::Null);
        self.rows.push(row);
    }
}

// ---------------------------------------------------------------------------
// Table – canonical columns, coerced cells
// ---------------------------------------------------------------------------

/// The normalized table: canonical column names and coerced cells. Every
/// source column is kept so the export reproduces the full filtered table.
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

// ---------------------------------------------------------------------------
// Record – typed view of one project
// ---------------------------------------------------------------------------

/// One innovation-grant project with the designated columns typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Award year; 0 when missing or unparsable.
    pub award_year: i32,
    pub region: Option<String>,
    pub sector: Option<String>,
    pub innovation_type: Option<String>,
    /// Funding granted by the agency.
    pub funding: Option<f64>,
    /// Approved private cash contribution.
    pub private_contribution: Option<f64>,
    pub certified_law_amount: Option<f64>,
    pub activity_start: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Schema report
// ---------------------------------------------------------------------------

/// Result of matching canonical headers against the designated columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    /// Designated columns (canonical names) not found in the source.
    pub missing: Vec<String>,
    /// Source columns that are not designated; kept as text.
    pub extra: Vec<String>,
}

impl SchemaReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// A normalized dataset: the table, one typed record per row, and the schema
/// report. Created once per load and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub table: Table,
    /// Parallel to `table.rows`.
    pub records: Vec<Record>,
    pub schema: SchemaReport,
    pub variant: SourceVariant,
}

impl Dataset {
    /// Number of projects.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
