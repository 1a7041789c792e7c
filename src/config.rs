use std::path::PathBuf;

use clap::Parser;

use crate::data::export::DEFAULT_EXPORT_NAME;
use crate::data::filter::{FilterCriteria, FilterOptions};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Dashboard of InnovaChile Corfo innovation projects.
///
/// Without `--export` or `--summary` a window is opened; with either of them
/// the file is processed headless and the program exits.
#[derive(Debug, Clone, Parser)]
#[command(name = "innova-dashboard", version, about)]
pub struct Cli {
    /// Dataset to open (.csv, .xlsx, .xls, .ods, .parquet, .json)
    pub file: Option<PathBuf>,

    /// Write the filtered rows to this CSV file and exit
    #[arg(long, value_name = "PATH", requires = "file")]
    pub export: Option<PathBuf>,

    /// Print the summary of the filtered rows as JSON and exit
    #[arg(long, requires = "file")]
    pub summary: bool,

    /// First award year to include (defaults to the earliest in the data)
    #[arg(long, value_name = "YEAR")]
    pub from_year: Option<i32>,

    /// Last award year to include (defaults to the latest in the data)
    #[arg(long, value_name = "YEAR")]
    pub to_year: Option<i32>,

    /// Region to include; repeat for several (defaults to all)
    #[arg(long = "region", value_name = "REGION")]
    pub regions: Vec<String>,

    /// Economic sector to include; repeat for several (defaults to all)
    #[arg(long = "sector", value_name = "SECTOR")]
    pub sectors: Vec<String>,

    /// File name suggested by the export dialog
    #[arg(long, value_name = "NAME", default_value = DEFAULT_EXPORT_NAME)]
    pub export_name: String,

    /// Log filter, e.g. `debug` or `innova_dashboard=trace` (overrides RUST_LOG)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Whether the run should skip the window.
    pub fn is_headless(&self) -> bool {
        self.export.is_some() || self.summary
    }

    /// The filter selection requested on the command line, defaulting to
    /// everything in `options`.
    pub fn criteria(&self, options: &FilterOptions) -> FilterCriteria {
        let mut criteria = FilterCriteria::select_all(options);
        if let Some(lo) = self.from_year {
            criteria.years.0 = lo;
        }
        if let Some(hi) = self.to_year {
            criteria.years.1 = hi;
        }
        if !self.regions.is_empty() {
            criteria.regions = self.regions.iter().cloned().collect();
        }
        if !self.sectors.is_empty() {
            criteria.sectors = self.sectors.iter().cloned().collect();
        }
        criteria
    }
}

// ---------------------------------------------------------------------------
// Logging bootstrap
// ---------------------------------------------------------------------------

/// Initialise `env_logger`.  `--log-level` wins over `RUST_LOG`; with neither
/// set, `info` is used.
pub fn init_logging(log_level: Option<&str>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = log_level {
        builder.parse_filters(level);
    }
    builder.init();
}
