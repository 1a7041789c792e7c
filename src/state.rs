use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::color::ColorMap;
use crate::data::aggregate::{summarize, Summary};
use crate::data::export;
use crate::data::filter::{apply, FilterCriteria, FilterOptions, FilterOutcome, FilteredView};
use crate::data::loader::load_dataset;
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Session: one loaded dataset
// ---------------------------------------------------------------------------

/// Everything that belongs to one loaded file.  Replaced wholesale on every
/// load, never patched.
pub struct Session {
    pub source: PathBuf,
    pub dataset: Dataset,
    pub options: FilterOptions,
    pub criteria: FilterCriteria,
    pub region_colors: ColorMap,
    pub sector_colors: ColorMap,
    pub type_colors: ColorMap,
}

impl Session {
    pub fn new(source: PathBuf, dataset: Dataset) -> Self {
        let options = FilterOptions::from_dataset(&dataset);
        let criteria = FilterCriteria::select_all(&options);
        let types: std::collections::BTreeSet<String> = dataset
            .records
            .iter()
            .filter_map(|r| r.innovation_type.clone())
            .collect();
        Self {
            region_colors: ColorMap::new(&options.regions),
            sector_colors: ColorMap::new(&options.sectors),
            type_colors: ColorMap::new(&types),
            source,
            dataset,
            options,
            criteria,
        }
    }
}

// ---------------------------------------------------------------------------
// Report: result of the last filter pass
// ---------------------------------------------------------------------------

/// What the central panel shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// Nothing loaded.
    NoData,
    /// The filters match no rows.
    Empty,
    Ready {
        indices: Vec<usize>,
        summary: Summary,
    },
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded session (None until user loads a file).
    pub session: Option<Session>,

    /// Result of the last filter pass over the session.
    pub report: Report,

    /// File name suggested when exporting.
    pub export_name: String,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            session: None,
            report: Report::NoData,
            export_name: export::DEFAULT_EXPORT_NAME.to_string(),
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset with everything selected.
    pub fn set_dataset(&mut self, source: PathBuf, dataset: Dataset) {
        log::info!(
            "Loaded {} projects with columns {:?} from {}",
            dataset.len(),
            dataset.table.columns,
            source.display()
        );
        self.session = Some(Session::new(source, dataset));
        self.status_message = None;
        self.refilter();
    }

    /// Load a file, replacing the current session.  On failure the previous
    /// session is dropped so no stale data stays on screen.
    pub fn open_path(&mut self, path: &Path) {
        match load_dataset(path) {
            Ok(dataset) => self.set_dataset(path.to_path_buf(), dataset),
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.session = None;
                self.report = Report::NoData;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Recompute the report from the current criteria.
    pub fn refilter(&mut self) {
        self.report = match &self.session {
            None => Report::NoData,
            Some(session) => match apply(&session.dataset, &session.criteria) {
                FilterOutcome::Empty => Report::Empty,
                FilterOutcome::Rows(view) => Report::Ready {
                    summary: summarize(&view),
                    indices: view.indices,
                },
            },
        };
    }

    /// The current filtered view, if there is one.
    pub fn view(&self) -> Option<FilteredView<'_>> {
        match (&self.session, &self.report) {
            (Some(session), Report::Ready { indices, .. }) => Some(FilteredView {
                dataset: &session.dataset,
                indices: indices.clone(),
            }),
            _ => None,
        }
    }

    /// Replace the current selection and recompute.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        if let Some(session) = &mut self.session {
            session.criteria = criteria;
        }
        self.refilter();
    }

    /// Set the inclusive award-year range.
    pub fn set_years(&mut self, lo: i32, hi: i32) {
        if let Some(criteria) = self.criteria_clone() {
            self.set_criteria(FilterCriteria {
                years: (lo, hi),
                ..criteria
            });
        }
    }

    /// Toggle one region in the selection.
    pub fn toggle_region(&mut self, region: &str) {
        if let Some(mut criteria) = self.criteria_clone() {
            if !criteria.regions.remove(region) {
                criteria.regions.insert(region.to_string());
            }
            self.set_criteria(criteria);
        }
    }

    /// Toggle one sector in the selection.
    pub fn toggle_sector(&mut self, sector: &str) {
        if let Some(mut criteria) = self.criteria_clone() {
            if !criteria.sectors.remove(sector) {
                criteria.sectors.insert(sector.to_string());
            }
            self.set_criteria(criteria);
        }
    }

    /// Select every region (`true`) or none (`false`).
    pub fn select_all_regions(&mut self, all: bool) {
        if let Some(session) = &self.session {
            let regions = if all {
                session.options.regions.clone()
            } else {
                Default::default()
            };
            let criteria = FilterCriteria {
                regions,
                ..session.criteria.clone()
            };
            self.set_criteria(criteria);
        }
    }

    /// Select every sector (`true`) or none (`false`).
    pub fn select_all_sectors(&mut self, all: bool) {
        if let Some(session) = &self.session {
            let sectors = if all {
                session.options.sectors.clone()
            } else {
                Default::default()
            };
            let criteria = FilterCriteria {
                sectors,
                ..session.criteria.clone()
            };
            self.set_criteria(criteria);
        }
    }

    /// Write the current view to `path`.  Does nothing useful when the filters
    /// match no rows.
    pub fn export_to(&mut self, path: &Path) -> Result<()> {
        let view = self
            .view()
            .ok_or_else(|| anyhow::anyhow!("no rows to export"))?;
        export::export_to_path(&view, path)
    }

    fn criteria_clone(&self) -> Option<FilterCriteria> {
        self.session.as_ref().map(|s| s.criteria.clone())
    }
}
