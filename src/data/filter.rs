use std::collections::BTreeSet;

use super::model::{Dataset, Record};

// ---------------------------------------------------------------------------
// Filter options: what the user can pick from
// ---------------------------------------------------------------------------

/// Choices offered by the filter widgets, taken from the unfiltered dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    /// Smallest and largest observed award year (unparsable years count as 0).
    pub year_bounds: (i32, i32),
    /// Distinct non-null regions, sorted ascending.
    pub regions: BTreeSet<String>,
    /// Distinct non-null sectors, sorted ascending.
    pub sectors: BTreeSet<String>,
}

impl FilterOptions {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let years = dataset.records.iter().map(|r| r.award_year);
        let year_bounds = match (years.clone().min(), years.max()) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => (0, 0),
        };
        let regions = dataset
            .records
            .iter()
            .filter_map(|r| r.region.clone())
            .collect();
        let sectors = dataset
            .records
            .iter()
            .filter_map(|r| r.sector.clone())
            .collect();
        Self {
            year_bounds,
            regions,
            sectors,
        }
    }
}

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// The user's current selection.  Bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub years: (i32, i32),
    pub regions: BTreeSet<String>,
    pub sectors: BTreeSet<String>,
}

impl FilterCriteria {
    /// Everything selected: the full year range and every region and sector.
    pub fn select_all(options: &FilterOptions) -> Self {
        Self {
            years: options.year_bounds,
            regions: options.regions.clone(),
            sectors: options.sectors.clone(),
        }
    }

    /// Whether a record passes every predicate.  A record without a region or
    /// sector never matches.
    pub fn matches(&self, record: &Record) -> bool {
        let (lo, hi) = self.years;
        if record.award_year < lo || record.award_year > hi {
            return false;
        }
        let in_set = |value: &Option<String>, set: &BTreeSet<String>| {
            value.as_ref().is_some_and(|v| set.contains(v))
        };
        in_set(&record.region, &self.regions) && in_set(&record.sector, &self.sectors)
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Rows of a dataset matching some criteria.  Borrows the dataset; the
/// dataset itself is never touched.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    pub dataset: &'a Dataset,
    /// Indices into `dataset.records` / `dataset.table.rows`, ascending.
    pub indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// A view over every row.
    pub fn all(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |&i| &dataset.records[i])
    }
}

/// Outcome of applying criteria.  `Empty` tells the presenter to stop the
/// pass: no metrics, charts, table or export.
#[derive(Debug, Clone)]
pub enum FilterOutcome<'a> {
    Rows(FilteredView<'a>),
    Empty,
}

impl<'a> FilterOutcome<'a> {
    pub fn into_view(self) -> Option<FilteredView<'a>> {
        match self {
            FilterOutcome::Rows(view) => Some(view),
            FilterOutcome::Empty => None,
        }
    }
}

/// Return the rows of `dataset` that pass `criteria`.
pub fn apply<'a>(dataset: &'a Dataset, criteria: &FilterCriteria) -> FilterOutcome<'a> {
    let indices: Vec<usize> = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| criteria.matches(rec))
        .map(|(i, _)| i)
        .collect();

    if indices.is_empty() {
        FilterOutcome::Empty
    } else {
        FilterOutcome::Rows(FilteredView { dataset, indices })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::model::{CellValue, SchemaReport, SourceVariant, Table};

    pub(crate) fn record(year: i32, region: &str, sector: &str, funding: Option<f64>) -> Record {
        Record {
            award_year: year,
            region: Some(region.to_string()),
            sector: Some(sector.to_string()),
            innovation_type: Some("Producto".to_string()),
            funding,
            ..Record::default()
        }
    }

    pub(crate) fn dataset(records: Vec<Record>) -> Dataset {
        let rows = records
            .iter()
            .map(|r| vec![CellValue::Integer(r.award_year as i64)])
            .collect();
        Dataset {
            table: Table {
                columns: vec!["ano_adjudicacion".to_string()],
                rows,
            },
            records,
            schema: SchemaReport::default(),
            variant: SourceVariant::DelimitedText,
        }
    }

    fn sample() -> Dataset {
        dataset(vec![
            record(2017, "Maule", "Agrícola", Some(10.0)),
            record(2019, "Metropolitana", "TIC", Some(1_000_000.0)),
            record(2020, "Biobío", "TIC", None),
            record(2021, "Metropolitana", "Salud", Some(5.0)),
        ])
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_options_from_dataset() {
        let ds = sample();
        let options = FilterOptions::from_dataset(&ds);
        assert_eq!(options.year_bounds, (2017, 2021));
        let regions: Vec<&str> = options.regions.iter().map(|s| s.as_str()).collect();
        assert_eq!(regions, vec!["Biobío", "Maule", "Metropolitana"]);
        let sectors: Vec<&str> = options.sectors.iter().map(|s| s.as_str()).collect();
        assert_eq!(sectors, vec!["Agrícola", "Salud", "TIC"]);
    }

    #[test]
    fn test_options_skip_null_categories() {
        let mut rec = record(2018, "Maule", "TIC", None);
        rec.region = None;
        let ds = dataset(vec![rec]);
        let options = FilterOptions::from_dataset(&ds);
        assert!(options.regions.is_empty());
        assert_eq!(options.sectors, set(&["TIC"]));
    }

    #[test]
    fn test_options_empty_dataset() {
        let options = FilterOptions::from_dataset(&dataset(Vec::new()));
        assert_eq!(options.year_bounds, (0, 0));
    }

    #[test]
    fn test_select_all_keeps_every_row() {
        let ds = sample();
        let criteria = FilterCriteria::select_all(&FilterOptions::from_dataset(&ds));
        let view = apply(&ds, &criteria).into_view().unwrap();
        assert_eq!(view.len(), ds.len());
        assert_eq!(view.indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_year_range_outside_observed_is_empty() {
        let ds = sample();
        let mut criteria = FilterCriteria::select_all(&FilterOptions::from_dataset(&ds));
        criteria.years = (2030, 2035);
        assert!(apply(&ds, &criteria).into_view().is_none());
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let ds = sample();
        let mut criteria = FilterCriteria::select_all(&FilterOptions::from_dataset(&ds));
        criteria.years = (2021, 2017);
        assert!(apply(&ds, &criteria).into_view().is_none());
    }

    #[test]
    fn test_single_row_included() {
        let ds = dataset(vec![record(2019, "Metropolitana", "TIC", Some(1_000_000.0))]);
        let criteria = FilterCriteria {
            years: (2018, 2020),
            regions: set(&["Metropolitana"]),
            sectors: set(&["TIC"]),
        };
        let view = apply(&ds, &criteria).into_view().unwrap();
        assert_eq!(view.len(), 1);
        let funding: f64 = view.records().filter_map(|r| r.funding).sum();
        assert_eq!(funding, 1_000_000.0);
    }

    #[test]
    fn test_single_row_excluded_by_year() {
        let ds = dataset(vec![record(2019, "Metropolitana", "TIC", Some(1_000_000.0))]);
        let criteria = FilterCriteria {
            years: (2020, 2022),
            regions: set(&["Metropolitana"]),
            sectors: set(&["TIC"]),
        };
        assert!(apply(&ds, &criteria).into_view().is_none());
    }

    #[test]
    fn test_region_and_sector_membership() {
        let ds = sample();
        let mut criteria = FilterCriteria::select_all(&FilterOptions::from_dataset(&ds));
        criteria.regions = set(&["Metropolitana"]);
        criteria.sectors = set(&["TIC", "Salud"]);
        let view = apply(&ds, &criteria).into_view().unwrap();
        assert_eq!(view.indices, vec![1, 3]);

        criteria.sectors.clear();
        assert!(apply(&ds, &criteria).into_view().is_none());
    }

    #[test]
    fn test_filter_does_not_touch_dataset() {
        let ds = sample();
        let before = ds.records.clone();
        let criteria = FilterCriteria {
            years: (2019, 2019),
            regions: set(&["Metropolitana"]),
            sectors: set(&["TIC"]),
        };
        let _ = apply(&ds, &criteria);
        assert_eq!(ds.records, before);
        assert_eq!(ds.len(), 4);
    }
}
