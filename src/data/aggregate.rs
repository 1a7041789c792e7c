use std::collections::BTreeMap;

use serde::Serialize;

use super::filter::FilteredView;
use super::model::Record;

// ---------------------------------------------------------------------------
// Category counts
// ---------------------------------------------------------------------------

/// Number of projects per category value.  Null categories are not counted.
///
/// Stored label-ascending; callers pick the order they render in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryCounts(BTreeMap<String, usize>);

impl CategoryCounts {
    pub fn from_values<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        let mut counts = BTreeMap::new();
        for value in values.into_iter().flatten() {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }
        CategoryCounts(counts)
    }

    pub fn get(&self, label: &str) -> usize {
        self.0.get(label).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(label, count)` pairs, largest count first; ties by label.
    pub fn descending(&self) -> Vec<(String, usize)> {
        let mut pairs: Vec<(String, usize)> =
            self.0.iter().map(|(k, v)| (k.clone(), *v)).collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pairs
    }

    /// `(label, count)` pairs, smallest count first; ties by label.
    pub fn ascending(&self) -> Vec<(String, usize)> {
        let mut pairs: Vec<(String, usize)> =
            self.0.iter().map(|(k, v)| (k.clone(), *v)).collect();
        pairs.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        pairs
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Headline metrics and breakdowns of a filtered view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_projects: usize,
    /// Sum of agency funding; missing amounts count as 0.
    pub funding_total: f64,
    /// Sum of approved private cash contributions; missing amounts count as 0.
    pub private_total: f64,
    pub certified_total: f64,
    pub by_innovation_type: CategoryCounts,
    pub by_region: CategoryCounts,
    pub by_sector: CategoryCounts,
}

fn sum_of(records: &[&Record], amount: impl Fn(&Record) -> Option<f64>) -> f64 {
    records.iter().map(|r| amount(*r).unwrap_or(0.0)).sum()
}

/// Compute the summary of a view.  Recomputed from scratch on every call.
pub fn summarize(view: &FilteredView<'_>) -> Summary {
    let records: Vec<&Record> = view.records().collect();
    Summary {
        total_projects: records.len(),
        funding_total: sum_of(&records, |r| r.funding),
        private_total: sum_of(&records, |r| r.private_contribution),
        certified_total: sum_of(&records, |r| r.certified_law_amount),
        by_innovation_type: CategoryCounts::from_values(
            records.iter().map(|r| r.innovation_type.as_deref()),
        ),
        by_region: CategoryCounts::from_values(records.iter().map(|r| r.region.as_deref())),
        by_sector: CategoryCounts::from_values(records.iter().map(|r| r.sector.as_deref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::tests::{dataset, record};
    use crate::data::filter::{apply, FilterCriteria, FilterOptions};

    #[test]
    fn test_summary_totals() {
        let mut with_private = record(2019, "Maule", "TIC", Some(100.0));
        with_private.private_contribution = Some(40.0);
        let ds = dataset(vec![
            with_private,
            record(2019, "Maule", "Salud", None),
            record(2020, "Ñuble", "TIC", Some(2.5)),
        ]);
        let summary = summarize(&FilteredView::all(&ds));

        assert_eq!(summary.total_projects, 3);
        assert!((summary.funding_total - 102.5).abs() < 1e-9);
        assert!((summary.private_total - 40.0).abs() < 1e-9);
        assert_eq!(summary.certified_total, 0.0);
    }

    #[test]
    fn test_funding_sum_matches_per_row_sum() {
        let ds = dataset(vec![
            record(2018, "Maule", "TIC", Some(1_000_000.0)),
            record(2019, "Maule", "TIC", None),
            record(2020, "Biobío", "TIC", Some(350_000.0)),
            record(2021, "Biobío", "Salud", Some(12.0)),
        ]);
        let mut criteria = FilterCriteria::select_all(&FilterOptions::from_dataset(&ds));
        criteria.sectors.remove("Salud");
        let view = apply(&ds, &criteria).into_view().unwrap();

        let per_row: f64 = view
            .indices
            .iter()
            .map(|&i| ds.records[i].funding.unwrap_or(0.0))
            .sum();
        let summary = summarize(&view);
        assert_eq!(summary.funding_total, per_row);
        assert_eq!(summary.funding_total, 1_350_000.0);
    }

    #[test]
    fn test_category_counts_by_column() {
        let mut proceso = record(2019, "Metropolitana", "TIC", None);
        proceso.innovation_type = Some("Proceso".to_string());
        let mut sin_tipo = record(2019, "Maule", "TIC", None);
        sin_tipo.innovation_type = None;
        let ds = dataset(vec![
            record(2019, "Metropolitana", "TIC", None),
            record(2019, "Metropolitana", "Salud", None),
            proceso,
            sin_tipo,
        ]);
        let summary = summarize(&FilteredView::all(&ds));

        assert_eq!(summary.by_region.get("Metropolitana"), 3);
        assert_eq!(summary.by_region.get("Maule"), 1);
        assert_eq!(summary.by_sector.get("TIC"), 3);
        assert_eq!(summary.by_innovation_type.get("Producto"), 2);
        assert_eq!(summary.by_innovation_type.get("Proceso"), 1);
        assert_eq!(summary.by_innovation_type.descending().len(), 2);
    }

    #[test]
    fn test_counts_orderings() {
        let counts = CategoryCounts::from_values(vec![
            Some("TIC"),
            Some("Salud"),
            Some("TIC"),
            Some("Agrícola"),
            None,
            Some("TIC"),
            Some("Salud"),
        ]);
        assert_eq!(
            counts.descending(),
            vec![
                ("TIC".to_string(), 3),
                ("Salud".to_string(), 2),
                ("Agrícola".to_string(), 1),
            ]
        );
        let ascending = counts.ascending();
        assert_eq!(ascending.len(), 3);
        assert_eq!(ascending[0], ("Agrícola".to_string(), 1));
        assert_eq!(ascending[2], ("TIC".to_string(), 3));
    }

    #[test]
    fn test_descending_ties_by_label() {
        let counts = CategoryCounts::from_values(vec![Some("b"), Some("a")]);
        assert_eq!(
            counts.descending(),
            vec![("a".to_string(), 1), ("b".to_string(), 1)]
        );
    }

    #[test]
    fn test_summary_serializes() {
        let ds = dataset(vec![record(2019, "Maule", "TIC", Some(1.0))]);
        let json = serde_json::to_value(summarize(&FilteredView::all(&ds))).unwrap();
        assert_eq!(json["total_projects"], 1);
        assert_eq!(json["by_region"]["Maule"], 1);
    }
}
