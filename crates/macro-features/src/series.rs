use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Drops dates with a missing value and returns the dense value sequence,
/// oldest first. Models consume dense `&[f64]` windows; gaps are a loader
/// concern (vintage selection), not a feature-engine one.
pub fn dense_values(series: &BTreeMap<NaiveDate, Option<f64>>) -> Vec<f64> {
    series.values().filter_map(|v| *v).collect()
}

pub fn latest(series: &BTreeMap<NaiveDate, Option<f64>>) -> Option<f64> {
    series.values().rev().find_map(|v| *v)
}

pub fn latest_from_dense(series: &BTreeMap<NaiveDate, f64>) -> Option<f64> {
    series.values().next_back().copied()
}

/// Aligns a set of predictor series onto `target`'s date index, oldest
/// first. A predictor missing a value on a date the target has is `None`
/// for that row, not a dropped row — `OlsFrame::fit` handles per-column
/// coverage.
pub fn align_to_target(
    target: &BTreeMap<NaiveDate, Option<f64>>,
    predictors: &[(String, BTreeMap<NaiveDate, Option<f64>>)],
) -> (Vec<Option<f64>>, Vec<(String, Vec<Option<f64>>)>) {
    let target_rows: Vec<Option<f64>> = target.values().copied().collect();
    let aligned_predictors: Vec<(String, Vec<Option<f64>>)> = predictors
        .iter()
        .map(|(name, series)| {
            let values: Vec<Option<f64>> = target.keys().map(|date| series.get(date).copied().flatten()).collect();
            (name.clone(), values)
        })
        .collect();
    (target_rows, aligned_predictors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_values_drops_none() {
        let mut m = BTreeMap::new();
        m.insert(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), Some(1.0));
        m.insert(NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(), None);
        m.insert(NaiveDate::from_ymd_opt(2026, 1, 3).unwrap(), Some(3.0));
        assert_eq!(dense_values(&m), vec![1.0, 3.0]);
    }
}
