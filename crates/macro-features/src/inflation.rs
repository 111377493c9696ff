use crate::series::{dense_values, latest};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InflationFeatureName {
    ActualPrint,
    ConsensusPrint,
}

#[derive(Debug, Clone, Default)]
pub struct InflationBundle {
    pub actual_print_pct: BTreeMap<NaiveDate, Option<f64>>,
    pub consensus_print_pct: BTreeMap<NaiveDate, Option<f64>>,
    pub surprise_history: BTreeMap<NaiveDate, Option<f64>>,
    pub monthly_yoy_inflation_pct: BTreeMap<NaiveDate, Option<f64>>,
}

pub struct InflationFeatureMap {
    pub scalars: HashMap<InflationFeatureName, f64>,
    pub surprise_history: Option<Vec<f64>>,
    pub monthly_yoy_inflation_pct: Option<Vec<f64>>,
}

pub fn compute(bundle: &InflationBundle, _as_of_date: NaiveDate) -> InflationFeatureMap {
    let mut scalars = HashMap::new();

    if let Some(v) = latest(&bundle.actual_print_pct) {
        scalars.insert(InflationFeatureName::ActualPrint, v);
    }
    if let Some(v) = latest(&bundle.consensus_print_pct) {
        scalars.insert(InflationFeatureName::ConsensusPrint, v);
    }

    let surprise_dense = dense_values(&bundle.surprise_history);
    let surprise_history = if surprise_dense.is_empty() { None } else { Some(surprise_dense) };

    let yoy_dense = dense_values(&bundle.monthly_yoy_inflation_pct);
    let monthly_yoy_inflation_pct = if yoy_dense.is_empty() { None } else { Some(yoy_dense) };

    InflationFeatureMap { scalars, surprise_history, monthly_yoy_inflation_pct }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn latest_prints_surface_as_scalars() {
        let mut bundle = InflationBundle::default();
        bundle.actual_print_pct.insert(date(1), Some(6.0));
        bundle.consensus_print_pct.insert(date(1), Some(5.0));
        let features = compute(&bundle, date(1));
        assert_eq!(features.scalars.get(&InflationFeatureName::ActualPrint), Some(&6.0));
        assert_eq!(features.scalars.get(&InflationFeatureName::ConsensusPrint), Some(&5.0));
    }
}
