use crate::series::{dense_values, latest};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonetaryFeatureName {
    PolicyRatePct,
    HeadlineInflationPct,
    OutputGapPct,
}

/// Target inflation midpoint used as the Taylor rule anchor. Not a data
/// series: the regime's published target, reviewed far less often than
/// the loader's lookback window.
pub const INFLATION_TARGET_PCT: f64 = 3.0;

#[derive(Debug, Clone, Default)]
pub struct MonetaryBundle {
    pub policy_rate_pct: BTreeMap<NaiveDate, Option<f64>>,
    pub headline_inflation_pct: BTreeMap<NaiveDate, Option<f64>>,
    pub output_gap_pct: BTreeMap<NaiveDate, Option<f64>>,
    pub monthly_real_rate_pct: BTreeMap<NaiveDate, Option<f64>>,
}

pub struct MonetaryFeatureMap {
    pub scalars: HashMap<MonetaryFeatureName, f64>,
    pub monthly_real_rate_pct: Option<Vec<f64>>,
}

pub fn compute(bundle: &MonetaryBundle, _as_of_date: NaiveDate) -> MonetaryFeatureMap {
    let mut scalars = HashMap::new();

    if let Some(v) = latest(&bundle.policy_rate_pct) {
        scalars.insert(MonetaryFeatureName::PolicyRatePct, v);
    }
    if let Some(v) = latest(&bundle.headline_inflation_pct) {
        scalars.insert(MonetaryFeatureName::HeadlineInflationPct, v);
    }
    if let Some(v) = latest(&bundle.output_gap_pct) {
        scalars.insert(MonetaryFeatureName::OutputGapPct, v);
    }

    let dense_real_rate = dense_values(&bundle.monthly_real_rate_pct);
    let monthly_real_rate_pct = if dense_real_rate.is_empty() { None } else { Some(dense_real_rate) };

    MonetaryFeatureMap { scalars, monthly_real_rate_pct }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn empty_bundle_has_no_scalars() {
        let bundle = MonetaryBundle::default();
        let features = compute(&bundle, date(1));
        assert!(features.scalars.is_empty());
        assert!(features.monthly_real_rate_pct.is_none());
    }
}
