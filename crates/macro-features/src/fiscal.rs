use crate::series::{dense_values, latest};
use chrono::NaiveDate;
use econ_models::DominanceInputs;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FiscalFeatureName {
    CurrentDebtGdpPct,
    RealRatePct,
    GrowthRatePct,
    PrimaryBalanceGdpPct,
}

#[derive(Debug, Clone, Default)]
pub struct FiscalBundle {
    pub debt_gdp_pct: BTreeMap<NaiveDate, Option<f64>>,
    pub real_rate_pct: BTreeMap<NaiveDate, Option<f64>>,
    pub growth_rate_pct: BTreeMap<NaiveDate, Option<f64>>,
    pub monthly_primary_balance_gdp_pct: BTreeMap<NaiveDate, Option<f64>>,
    pub r_minus_g_pct: BTreeMap<NaiveDate, Option<f64>>,
    pub pb_trend_pct: BTreeMap<NaiveDate, Option<f64>>,
    pub cb_credibility_gap_pct: BTreeMap<NaiveDate, Option<f64>>,
}

pub struct FiscalFeatureMap {
    pub scalars: HashMap<FiscalFeatureName, f64>,
    pub monthly_primary_balance_gdp_pct: Option<Vec<f64>>,
    pub dominance_inputs: DominanceInputs,
}

pub fn compute(bundle: &FiscalBundle, _as_of_date: NaiveDate) -> FiscalFeatureMap {
    let mut scalars = HashMap::new();

    if let Some(v) = latest(&bundle.debt_gdp_pct) {
        scalars.insert(FiscalFeatureName::CurrentDebtGdpPct, v);
    }
    if let Some(v) = latest(&bundle.real_rate_pct) {
        scalars.insert(FiscalFeatureName::RealRatePct, v);
    }
    if let Some(v) = latest(&bundle.growth_rate_pct) {
        scalars.insert(FiscalFeatureName::GrowthRatePct, v);
    }
    if let Some(v) = latest(&bundle.monthly_primary_balance_gdp_pct) {
        scalars.insert(FiscalFeatureName::PrimaryBalanceGdpPct, v);
    }

    let dense_pb = dense_values(&bundle.monthly_primary_balance_gdp_pct);
    let monthly_primary_balance_gdp_pct = if dense_pb.is_empty() { None } else { Some(dense_pb) };

    let dominance_inputs = DominanceInputs {
        debt_gdp_pct: latest(&bundle.debt_gdp_pct),
        r_minus_g_pct: latest(&bundle.r_minus_g_pct),
        pb_trend_pct: latest(&bundle.pb_trend_pct),
        cb_credibility_gap_pct: latest(&bundle.cb_credibility_gap_pct),
    };

    FiscalFeatureMap { scalars, monthly_primary_balance_gdp_pct, dominance_inputs }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn missing_series_yields_default_dominance_inputs() {
        let bundle = FiscalBundle::default();
        let features = compute(&bundle, date(1));
        assert!(features.dominance_inputs.debt_gdp_pct.is_none());
        assert!(features.monthly_primary_balance_gdp_pct.is_none());
    }

    #[test]
    fn latest_debt_gdp_surfaces_as_scalar_and_dominance_input() {
        let mut bundle = FiscalBundle::default();
        bundle.debt_gdp_pct.insert(date(1), Some(80.0));
        bundle.debt_gdp_pct.insert(date(2), Some(85.0));
        let features = compute(&bundle, date(2));
        assert_eq!(features.scalars.get(&FiscalFeatureName::CurrentDebtGdpPct), Some(&85.0));
        assert_eq!(features.dominance_inputs.debt_gdp_pct, Some(85.0));
    }
}
