use crate::series::dense_values;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Goldilocks,
    Reflation,
    Stagflation,
    Deflation,
    Unknown,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Goldilocks => "goldilocks",
            Regime::Reflation => "reflation",
            Regime::Stagflation => "stagflation",
            Regime::Deflation => "deflation",
            Regime::Unknown => "unknown",
        }
    }
}

/// Raw return series for the cross-asset regime classifier: a risk-asset
/// proxy (growth) and a commodity-index proxy (inflation pressure).
#[derive(Debug, Clone, Default)]
pub struct CrossAssetBundle {
    pub risk_asset_returns: BTreeMap<NaiveDate, Option<f64>>,
    pub commodity_index_returns: BTreeMap<NaiveDate, Option<f64>>,
}

pub struct CrossAssetFeatureMap {
    pub growth_momentum: Option<f64>,
    pub inflation_pressure_momentum: Option<f64>,
    pub regime: Regime,
}

const RECENT_WINDOW: usize = 10;
const MIN_OBS: usize = 20;

/// Recent-10 mean minus full-period mean, the same recent-vs-full
/// comparison used for volatility-regime detection elsewhere, applied to
/// the level of returns rather than their dispersion.
fn momentum(returns: &[f64]) -> Option<f64> {
    if returns.len() < MIN_OBS {
        return None;
    }
    let full_mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let recent = &returns[returns.len() - RECENT_WINDOW..];
    let recent_mean = recent.iter().sum::<f64>() / recent.len() as f64;
    Some(recent_mean - full_mean)
}

fn classify(growth_momentum: f64, inflation_momentum: f64) -> Regime {
    match (growth_momentum >= 0.0, inflation_momentum >= 0.0) {
        (true, false) => Regime::Goldilocks,
        (true, true) => Regime::Reflation,
        (false, true) => Regime::Stagflation,
        (false, false) => Regime::Deflation,
    }
}

pub fn compute(bundle: &CrossAssetBundle, _as_of_date: NaiveDate) -> CrossAssetFeatureMap {
    let growth_momentum = momentum(&dense_values(&bundle.risk_asset_returns));
    let inflation_pressure_momentum = momentum(&dense_values(&bundle.commodity_index_returns));

    let regime = match (growth_momentum, inflation_pressure_momentum) {
        (Some(g), Some(i)) => classify(g, i),
        _ => Regime::Unknown,
    };

    CrossAssetFeatureMap { growth_momentum, inflation_pressure_momentum, regime }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Duration::days(d as i64)
    }

    #[test]
    fn insufficient_history_is_unknown_regime() {
        let bundle = CrossAssetBundle::default();
        let features = compute(&bundle, date(0));
        assert_eq!(features.regime, Regime::Unknown);
    }

    #[test]
    fn rising_growth_falling_inflation_is_goldilocks() {
        let mut bundle = CrossAssetBundle::default();
        for i in 0..30u32 {
            let growth = if i >= 20 { 0.02 } else { 0.0 };
            let inflation = if i >= 20 { -0.02 } else { 0.0 };
            bundle.risk_asset_returns.insert(date(i), Some(growth));
            bundle.commodity_index_returns.insert(date(i), Some(inflation));
        }
        let features = compute(&bundle, date(29));
        assert_eq!(features.regime, Regime::Goldilocks);
    }
}
