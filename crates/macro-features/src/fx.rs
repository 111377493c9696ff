use crate::series::{align_to_target, dense_values, latest};
use chrono::NaiveDate;
use econ_models::OlsFrame;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FxFeatureName {
    LatestCarryRatio,
    LatestFxFlowZInput,
    LatestPositioningZInput,
    DomesticShortRate,
    ForeignRiskFreeRate,
    SurveyExpectedDepreciation,
}

/// Raw inputs the FX agent's loader assembles before feature computation.
/// One series per predictor/model input, as returned by the point-in-time
/// loader (dense `BTreeMap<NaiveDate, Option<f64>>` keyed by observation date).
#[derive(Debug, Clone, Default)]
pub struct FxBundle {
    pub log_usdbrl: BTreeMap<NaiveDate, Option<f64>>,
    pub beer_predictors: Vec<(String, BTreeMap<NaiveDate, Option<f64>>)>,
    pub carry_to_risk_ratio_history: BTreeMap<NaiveDate, Option<f64>>,
    pub fx_flow_history: BTreeMap<NaiveDate, Option<f64>>,
    pub positioning_history: BTreeMap<NaiveDate, Option<f64>>,
    pub domestic_short_rate: BTreeMap<NaiveDate, Option<f64>>,
    pub foreign_risk_free_rate: BTreeMap<NaiveDate, Option<f64>>,
    pub survey_expected_depreciation: BTreeMap<NaiveDate, Option<f64>>,
}

/// Typed feature payload for the FX agent: one field per model input plus
/// a scalar map of the named point-in-time values used in narratives and
/// journal metadata.
pub struct FxFeatureMap {
    pub scalars: HashMap<FxFeatureName, f64>,
    pub beer_ols_frame: Option<OlsFrame>,
    pub carry_ratio_history: Option<Vec<f64>>,
    pub fx_flow_history: Option<Vec<f64>>,
    pub positioning_history: Option<Vec<f64>>,
}

pub fn compute(bundle: &FxBundle, _as_of_date: NaiveDate) -> FxFeatureMap {
    let mut scalars = HashMap::new();

    let beer_ols_frame = if bundle.beer_predictors.is_empty() {
        None
    } else {
        let (target, predictors) = align_to_target(&bundle.log_usdbrl, &bundle.beer_predictors);
        Some(OlsFrame { target, predictors })
    };

    let carry_ratio_history = {
        let dense = dense_values(&bundle.carry_to_risk_ratio_history);
        if let Some(v) = dense.last() {
            scalars.insert(FxFeatureName::LatestCarryRatio, *v);
        }
        if dense.is_empty() { None } else { Some(dense) }
    };

    let fx_flow_history = {
        let dense = dense_values(&bundle.fx_flow_history);
        if let Some(v) = dense.last() {
            scalars.insert(FxFeatureName::LatestFxFlowZInput, *v);
        }
        if dense.is_empty() { None } else { Some(dense) }
    };

    let positioning_history = {
        let dense = dense_values(&bundle.positioning_history);
        if let Some(v) = dense.last() {
            scalars.insert(FxFeatureName::LatestPositioningZInput, *v);
        }
        if dense.is_empty() { None } else { Some(dense) }
    };

    if let Some(v) = latest(&bundle.domestic_short_rate) {
        scalars.insert(FxFeatureName::DomesticShortRate, v);
    }
    if let Some(v) = latest(&bundle.foreign_risk_free_rate) {
        scalars.insert(FxFeatureName::ForeignRiskFreeRate, v);
    }
    if let Some(v) = latest(&bundle.survey_expected_depreciation) {
        scalars.insert(FxFeatureName::SurveyExpectedDepreciation, v);
    }

    FxFeatureMap {
        scalars,
        beer_ols_frame,
        carry_ratio_history,
        fx_flow_history,
        positioning_history,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn missing_predictors_yields_no_ols_frame() {
        let bundle = FxBundle::default();
        let features = compute(&bundle, date(1));
        assert!(features.beer_ols_frame.is_none());
        assert!(features.scalars.is_empty());
    }

    #[test]
    fn carry_ratio_history_surfaces_latest_scalar() {
        let mut bundle = FxBundle::default();
        bundle.carry_to_risk_ratio_history.insert(date(1), Some(0.5));
        bundle.carry_to_risk_ratio_history.insert(date(2), Some(0.8));
        let features = compute(&bundle, date(2));
        assert_eq!(features.scalars.get(&FxFeatureName::LatestCarryRatio), Some(&0.8));
        assert_eq!(features.carry_ratio_history, Some(vec![0.5, 0.8]));
    }
}
