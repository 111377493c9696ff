use chrono::NaiveDate;
use macro_core::{AgentSignal, SignalDirection};
use serde_json::json;
use std::collections::BTreeMap;

/// Four sub-scores normalized to [0, 100] by linear interpolation between
/// locked anchor points, combined with locked `DOMINANCE_WEIGHTS`. Missing
/// sub-scores substitute the neutral midpoint (50).
pub struct DominanceRiskModel;

#[derive(Debug, Clone, Copy, Default)]
pub struct DominanceInputs {
    pub debt_gdp_pct: Option<f64>,
    pub r_minus_g_pct: Option<f64>,
    pub pb_trend_pct: Option<f64>,
    pub cb_credibility_gap_pct: Option<f64>,
}

const WEIGHT_DEBT_LEVEL: f64 = 0.35;
const WEIGHT_R_G_SPREAD: f64 = 0.30;
const WEIGHT_PB_TREND: f64 = 0.20;
const WEIGHT_CB_CREDIBILITY: f64 = 0.15;

/// Piecewise-linear interpolation over `(value, score)` anchors, clamped
/// beyond the first/last anchor.
fn interp_anchors(value: f64, anchors: &[(f64, f64)]) -> f64 {
    if value <= anchors[0].0 {
        return anchors[0].1;
    }
    if value >= anchors[anchors.len() - 1].0 {
        return anchors[anchors.len() - 1].1;
    }
    for pair in anchors.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if value >= x0 && value <= x1 {
            let t = (value - x0) / (x1 - x0);
            return y0 + t * (y1 - y0);
        }
    }
    50.0
}

impl DominanceRiskModel {
    pub const SIGNAL_ID: &'static str = "FISCAL_BR_DOMINANCE";
    pub const MIN_OBS: usize = 1;
    const HORIZON_DAYS: u32 = 180;

    pub fn run(inputs: DominanceInputs, as_of_date: NaiveDate) -> AgentSignal {
        let debt_level = inputs
            .debt_gdp_pct
            .map(|v| interp_anchors(v, &[(30.0, 0.0), (60.0, 50.0), (90.0, 100.0)]))
            .unwrap_or(50.0);
        let r_g_spread = inputs
            .r_minus_g_pct
            .map(|v| interp_anchors(v, &[(-2.0, 0.0), (0.0, 50.0), (4.0, 100.0)]))
            .unwrap_or(50.0);
        let pb_trend = inputs
            .pb_trend_pct
            .map(|v| interp_anchors(v, &[(-3.0, 100.0), (0.0, 50.0), (3.0, 0.0)]))
            .unwrap_or(50.0);
        let cb_credibility = inputs
            .cb_credibility_gap_pct
            .map(|v| interp_anchors(v, &[(0.0, 0.0), (3.0, 50.0), (6.0, 100.0)]))
            .unwrap_or(50.0);

        let score = debt_level * WEIGHT_DEBT_LEVEL
            + r_g_spread * WEIGHT_R_G_SPREAD
            + pb_trend * WEIGHT_PB_TREND
            + cb_credibility * WEIGHT_CB_CREDIBILITY;

        let mut metadata = BTreeMap::new();
        metadata.insert("score".to_string(), json!(score));
        metadata.insert("debt_level_subscore".to_string(), json!(debt_level));
        metadata.insert("r_g_spread_subscore".to_string(), json!(r_g_spread));
        metadata.insert("pb_trend_subscore".to_string(), json!(pb_trend));
        metadata.insert("cb_credibility_subscore".to_string(), json!(cb_credibility));

        if score < 33.0 {
            let confidence = ((33.0 - score) / 33.0).clamp(0.0, 1.0);
            AgentSignal::directional(Self::SIGNAL_ID, "fiscal_agent", as_of_date, SignalDirection::Short, confidence, score, Self::HORIZON_DAYS, metadata)
        } else if score > 66.0 {
            let confidence = ((score - 66.0) / 34.0).clamp(0.0, 1.0);
            AgentSignal::directional(Self::SIGNAL_ID, "fiscal_agent", as_of_date, SignalDirection::Long, confidence, score, Self::HORIZON_DAYS, metadata)
        } else {
            AgentSignal::directional(Self::SIGNAL_ID, "fiscal_agent", as_of_date, SignalDirection::Neutral, 0.0, score, Self::HORIZON_DAYS, metadata)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_missing_subscores_is_neutral_with_zero_confidence() {
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = DominanceRiskModel::run(DominanceInputs::default(), as_of);
        assert_eq!(signal.direction, SignalDirection::Neutral);
        assert_eq!(signal.confidence, 0.0);
        assert_eq!(signal.value, 50.0);
    }

    #[test]
    fn high_debt_and_spread_pushes_to_long() {
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let inputs = DominanceInputs {
            debt_gdp_pct: Some(95.0),
            r_minus_g_pct: Some(5.0),
            pb_trend_pct: Some(-3.0),
            cb_credibility_gap_pct: Some(6.0),
        };
        let signal = DominanceRiskModel::run(inputs, as_of);
        assert_eq!(signal.direction, SignalDirection::Long);
    }
}
