use chrono::NaiveDate;
use macro_core::{AgentSignal, SignalDirection};
use serde_json::json;
use std::collections::BTreeMap;

/// Output-gap-plus-inflation-gap Taylor rule, compared against the actual
/// policy rate. Consumes the r* estimate from `KalmanRStarModel`.
pub struct TaylorRuleModel;

impl TaylorRuleModel {
    pub const SIGNAL_ID: &'static str = "MONETARY_BR_TAYLOR";
    pub const MIN_OBS: usize = 1;
    const HORIZON_DAYS: u32 = 120;
    const FIRE_THRESHOLD_PP: f64 = 0.5;
    const INFLATION_GAP_WEIGHT: f64 = 0.5;
    const OUTPUT_GAP_WEIGHT: f64 = 0.5;

    #[allow(clippy::too_many_arguments)]
    pub fn run(
        policy_rate: Option<f64>,
        inflation: Option<f64>,
        inflation_target: f64,
        output_gap_pct: Option<f64>,
        r_star: Option<f64>,
        as_of_date: NaiveDate,
    ) -> AgentSignal {
        let (Some(policy_rate), Some(inflation), Some(output_gap), Some(r_star)) =
            (policy_rate, inflation, output_gap_pct, r_star)
        else {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "monetary_agent", as_of_date, Self::HORIZON_DAYS, "insufficient_data");
        };

        let target_rate = r_star
            + inflation
            + Self::INFLATION_GAP_WEIGHT * (inflation - inflation_target)
            + Self::OUTPUT_GAP_WEIGHT * output_gap;

        let gap = policy_rate - target_rate;
        if !gap.is_finite() {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "monetary_agent", as_of_date, Self::HORIZON_DAYS, "numerical_failure");
        }
        if gap.abs() <= Self::FIRE_THRESHOLD_PP {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "monetary_agent", as_of_date, Self::HORIZON_DAYS, "below_threshold");
        }

        // Policy rate above the Taylor-implied target => restrictive stance => LONG.
        let direction = if gap > 0.0 { SignalDirection::Long } else { SignalDirection::Short };
        let confidence = (gap.abs() / 3.0).min(1.0);

        let mut metadata = BTreeMap::new();
        metadata.insert("taylor_target_rate".to_string(), json!(target_rate));
        metadata.insert("policy_rate".to_string(), json!(policy_rate));
        metadata.insert("gap_pp".to_string(), json!(gap));

        AgentSignal::directional(Self::SIGNAL_ID, "monetary_agent", as_of_date, direction, confidence, gap, Self::HORIZON_DAYS, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restrictive_policy_rate_fires_long() {
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = TaylorRuleModel::run(Some(14.0), Some(5.0), 3.0, Some(0.5), Some(4.5), as_of);
        assert_eq!(signal.direction, SignalDirection::Long);
    }

    #[test]
    fn missing_inputs_is_no_signal() {
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = TaylorRuleModel::run(None, Some(5.0), 3.0, Some(0.5), Some(4.5), as_of);
        assert!(signal.is_no_signal());
    }
}
