use crate::stats::trailing_z_score;
use chrono::NaiveDate;
use macro_core::{AgentSignal, SignalDirection};
use serde_json::json;
use std::collections::BTreeMap;

/// Carry-to-risk: z-scores the carry/volatility ratio against a rolling
/// 12-month window and fires on `|z| > 1.0` (strict).
pub struct CarryToRiskModel;

impl CarryToRiskModel {
    pub const SIGNAL_ID: &'static str = "FX_BR_CARRY";
    pub const MIN_OBS: usize = 60;
    const FIRE_THRESHOLD: f64 = 1.0;
    const HORIZON_DAYS: u32 = 60;

    /// `ratio_history` is the rolling window of `(domestic_rate - foreign_rate)
    /// / annualized_30d_realized_vol`, most recent last.
    pub fn run(ratio_history: &[f64], as_of_date: NaiveDate) -> AgentSignal {
        if ratio_history.len() < Self::MIN_OBS {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "fx_agent", as_of_date, Self::HORIZON_DAYS, "insufficient_data");
        }

        let Some(z) = trailing_z_score(ratio_history) else {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "fx_agent", as_of_date, Self::HORIZON_DAYS, "numerical_failure");
        };

        if z.abs() <= Self::FIRE_THRESHOLD {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "fx_agent", as_of_date, Self::HORIZON_DAYS, "below_threshold");
        }

        let direction = if z > 0.0 { SignalDirection::Short } else { SignalDirection::Long };
        let confidence = (z.abs() / 3.0).min(1.0);

        let mut metadata = BTreeMap::new();
        metadata.insert("z_score".to_string(), json!(z));
        metadata.insert("latest_ratio".to_string(), json!(ratio_history.last().copied().unwrap_or(f64::NAN)));

        AgentSignal::directional(Self::SIGNAL_ID, "fx_agent", as_of_date, direction, confidence, z, Self::HORIZON_DAYS, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_with_last(last: f64, n: usize) -> Vec<f64> {
        let mut v: Vec<f64> = (0..n - 1).map(|i| (i as f64 * 0.001).sin()).collect();
        v.push(last);
        v
    }

    #[test]
    fn scenario_b_three_sigma_fires_short_near_full_confidence() {
        let mut history: Vec<f64> = (0..120).map(|_| 0.0).collect();
        // Build a window whose std dev is controlled, then append an outlier 3 sigma away.
        let base: Vec<f64> = (0..119).map(|i| (i as f64 % 5.0) - 2.0).collect();
        let sd = crate::stats::std_dev(&base);
        let mean = crate::stats::mean(&base);
        history = base;
        history.push(mean + 3.0 * sd);

        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = CarryToRiskModel::run(&history, as_of);
        assert_eq!(signal.direction, SignalDirection::Short);
        assert!(signal.confidence > 0.9, "confidence={}", signal.confidence);
    }

    #[test]
    fn z_exactly_at_threshold_does_not_fire() {
        // Construct a window where the trailing z-score is exactly 1.0, then
        // verify the strict-inequality boundary by nudging below it.
        let base: Vec<f64> = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let mean = crate::stats::mean(&base);
        let sd = crate::stats::std_dev(&base);
        let mut history = base.clone();
        history.extend(std::iter::repeat(mean).take(55));
        history.push(mean + 0.99 * sd);
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = CarryToRiskModel::run(&history, as_of);
        assert!(signal.is_no_signal(), "z=0.99 must not fire: {:?}", signal.metadata);
    }

    #[test]
    fn insufficient_history_is_no_signal() {
        let history = window_with_last(5.0, 10);
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = CarryToRiskModel::run(&history, as_of);
        assert!(signal.is_no_signal());
    }
}
