use crate::adaptive::adaptive_signal;
use chrono::NaiveDate;
use macro_core::{AgentSignal, SignalDirection};
use serde_json::json;
use std::collections::BTreeMap;

/// Scores the gap between the realized inflation print and the survey
/// consensus against the surprise series' own rolling distribution. A
/// surprise that is large relative to its own history implies the central
/// bank holds a tighter stance for longer than priced.
pub struct InflationSurpriseModel;

impl InflationSurpriseModel {
    pub const SIGNAL_ID: &'static str = "INFLATION_BR_SURPRISE";
    pub const MIN_OBS: usize = 12;
    const HORIZON_DAYS: u32 = 60;

    /// `surprise_history` is `actual - consensus` for each past print
    /// (oldest first), not including the current one.
    pub fn run(actual: Option<f64>, consensus: Option<f64>, surprise_history: &[f64], as_of_date: NaiveDate) -> AgentSignal {
        let (Some(actual), Some(consensus)) = (actual, consensus) else {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "inflation_agent", as_of_date, Self::HORIZON_DAYS, "insufficient_data");
        };
        if surprise_history.len() < Self::MIN_OBS {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "inflation_agent", as_of_date, Self::HORIZON_DAYS, "insufficient_data");
        }

        let surprise = actual - consensus;
        let (score, z, significant) = adaptive_signal(surprise, surprise_history, false);
        if !significant || score == 0.0 {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "inflation_agent", as_of_date, Self::HORIZON_DAYS, "below_threshold");
        }

        let direction = if score > 0.0 { SignalDirection::Long } else { SignalDirection::Short };
        let confidence = (score.abs() / 100.0).min(1.0);

        let mut metadata = BTreeMap::new();
        metadata.insert("surprise_pp".to_string(), json!(surprise));
        metadata.insert("z_score".to_string(), json!(z));

        AgentSignal::directional(Self::SIGNAL_ID, "inflation_agent", as_of_date, direction, confidence, surprise, Self::HORIZON_DAYS, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_hot_surprise_fires_long() {
        let history: Vec<f64> = (0..20).map(|i| (i % 3) as f64 * 0.05 - 0.05).collect();
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = InflationSurpriseModel::run(Some(6.0), Some(5.0), &history, as_of);
        assert_eq!(signal.direction, SignalDirection::Long);
    }

    #[test]
    fn missing_consensus_is_no_signal() {
        let history = vec![0.0; 12];
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = InflationSurpriseModel::run(Some(6.0), None, &history, as_of);
        assert!(signal.is_no_signal());
    }

    #[test]
    fn short_history_is_no_signal() {
        let history = vec![0.0; 5];
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = InflationSurpriseModel::run(Some(6.0), Some(5.0), &history, as_of);
        assert!(signal.is_no_signal());
    }
}
