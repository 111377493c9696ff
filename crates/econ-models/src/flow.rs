use crate::stats::trailing_z_score;
use chrono::NaiveDate;
use macro_core::{AgentSignal, SignalDirection};
use serde_json::json;
use std::collections::BTreeMap;

/// Equal-weights the z-scored FX flow and speculator-positioning series.
/// Falls back to a single source when the other is missing rather than
/// emitting NO_SIGNAL purely for partial coverage.
pub struct FlowModel;

impl FlowModel {
    pub const SIGNAL_ID: &'static str = "FX_BR_FLOW";
    pub const MIN_OBS: usize = 30;
    const HORIZON_DAYS: u32 = 30;
    /// Combined |z| beyond which confidence saturates at 1.0.
    const CONFIDENCE_SCALE: f64 = 2.5;

    pub fn run(fx_flow_history: Option<&[f64]>, positioning_history: Option<&[f64]>, as_of_date: NaiveDate) -> AgentSignal {
        let fx_z = fx_flow_history
            .filter(|h| h.len() >= Self::MIN_OBS)
            .and_then(trailing_z_score);
        let pos_z = positioning_history
            .filter(|h| h.len() >= Self::MIN_OBS)
            .and_then(trailing_z_score);

        let (combined_z, sources) = match (fx_z, pos_z) {
            (Some(a), Some(b)) => ((a + b) / 2.0, "fx_flow+positioning"),
            (Some(a), None) => (a, "fx_flow_only"),
            (None, Some(b)) => (b, "positioning_only"),
            (None, None) => {
                return AgentSignal::no_signal(Self::SIGNAL_ID, "fx_agent", as_of_date, Self::HORIZON_DAYS, "insufficient_data");
            }
        };

        if combined_z == 0.0 {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "fx_agent", as_of_date, Self::HORIZON_DAYS, "no_signal");
        }

        let direction = if combined_z > 0.0 { SignalDirection::Long } else { SignalDirection::Short };
        let confidence = (combined_z.abs() / Self::CONFIDENCE_SCALE).min(1.0);

        let mut metadata = BTreeMap::new();
        metadata.insert("combined_z".to_string(), json!(combined_z));
        metadata.insert("sources".to_string(), json!(sources));
        metadata.insert("fx_flow_z".to_string(), json!(fx_z));
        metadata.insert("positioning_z".to_string(), json!(pos_z));

        AgentSignal::directional(Self::SIGNAL_ID, "fx_agent", as_of_date, direction, confidence, combined_z, Self::HORIZON_DAYS, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising_window(n: usize, jump: f64) -> Vec<f64> {
        let mut v: Vec<f64> = (0..n - 1).map(|i| (i as f64 % 3.0) - 1.0).collect();
        let mean = crate::stats::mean(&v);
        let sd = crate::stats::std_dev(&v);
        v.push(mean + jump * sd);
        v
    }

    #[test]
    fn single_source_fallback_still_fires() {
        let fx_flow = rising_window(40, 2.0);
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = FlowModel::run(Some(&fx_flow), None, as_of);
        assert!(!signal.is_no_signal());
        assert_eq!(signal.metadata.get("sources").unwrap(), "fx_flow_only");
    }

    #[test]
    fn both_missing_is_no_signal() {
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = FlowModel::run(None, None, as_of);
        assert!(signal.is_no_signal());
    }
}
