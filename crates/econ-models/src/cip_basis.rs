use chrono::NaiveDate;
use macro_core::{AgentSignal, SignalDirection};
use serde_json::json;
use std::collections::BTreeMap;

/// Covered Interest Parity basis: direction is locked (basis > 0 => LONG).
///
/// Resolution of the spec's open question on the expected-depreciation
/// input: the survey series is used when present; otherwise this falls
/// back to a static SOFR proxy, never to zero.
pub struct CipBasisModel;

impl CipBasisModel {
    pub const SIGNAL_ID: &'static str = "FX_BR_CIP";
    pub const MIN_OBS: usize = 1;
    const HORIZON_DAYS: u32 = 30;
    /// Static fallback for expected depreciation when no survey series is available.
    pub const SOFR_PROXY_RATE: f64 = 0.045;
    /// Basis magnitude (decimal) at which confidence saturates.
    const CONFIDENCE_SCALE: f64 = 0.02;

    pub fn run(
        short_tenor_domestic_rate: Option<f64>,
        foreign_risk_free_rate: Option<f64>,
        expected_depreciation_survey: Option<f64>,
        as_of_date: NaiveDate,
    ) -> AgentSignal {
        let (Some(domestic), Some(foreign)) = (short_tenor_domestic_rate, foreign_risk_free_rate) else {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "fx_agent", as_of_date, Self::HORIZON_DAYS, "insufficient_data");
        };

        let (expected_depreciation, fallback_used) = match expected_depreciation_survey {
            Some(v) => (v, false),
            None => (Self::SOFR_PROXY_RATE, true),
        };

        let basis = domestic - (foreign + expected_depreciation);
        if !basis.is_finite() {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "fx_agent", as_of_date, Self::HORIZON_DAYS, "numerical_failure");
        }

        let direction = if basis > 0.0 { SignalDirection::Long } else { SignalDirection::Short };
        let confidence = (basis.abs() / Self::CONFIDENCE_SCALE).min(1.0);

        let mut metadata = BTreeMap::new();
        metadata.insert("basis".to_string(), json!(basis));
        metadata.insert("expected_depreciation_fallback_used".to_string(), json!(fallback_used));

        AgentSignal::directional(Self::SIGNAL_ID, "fx_agent", as_of_date, direction, confidence, basis, Self::HORIZON_DAYS, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_basis_is_long() {
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = CipBasisModel::run(Some(0.13), Some(0.045), Some(0.02), as_of);
        assert_eq!(signal.direction, SignalDirection::Long);
    }

    #[test]
    fn missing_survey_falls_back_to_sofr_proxy() {
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = CipBasisModel::run(Some(0.10), Some(0.03), None, as_of);
        assert_eq!(signal.metadata.get("expected_depreciation_fallback_used").unwrap(), true);
    }
}
