use crate::stats::trailing_z_score;
use chrono::NaiveDate;
use macro_core::{AgentSignal, SignalDirection};
use serde_json::json;
use std::collections::BTreeMap;

/// 12-month change in primary-balance/GDP, z-scored against a trailing
/// 36-month window of the same 12-month-change series.
pub struct FiscalImpulseModel;

impl FiscalImpulseModel {
    pub const SIGNAL_ID: &'static str = "FISCAL_BR_IMPULSE";
    /// 36 months of changes plus the 12-month lag needed to compute them.
    pub const MIN_OBS: usize = 48;
    const HORIZON_DAYS: u32 = 180;
    const WINDOW_MONTHS: usize = 36;

    /// `monthly_pb_gdp` is monthly primary-balance/GDP ratio, oldest first.
    pub fn run(monthly_pb_gdp: &[f64], as_of_date: NaiveDate) -> AgentSignal {
        if monthly_pb_gdp.len() < Self::MIN_OBS {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "fiscal_agent", as_of_date, Self::HORIZON_DAYS, "insufficient_data");
        }

        let changes: Vec<f64> = (12..monthly_pb_gdp.len())
            .map(|i| monthly_pb_gdp[i] - monthly_pb_gdp[i - 12])
            .collect();

        let window_start = changes.len().saturating_sub(Self::WINDOW_MONTHS + 1);
        let window = &changes[window_start..];

        let Some(z) = trailing_z_score(window) else {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "fiscal_agent", as_of_date, Self::HORIZON_DAYS, "numerical_failure");
        };

        if z == 0.0 {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "fiscal_agent", as_of_date, Self::HORIZON_DAYS, "no_signal");
        }

        let direction = if z > 0.0 { SignalDirection::Short } else { SignalDirection::Long };
        let confidence = (z.abs() / 2.5).min(1.0);

        let mut metadata = BTreeMap::new();
        metadata.insert("impulse_z".to_string(), json!(z));
        metadata.insert("latest_12m_change".to_string(), json!(window.last().copied().unwrap_or(f64::NAN)));

        AgentSignal::directional(Self::SIGNAL_ID, "fiscal_agent", as_of_date, direction, confidence, z, Self::HORIZON_DAYS, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contraction_fires_short() {
        let mut series = vec![0.0; 48];
        for (i, v) in series.iter_mut().enumerate() {
            *v = (i as f64 % 4.0) * 0.1;
        }
        // Sharp recent improvement in primary balance (contraction) vs the trailing pattern.
        let last = series.len() - 1;
        series[last] = series[last - 12] + 5.0;
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = FiscalImpulseModel::run(&series, as_of);
        assert_eq!(signal.direction, SignalDirection::Short);
    }

    #[test]
    fn insufficient_history_is_no_signal() {
        let series = vec![0.0; 20];
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = FiscalImpulseModel::run(&series, as_of);
        assert!(signal.is_no_signal());
    }
}
