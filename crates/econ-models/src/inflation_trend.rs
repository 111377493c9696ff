use crate::filters::hp_filter;
use chrono::NaiveDate;
use macro_core::{AgentSignal, SignalDirection};
use serde_json::json;
use std::collections::BTreeMap;

/// HP-filters the trailing 12-month inflation series and scores the slope
/// of the trend over the last three months against its own history. A
/// disinflationary trend reduces the real-rate risk premium required by
/// the currency; an accelerating trend does the opposite.
pub struct InflationTrendModel;

impl InflationTrendModel {
    pub const SIGNAL_ID: &'static str = "INFLATION_BR_TREND";
    pub const MIN_OBS: usize = 18;
    const HORIZON_DAYS: u32 = 120;
    const HP_LAMBDA: f64 = 14400.0;
    const FIRE_THRESHOLD: f64 = 0.15;

    /// `monthly_yoy_inflation` oldest first, in percent.
    pub fn run(monthly_yoy_inflation: &[f64], as_of_date: NaiveDate) -> AgentSignal {
        if monthly_yoy_inflation.len() < Self::MIN_OBS {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "inflation_agent", as_of_date, Self::HORIZON_DAYS, "insufficient_data");
        }

        let trend = hp_filter(monthly_yoy_inflation, Self::HP_LAMBDA);
        let n = trend.len();
        let slope_3m = trend[n - 1] - trend[n - 4];

        if slope_3m.abs() <= Self::FIRE_THRESHOLD {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "inflation_agent", as_of_date, Self::HORIZON_DAYS, "below_threshold");
        }

        // Disinflation (falling trend) supports the currency => LONG.
        let direction = if slope_3m < 0.0 { SignalDirection::Long } else { SignalDirection::Short };
        let confidence = (slope_3m.abs() / 1.5).min(1.0);

        let mut metadata = BTreeMap::new();
        metadata.insert("trend_slope_3m_pp".to_string(), json!(slope_3m));
        metadata.insert("trend_latest".to_string(), json!(trend[n - 1]));

        AgentSignal::directional(Self::SIGNAL_ID, "inflation_agent", as_of_date, direction, confidence, slope_3m, Self::HORIZON_DAYS, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accelerating_inflation_fires_short() {
        let mut series: Vec<f64> = (0..24).map(|_| 4.0).collect();
        for i in 20..24 {
            series[i] = 4.0 + (i - 19) as f64 * 0.8;
        }
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = InflationTrendModel::run(&series, as_of);
        assert_eq!(signal.direction, SignalDirection::Short);
    }

    #[test]
    fn flat_series_is_no_signal() {
        let series = vec![4.0; 24];
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = InflationTrendModel::run(&series, as_of);
        assert!(signal.is_no_signal());
    }

    #[test]
    fn insufficient_history_is_no_signal() {
        let series = vec![4.0; 5];
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = InflationTrendModel::run(&series, as_of);
        assert!(signal.is_no_signal());
    }
}
