use crate::filters::{hp_filter, ScalarKalmanFilter};
use chrono::NaiveDate;
use macro_core::{AgentSignal, SignalDirection};
use serde_json::json;
use std::collections::BTreeMap;

/// HP-filters real rates (lambda 1600, monthly) then runs a scalar Kalman
/// filter over the trend to estimate the neutral rate r*. Fires when the
/// current real rate deviates materially from the r* estimate.
pub struct KalmanRStarModel;

impl KalmanRStarModel {
    pub const SIGNAL_ID: &'static str = "MONETARY_BR_R_STAR";
    pub const MIN_OBS: usize = 36;
    const HP_LAMBDA: f64 = 1600.0;
    const HORIZON_DAYS: u32 = 180;
    const FIRE_THRESHOLD_PP: f64 = 0.75;

    /// `monthly_real_rate` is the monthly real policy rate series (percent), oldest first.
    pub fn run(monthly_real_rate: &[f64], as_of_date: NaiveDate) -> (AgentSignal, Vec<f64>) {
        if monthly_real_rate.len() < Self::MIN_OBS {
            return (
                AgentSignal::no_signal(Self::SIGNAL_ID, "monetary_agent", as_of_date, Self::HORIZON_DAYS, "insufficient_data"),
                Vec::new(),
            );
        }

        let trend = hp_filter(monthly_real_rate, Self::HP_LAMBDA);
        let kf = ScalarKalmanFilter::new(0.01, 0.15);
        let r_star_path = kf.filter(&trend);

        let current_real_rate = *monthly_real_rate.last().unwrap();
        let r_star = *r_star_path.last().unwrap();
        let deviation = current_real_rate - r_star;

        if deviation.abs() <= Self::FIRE_THRESHOLD_PP {
            return (
                AgentSignal::no_signal(Self::SIGNAL_ID, "monetary_agent", as_of_date, Self::HORIZON_DAYS, "below_threshold"),
                r_star_path,
            );
        }

        // Real rate above neutral => restrictive stance => LONG (currency strength/carry support).
        let direction = if deviation > 0.0 { SignalDirection::Long } else { SignalDirection::Short };
        let confidence = (deviation.abs() / 2.0).min(1.0);

        let mut metadata = BTreeMap::new();
        metadata.insert("r_star_estimate".to_string(), json!(r_star));
        metadata.insert("current_real_rate".to_string(), json!(current_real_rate));
        metadata.insert("deviation_pp".to_string(), json!(deviation));

        (
            AgentSignal::directional(Self::SIGNAL_ID, "monetary_agent", as_of_date, direction, confidence, deviation, Self::HORIZON_DAYS, metadata),
            r_star_path,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restrictive_real_rate_fires_long() {
        let mut series: Vec<f64> = (0..48).map(|_| 2.0).collect();
        *series.last_mut().unwrap() = 5.0;
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let (signal, path) = KalmanRStarModel::run(&series, as_of);
        assert_eq!(path.len(), series.len());
        assert_eq!(signal.direction, SignalDirection::Long);
    }

    #[test]
    fn insufficient_history_is_no_signal() {
        let series = vec![2.0; 10];
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let (signal, _) = KalmanRStarModel::run(&series, as_of);
        assert!(signal.is_no_signal());
    }
}
