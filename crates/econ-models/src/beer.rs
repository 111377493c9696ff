use crate::ols::{OlsError, OlsFrame};
use chrono::NaiveDate;
use macro_core::{AgentSignal, SignalDirection};
use serde_json::json;
use std::collections::BTreeMap;

/// Behavioral Equilibrium Exchange Rate: OLS-based FX fair-value model.
pub struct BeerModel;

impl BeerModel {
    pub const SIGNAL_ID: &'static str = "FX_BR_BEER";
    pub const MIN_OBS: usize = 24;
    /// Locked misalignment threshold (percent) required to fire.
    pub const THRESHOLD_PCT: f64 = 5.0;
    const HORIZON_DAYS: u32 = 90;

    /// `frame.target` must already be `log(target_price)`.
    pub fn run(frame: &OlsFrame, as_of_date: NaiveDate) -> AgentSignal {
        let n_obs = frame.target.iter().filter(|v| v.is_some()).count();
        if n_obs < Self::MIN_OBS {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "fx_agent", as_of_date, Self::HORIZON_DAYS, "insufficient_data");
        }

        let fitted = match frame.fit() {
            Ok(f) => f,
            Err(OlsError::InsufficientPredictors) => {
                return AgentSignal::no_signal(Self::SIGNAL_ID, "fx_agent", as_of_date, Self::HORIZON_DAYS, "insufficient_predictors");
            }
            Err(_) => {
                return AgentSignal::no_signal(Self::SIGNAL_ID, "fx_agent", as_of_date, Self::HORIZON_DAYS, "numerical_failure");
            }
        };

        let (Some(fair_log), Some(actual_log)) = (frame.predict_latest(&fitted), frame.latest_actual()) else {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "fx_agent", as_of_date, Self::HORIZON_DAYS, "insufficient_data");
        };

        let fair_value = fair_log.exp();
        let actual = actual_log.exp();
        if !fair_value.is_finite() || fair_value == 0.0 {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "fx_agent", as_of_date, Self::HORIZON_DAYS, "numerical_failure");
        }
        let misalignment_pct = (actual / fair_value - 1.0) * 100.0;

        if misalignment_pct.abs() <= Self::THRESHOLD_PCT {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "fx_agent", as_of_date, Self::HORIZON_DAYS, "below_threshold");
        }

        let direction = if actual > fair_value { SignalDirection::Short } else { SignalDirection::Long };
        let confidence = (misalignment_pct.abs() / 10.0).min(1.0);

        let mut metadata = BTreeMap::new();
        metadata.insert("misalignment_pct".to_string(), json!(misalignment_pct));
        metadata.insert("n_predictors".to_string(), json!(fitted.retained_predictors.len()));
        metadata.insert("retained_predictors".to_string(), json!(fitted.retained_predictors));
        metadata.insert("n_obs".to_string(), json!(fitted.n_obs));
        metadata.insert("drivers".to_string(), json!(fitted.retained_predictors));

        AgentSignal::directional(
            Self::SIGNAL_ID,
            "fx_agent",
            as_of_date,
            direction,
            confidence,
            misalignment_pct,
            Self::HORIZON_DAYS,
            metadata,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overvalued_frame() -> OlsFrame {
        let n = 30;
        let mut target = Vec::new();
        let mut x1 = Vec::new();
        let mut x2 = Vec::new();
        for i in 0..n {
            let a = i as f64 * 0.01;
            let b = (n - i) as f64 * 0.01;
            target.push(Some(0.5 + 1.0 * a + 1.0 * b));
            x1.push(Some(a));
            x2.push(Some(b));
        }
        // Last row: bump the actual log-price by +0.08 above what the fit would predict.
        let last = target.len() - 1;
        target[last] = Some(target[last].unwrap() + 0.08);
        OlsFrame {
            target,
            predictors: vec![("x1".to_string(), x1), ("x2".to_string(), x2)],
        }
    }

    #[test]
    fn scenario_a_beer_undervalued_fires_short_strong() {
        let frame = overvalued_frame();
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = BeerModel::run(&frame, as_of);
        assert_eq!(signal.direction, SignalDirection::Short);
        assert!((signal.value - 8.0).abs() < 1.5, "value={}", signal.value);
        assert!(signal.confidence > 0.6, "confidence={}", signal.confidence);
    }

    #[test]
    fn insufficient_history_returns_no_signal() {
        let frame = OlsFrame {
            target: vec![Some(1.0); 5],
            predictors: vec![("x1".to_string(), vec![Some(1.0); 5]), ("x2".to_string(), vec![Some(1.0); 5])],
        };
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = BeerModel::run(&frame, as_of);
        assert!(signal.is_no_signal());
    }
}
