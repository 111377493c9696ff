use chrono::NaiveDate;
use macro_core::{AgentSignal, SignalDirection};
use serde_json::json;
use std::collections::BTreeMap;

/// Debt Sustainability Analysis: projects debt-to-GDP 5 years forward under
/// four locked scenarios using `d_{t+1} = d_t * (1+r) / (1+g) - pb`, with
/// `r`, `g`, `pb` expressed in percentage points (matching `debt_gdp`'s
/// own percent-of-GDP scale).
pub struct DsaModel;

#[derive(Debug, Clone, Copy)]
pub struct ScenarioAdjustment {
    pub name: &'static str,
    pub r_adj: f64,
    pub g_adj: f64,
    pub pb_adj: f64,
}

/// Locked `DSA_SCENARIOS` mapping.
pub const SCENARIOS: [ScenarioAdjustment; 4] = [
    ScenarioAdjustment { name: "baseline", r_adj: 0.0, g_adj: 0.0, pb_adj: 0.0 },
    ScenarioAdjustment { name: "stress", r_adj: 2.0, g_adj: -1.0, pb_adj: 0.0 },
    ScenarioAdjustment { name: "adjustment", r_adj: 0.0, g_adj: 0.0, pb_adj: 1.5 },
    ScenarioAdjustment { name: "tailwind", r_adj: -1.0, g_adj: 1.0, pb_adj: 0.0 },
];

const PROJECTION_YEARS: usize = 5;
/// Percentage-point move in terminal debt/GDP that counts as a directional shift.
const DIRECTION_THRESHOLD_PP: f64 = 5.0;

impl DsaModel {
    pub const SIGNAL_ID: &'static str = "FISCAL_BR_DSA";
    pub const MIN_OBS: usize = 1;
    const HORIZON_DAYS: u32 = 365 * 2;

    /// Project one scenario's debt/GDP path for `PROJECTION_YEARS`, returning
    /// `[d_1, ..., d_5]`. Year 0 (the observed current debt) is the caller's
    /// `current_debt_gdp` and is not included in the returned path.
    pub fn project_path(current_debt_gdp: f64, r: f64, g: f64, pb: f64, adj: ScenarioAdjustment) -> Vec<f64> {
        let r = (r + adj.r_adj) / 100.0;
        let g = (g + adj.g_adj) / 100.0;
        let pb = pb + adj.pb_adj;
        let mut path = Vec::with_capacity(PROJECTION_YEARS);
        let mut d = current_debt_gdp;
        for _ in 0..PROJECTION_YEARS {
            d = d * (1.0 + r) / (1.0 + g) - pb;
            path.push(d);
        }
        path
    }

    pub fn run(current_debt_gdp: f64, r: f64, g: f64, pb: f64, as_of_date: NaiveDate) -> AgentSignal {
        if !current_debt_gdp.is_finite() || !r.is_finite() || !g.is_finite() || !pb.is_finite() {
            return AgentSignal::no_signal(Self::SIGNAL_ID, "fiscal_agent", as_of_date, Self::HORIZON_DAYS, "insufficient_data");
        }

        let mut terminal_by_scenario = BTreeMap::new();
        for adj in SCENARIOS {
            let path = Self::project_path(current_debt_gdp, r, g, pb, adj);
            terminal_by_scenario.insert(adj.name, *path.last().unwrap());
        }

        let baseline_terminal = terminal_by_scenario["baseline"];
        let delta = baseline_terminal - current_debt_gdp;

        let direction = if delta >= DIRECTION_THRESHOLD_PP {
            SignalDirection::Long
        } else if delta <= -DIRECTION_THRESHOLD_PP {
            SignalDirection::Short
        } else {
            SignalDirection::Neutral
        };

        let stabilizing = terminal_by_scenario.values().filter(|&&terminal| terminal <= current_debt_gdp).count();
        let confidence = match stabilizing {
            4 => 1.0,
            3 => 0.70,
            2 => 0.40,
            1 => 0.20,
            _ => 0.05,
        };

        if direction == SignalDirection::Neutral {
            let mut metadata = BTreeMap::new();
            metadata.insert("baseline_terminal_debt_gdp".to_string(), json!(baseline_terminal));
            metadata.insert("scenario_terminal_debt_gdp".to_string(), json!(terminal_by_scenario));
            metadata.insert("scenario_consensus".to_string(), json!(stabilizing));
            return AgentSignal::directional(Self::SIGNAL_ID, "fiscal_agent", as_of_date, SignalDirection::Neutral, 0.0, delta, Self::HORIZON_DAYS, metadata);
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("baseline_terminal_debt_gdp".to_string(), json!(baseline_terminal));
        metadata.insert("scenario_terminal_debt_gdp".to_string(), json!(terminal_by_scenario));
        metadata.insert("scenario_consensus".to_string(), json!(stabilizing));

        AgentSignal::directional(Self::SIGNAL_ID, "fiscal_agent", as_of_date, direction, confidence, delta, Self::HORIZON_DAYS, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recurrence_holds_pointwise_for_five_years() {
        let adj = SCENARIOS[0];
        let path = DsaModel::project_path(85.0, 13.0, 1.5, -0.5, adj);
        assert_eq!(path.len(), 5);
        let r = 0.13;
        let g = 0.015;
        let pb = -0.5;
        let mut d = 85.0;
        for expected in &path {
            d = d * (1.0 + r) / (1.0 + g) - pb;
            assert!((d - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn scenario_c_rising_debt_is_long() {
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = DsaModel::run(85.0, 13.0, 1.5, -0.5, as_of);
        assert_eq!(signal.direction, SignalDirection::Long);
    }

    #[test]
    fn all_scenarios_stabilize_gives_full_confidence() {
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        // Large primary surplus and low real rate vs growth keeps debt falling under every scenario.
        let signal = DsaModel::run(60.0, 2.0, 4.0, 5.0, as_of);
        assert_eq!(signal.direction, SignalDirection::Short);
        assert_eq!(signal.confidence, 1.0);
    }
}
