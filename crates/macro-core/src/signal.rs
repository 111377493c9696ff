use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Directional stance of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalDirection {
    Long,
    Short,
    Neutral,
}

/// Five-level strength tag, a pure function of confidence (see `classify_strength`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalStrength {
    NoSignal,
    Weak,
    Moderate,
    Strong,
    Extreme,
}

/// Thresholds for `classify_strength`, configurable via `CLASSIFY_STRENGTH_THRESHOLDS`.
#[derive(Debug, Clone, Copy)]
pub struct StrengthThresholds {
    pub weak: f64,
    pub moderate: f64,
    pub strong: f64,
}

impl Default for StrengthThresholds {
    fn default() -> Self {
        Self {
            weak: 0.35,
            moderate: 0.60,
            strong: 0.85,
        }
    }
}

/// classify_strength(c): NO_SIGNAL if c=0, WEAK if c<0.35, MODERATE if c<0.60,
/// STRONG if c<0.85, EXTREME otherwise. Monotone non-decreasing in confidence.
pub fn classify_strength(confidence: f64) -> SignalStrength {
    classify_strength_with(confidence, StrengthThresholds::default())
}

pub fn classify_strength_with(confidence: f64, t: StrengthThresholds) -> SignalStrength {
    if confidence <= 0.0 {
        SignalStrength::NoSignal
    } else if confidence < t.weak {
        SignalStrength::Weak
    } else if confidence < t.moderate {
        SignalStrength::Moderate
    } else if confidence < t.strong {
        SignalStrength::Strong
    } else {
        SignalStrength::Extreme
    }
}

/// A single directional statement produced by one model within one agent.
///
/// The only public constructors are `AgentSignal::no_signal` and
/// `AgentSignal::directional`, so invariant 3 (`NO_SIGNAL` iff
/// `confidence == 0.0 && direction == NEUTRAL`) cannot be violated by
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSignal {
    pub signal_id: String,
    pub agent_id: String,
    pub timestamp: DateTime<Utc>,
    pub as_of_date: NaiveDate,
    pub direction: SignalDirection,
    pub strength: SignalStrength,
    pub confidence: f64,
    pub value: f64,
    pub horizon_days: u32,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl AgentSignal {
    /// Build a NO_SIGNAL signal. `reason` is recorded under `metadata.reason`.
    pub fn no_signal(
        signal_id: impl Into<String>,
        agent_id: impl Into<String>,
        as_of_date: NaiveDate,
        horizon_days: u32,
        reason: impl Into<String>,
    ) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("reason".to_string(), serde_json::Value::String(reason.into()));
        Self {
            signal_id: signal_id.into(),
            agent_id: agent_id.into(),
            timestamp: Utc::now(),
            as_of_date,
            direction: SignalDirection::Neutral,
            strength: SignalStrength::NoSignal,
            confidence: 0.0,
            value: 0.0,
            horizon_days,
            metadata,
        }
    }

    /// Build a directional signal. `confidence` must be in `[0, 1]`; it is
    /// clamped defensively and strength is derived from it.
    #[allow(clippy::too_many_arguments)]
    pub fn directional(
        signal_id: impl Into<String>,
        agent_id: impl Into<String>,
        as_of_date: NaiveDate,
        direction: SignalDirection,
        confidence: f64,
        value: f64,
        horizon_days: u32,
        metadata: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        let (direction, confidence) = if direction == SignalDirection::Neutral || confidence == 0.0 {
            (SignalDirection::Neutral, 0.0)
        } else {
            (direction, confidence)
        };
        Self {
            signal_id: signal_id.into(),
            agent_id: agent_id.into(),
            timestamp: Utc::now(),
            as_of_date,
            direction,
            strength: classify_strength(confidence),
            confidence,
            value,
            horizon_days,
            metadata,
        }
    }

    pub fn is_no_signal(&self) -> bool {
        self.strength == SignalStrength::NoSignal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_strength_monotone() {
        let cs: Vec<f64> = vec![0.0, 0.1, 0.34, 0.35, 0.59, 0.6, 0.84, 0.85, 1.0];
        let mut last = SignalStrength::NoSignal;
        for c in cs {
            let s = classify_strength(c);
            assert!(s >= last, "strength regressed at confidence {c}");
            last = s;
        }
    }

    #[test]
    fn classify_strength_boundaries() {
        assert_eq!(classify_strength(0.0), SignalStrength::NoSignal);
        assert_eq!(classify_strength(0.349), SignalStrength::Weak);
        assert_eq!(classify_strength(0.35), SignalStrength::Moderate);
        assert_eq!(classify_strength(0.599), SignalStrength::Moderate);
        assert_eq!(classify_strength(0.60), SignalStrength::Strong);
        assert_eq!(classify_strength(0.849), SignalStrength::Strong);
        assert_eq!(classify_strength(0.85), SignalStrength::Extreme);
    }

    #[test]
    fn no_signal_invariant() {
        let s = AgentSignal::no_signal("FX_BR_TEST", "fx_agent", NaiveDate::from_ymd_opt(2026, 2, 21).unwrap(), 90, "insufficient_data");
        assert_eq!(s.confidence, 0.0);
        assert_eq!(s.direction, SignalDirection::Neutral);
        assert_eq!(s.strength, SignalStrength::NoSignal);
    }

    #[test]
    fn directional_clamps_neutral_to_no_signal() {
        let s = AgentSignal::directional(
            "FX_BR_TEST",
            "fx_agent",
            NaiveDate::from_ymd_opt(2026, 2, 21).unwrap(),
            SignalDirection::Neutral,
            0.8,
            1.0,
            90,
            BTreeMap::new(),
        );
        assert_eq!(s.confidence, 0.0);
        assert_eq!(s.strength, SignalStrength::NoSignal);
    }
}
