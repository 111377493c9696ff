use chrono::NaiveDate;
use macro_core::{classify_strength, AgentSignal, MacroError, MacroResult, SignalDirection};
use serde_json::json;
use std::collections::BTreeMap;

/// Locked conflict-dampening multiplier applied to composite confidence
/// when active children disagree in direction.
pub const CONFLICT_DAMPENING: f64 = 0.70;

pub struct CompositeChild<'a> {
    pub signal: &'a AgentSignal,
    pub base_weight: f64,
}

/// Builds a composite signal from locked base weights over child signals:
/// keep only active children (non-`NO_SIGNAL`, non-`NEUTRAL`), renormalize
/// their weights, take the plurality direction (ties go LONG), dampen
/// confidence by [`CONFLICT_DAMPENING`] when any active child disagrees.
///
/// Returns `InvariantViolation` if `base_weight`s do not sum to ~1.0 —
/// that is an implementation bug, not a data condition.
pub fn build_composite(
    agent_id: &str,
    composite_signal_id: &str,
    as_of_date: NaiveDate,
    horizon_days: u32,
    children: &[CompositeChild],
) -> MacroResult<AgentSignal> {
    let weight_sum: f64 = children.iter().map(|c| c.base_weight).sum();
    if (weight_sum - 1.0).abs() > 1e-6 {
        return Err(MacroError::InvariantViolation(format!(
            "composite '{composite_signal_id}' base weights sum to {weight_sum}, expected 1.0"
        )));
    }

    let active: Vec<&CompositeChild> = children
        .iter()
        .filter(|c| !c.signal.is_no_signal() && c.signal.direction != SignalDirection::Neutral)
        .collect();

    if active.is_empty() {
        return Ok(AgentSignal::no_signal(composite_signal_id, agent_id, as_of_date, horizon_days, "no_active_children"));
    }

    let active_weight_sum: f64 = active.iter().map(|c| c.base_weight).sum();
    let renormalized: Vec<(&CompositeChild, f64)> = active
        .iter()
        .map(|c| (*c, c.base_weight / active_weight_sum))
        .collect();

    let long_weight: f64 = renormalized
        .iter()
        .filter(|(c, _)| c.signal.direction == SignalDirection::Long)
        .map(|(_, w)| w)
        .sum();
    let short_weight: f64 = renormalized
        .iter()
        .filter(|(c, _)| c.signal.direction == SignalDirection::Short)
        .map(|(_, w)| w)
        .sum();

    // Plurality; ties go LONG.
    let plurality = if long_weight >= short_weight { SignalDirection::Long } else { SignalDirection::Short };

    let base_confidence: f64 = renormalized.iter().map(|(c, w)| w * c.signal.confidence).sum();

    let disagreement_count = renormalized.iter().filter(|(c, _)| c.signal.direction != plurality).count();
    let dampened = disagreement_count > 0;
    let final_confidence = if dampened { (base_confidence * CONFLICT_DAMPENING).min(1.0) } else { base_confidence.min(1.0) };

    let children_meta: Vec<serde_json::Value> = renormalized
        .iter()
        .map(|(c, w)| {
            json!({
                "signal_id": c.signal.signal_id,
                "direction": format!("{:?}", c.signal.direction).to_uppercase(),
                "renormalized_weight": w,
                "confidence": c.signal.confidence,
            })
        })
        .collect();

    let mut metadata = BTreeMap::new();
    metadata.insert("children".to_string(), json!(children_meta));
    metadata.insert("long_weight".to_string(), json!(long_weight));
    metadata.insert("short_weight".to_string(), json!(short_weight));
    metadata.insert("dampened".to_string(), json!(dampened));
    metadata.insert("base_confidence".to_string(), json!(base_confidence));

    Ok(AgentSignal::directional(
        composite_signal_id,
        agent_id,
        as_of_date,
        plurality,
        final_confidence,
        final_confidence,
        horizon_days,
        metadata,
    ))
}

#[allow(dead_code)]
fn _assert_strength_is_pure_function_of_confidence(confidence: f64) {
    let _ = classify_strength(confidence);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;

    fn signal(id: &str, direction: SignalDirection, confidence: f64) -> AgentSignal {
        AgentSignal::directional(id, "fx_agent", NaiveDate::from_ymd_opt(2026, 2, 21).unwrap(), direction, confidence, 0.0, 90, Map::new())
    }

    #[test]
    fn scenario_d_composite_with_conflict() {
        let no_signal = AgentSignal::no_signal("FX_BR_CIP", "fx_agent", NaiveDate::from_ymd_opt(2026, 2, 21).unwrap(), 90, "below_threshold");
        let beer = signal("FX_BR_BEER", SignalDirection::Short, 0.8);
        let carry = signal("FX_BR_CARRY", SignalDirection::Short, 0.6);
        let flow = signal("FX_BR_FLOW", SignalDirection::Long, 0.4);

        let children = vec![
            CompositeChild { signal: &beer, base_weight: 0.40 },
            CompositeChild { signal: &carry, base_weight: 0.30 },
            CompositeChild { signal: &flow, base_weight: 0.20 },
            CompositeChild { signal: &no_signal, base_weight: 0.10 },
        ];

        let composite = build_composite("fx_agent", "FX_BR_COMPOSITE", NaiveDate::from_ymd_opt(2026, 2, 21).unwrap(), 90, &children).unwrap();
        assert_eq!(composite.direction, SignalDirection::Short);
        assert!((composite.confidence - 0.451).abs() < 0.01, "confidence={}", composite.confidence);
        assert_eq!(composite.strength, classify_strength(composite.confidence));
    }

    #[test]
    fn empty_active_children_is_no_signal_with_zero_value() {
        let a = AgentSignal::no_signal("A", "fx_agent", NaiveDate::from_ymd_opt(2026, 2, 21).unwrap(), 90, "x");
        let b = AgentSignal::no_signal("B", "fx_agent", NaiveDate::from_ymd_opt(2026, 2, 21).unwrap(), 90, "x");
        let children = vec![
            CompositeChild { signal: &a, base_weight: 0.5 },
            CompositeChild { signal: &b, base_weight: 0.5 },
        ];
        let composite = build_composite("fx_agent", "FX_BR_COMPOSITE", NaiveDate::from_ymd_opt(2026, 2, 21).unwrap(), 90, &children).unwrap();
        assert!(composite.is_no_signal());
        assert_eq!(composite.value, 0.0);
    }

    #[test]
    fn single_active_child_is_not_dampened() {
        let only = signal("FX_BR_BEER", SignalDirection::Long, 0.7);
        let ns = AgentSignal::no_signal("FX_BR_CARRY", "fx_agent", NaiveDate::from_ymd_opt(2026, 2, 21).unwrap(), 90, "x");
        let children = vec![
            CompositeChild { signal: &only, base_weight: 0.6 },
            CompositeChild { signal: &ns, base_weight: 0.4 },
        ];
        let composite = build_composite("fx_agent", "FX_BR_COMPOSITE", NaiveDate::from_ymd_opt(2026, 2, 21).unwrap(), 90, &children).unwrap();
        assert!((composite.confidence - 0.7).abs() < 1e-9);
        assert_eq!(composite.metadata.get("dampened").unwrap(), false);
    }

    #[test]
    fn weights_not_summing_to_one_is_invariant_violation() {
        let only = signal("FX_BR_BEER", SignalDirection::Long, 0.7);
        let children = vec![CompositeChild { signal: &only, base_weight: 0.9 }];
        let err = build_composite("fx_agent", "FX_BR_COMPOSITE", NaiveDate::from_ymd_opt(2026, 2, 21).unwrap(), 90, &children).unwrap_err();
        assert!(matches!(err, MacroError::InvariantViolation(_)));
    }
}
