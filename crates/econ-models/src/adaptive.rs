//! Adaptive, data-driven threshold helpers for the inflation agent's models.
//!
//! Instead of a hardcoded threshold ("surprise > 0.3pp = hot print"), these
//! derive thresholds from the series' own distribution using percentile
//! rank and z-score, so a structurally volatile series doesn't constantly
//! trip a signal tuned for a calmer one.

use crate::stats::{mean, std_dev};

/// Percentile rank of `value` within `data`, in `[0, 1]`. Ties count as half.
pub fn percentile_rank(value: f64, data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.5;
    }
    let count_below = data.iter().filter(|&&x| x < value).count();
    let count_equal = data.iter().filter(|&&x| (x - value).abs() < f64::EPSILON).count();
    (count_below as f64 + 0.5 * count_equal as f64) / data.len() as f64
}

/// Map a percentile to a signed score in `[-100, 100]`, with a dead zone
/// in `[neutral_low, neutral_high]`. `invert` flips the sign.
pub fn percentile_to_signal(percentile: f64, neutral_low: f64, neutral_high: f64, invert: bool) -> f64 {
    let raw = if percentile > neutral_high {
        ((percentile - neutral_high) / (1.0 - neutral_high)) * 100.0
    } else if percentile < neutral_low {
        -((neutral_low - percentile) / neutral_low) * 100.0
    } else {
        0.0
    };
    if invert {
        -raw
    } else {
        raw
    }
}

/// Given a current value and its rolling history, returns
/// `(signal_score in [-100,100], z_score, is_significant)`.
pub fn adaptive_signal(value: f64, history: &[f64], invert: bool) -> (f64, f64, bool) {
    if history.len() < 10 {
        return (0.0, 0.0, false);
    }
    let pct = percentile_rank(value, history);
    let sd = std_dev(history);
    let z = if sd < f64::EPSILON { 0.0 } else { (value - mean(history)) / sd };
    let score = percentile_to_signal(pct, 0.25, 0.75, invert);
    let significant = z.abs() > 1.0;
    (score, z, significant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_rank_of_median_is_half() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((percentile_rank(3.0, &data) - 0.5).abs() < 0.01);
    }

    #[test]
    fn adaptive_signal_needs_history() {
        let (score, _z, significant) = adaptive_signal(5.0, &[1.0, 2.0], false);
        assert_eq!(score, 0.0);
        assert!(!significant);
    }
}
