/// Rolling-window statistics shared by the z-score firing models, adapted
/// from the platform's adaptive-threshold helpers (mean/std_dev/z_score_of).

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

pub fn std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
    variance.sqrt()
}

/// z-score of `value` against the *other* points in `history` (history is the
/// rolling window, `value` is typically its own last element or an
/// out-of-window current observation).
pub fn z_score_of(value: f64, history: &[f64]) -> f64 {
    let sd = std_dev(history);
    if sd < f64::EPSILON {
        return 0.0;
    }
    (value - mean(history)) / sd
}

/// z-score the last point of a series against the rolling window formed by
/// everything before it (the usual "z-score against trailing history" shape
/// used by carry-to-risk, flow, and fiscal-impulse).
pub fn trailing_z_score(series: &[f64]) -> Option<f64> {
    let (last, window) = series.split_last()?;
    if window.is_empty() {
        return None;
    }
    Some(z_score_of(*last, window))
}

/// Annualized realized volatility from a slice of daily returns.
pub fn annualized_vol(returns: &[f64]) -> f64 {
    std_dev(returns) * 252.0_f64.sqrt()
}

/// Simple daily returns from a price series.
pub fn returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn z_score_of_mean_is_zero() {
        let data = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        assert!(z_score_of(30.0, &data).abs() < 1e-9);
    }

    #[test]
    fn trailing_z_score_needs_at_least_two_points() {
        assert_eq!(trailing_z_score(&[1.0]), None);
        assert!(trailing_z_score(&[1.0, 2.0, 3.0]).is_some());
    }
}
