use nalgebra::{DMatrix, DVector};

/// Hodrick-Prescott filter: decomposes `series` into trend + cycle by
/// minimizing `sum((y_t - tau_t)^2) + lambda * sum(((tau_{t+1}-tau_t) - (tau_t-tau_{t-1}))^2)`.
/// Returns the trend component. `lambda = 1600` for monthly data per the
/// platform convention.
pub fn hp_filter(series: &[f64], lambda: f64) -> Vec<f64> {
    let n = series.len();
    if n < 3 {
        return series.to_vec();
    }

    // Second-difference operator D (n-2 x n), so the penalty matrix is D^T D.
    let mut d = DMatrix::<f64>::zeros(n - 2, n);
    for i in 0..n - 2 {
        d[(i, i)] = 1.0;
        d[(i, i + 1)] = -2.0;
        d[(i, i + 2)] = 1.0;
    }
    let dtd = d.transpose() * &d;
    let identity = DMatrix::<f64>::identity(n, n);
    let a = identity + dtd * lambda;

    let y = DVector::from_row_slice(series);
    match a.lu().solve(&y) {
        Some(trend) => trend.iter().copied().collect(),
        None => series.to_vec(),
    }
}

/// A scalar random-walk Kalman filter: state `r_star` evolves as a random
/// walk with variance `process_var`, observed (with noise `obs_var`) through
/// the HP-filtered real-rate series. Returns the filtered `r_star` path.
pub struct ScalarKalmanFilter {
    pub process_var: f64,
    pub obs_var: f64,
}

impl ScalarKalmanFilter {
    pub fn new(process_var: f64, obs_var: f64) -> Self {
        Self { process_var, obs_var }
    }

    pub fn filter(&self, observations: &[f64]) -> Vec<f64> {
        if observations.is_empty() {
            return Vec::new();
        }
        let mut estimate = observations[0];
        let mut error_var = self.obs_var;
        let mut path = Vec::with_capacity(observations.len());
        path.push(estimate);

        for &z in &observations[1..] {
            // Predict.
            let predicted_estimate = estimate;
            let predicted_error_var = error_var + self.process_var;

            // Update.
            let kalman_gain = predicted_error_var / (predicted_error_var + self.obs_var);
            estimate = predicted_estimate + kalman_gain * (z - predicted_estimate);
            error_var = (1.0 - kalman_gain) * predicted_error_var;

            path.push(estimate);
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hp_filter_smooths_noisy_series() {
        let series: Vec<f64> = (0..60).map(|i| (i as f64 * 0.1).sin() + if i % 2 == 0 { 0.05 } else { -0.05 }).collect();
        let trend = hp_filter(&series, 1600.0);
        assert_eq!(trend.len(), series.len());
        let raw_var: f64 = {
            let m = series.iter().sum::<f64>() / series.len() as f64;
            series.iter().map(|x| (x - m).powi(2)).sum::<f64>()
        };
        let resid_var: f64 = series.iter().zip(&trend).map(|(y, t)| (y - t).powi(2)).sum();
        assert!(resid_var < raw_var, "trend should explain some variance");
    }

    #[test]
    fn kalman_filter_converges_toward_constant_signal() {
        let observations = vec![5.0, 5.1, 4.9, 5.2, 4.8, 5.0, 5.1, 5.0];
        let kf = ScalarKalmanFilter::new(0.01, 0.2);
        let path = kf.filter(&observations);
        assert_eq!(path.len(), observations.len());
        assert!((path.last().unwrap() - 5.0).abs() < 0.3);
    }
}
