use nalgebra::{DMatrix, DVector};

/// A BEER-style regression frame: one target series plus N named predictor
/// series, aligned by row index (most recent row last). Rows with any
/// missing value across the *retained* predictors are dropped before
/// fitting.
///
/// The critical discipline from the design: `design_matrix` is the single
/// place that builds the intercept-plus-predictor matrix, called
/// identically at fit time (over all retained rows) and at predict time
/// (over the single most recent row) — so a predictor that gets dropped
/// for insufficient coverage is dropped consistently on both sides and a
/// shape mismatch between training and prediction cannot occur.
#[derive(Debug, Clone)]
pub struct OlsFrame {
    pub target: Vec<Option<f64>>,
    pub predictors: Vec<(String, Vec<Option<f64>>)>,
}

#[derive(Debug, Clone)]
pub struct FittedOls {
    pub retained_predictors: Vec<String>,
    pub coefficients: Vec<f64>,
    pub n_obs: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OlsError {
    InsufficientPredictors,
    InsufficientRows,
    Singular,
}

/// Minimum fraction of rows a predictor must have a value in to be retained
/// for fitting, before the row-wise any-missing drop.
const MIN_COVERAGE: f64 = 0.5;

impl OlsFrame {
    fn n_rows(&self) -> usize {
        self.target.len()
    }

    fn retained_predictor_names(&self) -> Vec<String> {
        let n = self.n_rows().max(1);
        self.predictors
            .iter()
            .filter(|(_, values)| {
                let present = values.iter().filter(|v| v.is_some()).count();
                (present as f64 / n as f64) >= MIN_COVERAGE
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Build the intercept + retained-predictor design matrix for the given
    /// row indices, in the locked column order `[intercept, predictor...]`.
    fn design_matrix(&self, retained: &[String], rows: &[usize]) -> DMatrix<f64> {
        let ncols = 1 + retained.len();
        let mut m = DMatrix::<f64>::zeros(rows.len(), ncols);
        for (r, &row_idx) in rows.iter().enumerate() {
            m[(r, 0)] = 1.0;
            for (c, name) in retained.iter().enumerate() {
                let series = &self.predictors.iter().find(|(n, _)| n == name).unwrap().1;
                m[(r, 1 + c)] = series[row_idx].expect("row pre-filtered for completeness");
            }
        }
        m
    }

    fn complete_rows(&self, retained: &[String]) -> Vec<usize> {
        (0..self.n_rows())
            .filter(|&i| {
                self.target[i].is_some()
                    && retained.iter().all(|name| {
                        self.predictors
                            .iter()
                            .find(|(n, _)| n == name)
                            .map(|(_, v)| v[i].is_some())
                            .unwrap_or(false)
                    })
            })
            .collect()
    }

    /// Fit OLS with intercept over all complete rows; returns the fitted
    /// coefficients in `[intercept, predictor...]` order.
    pub fn fit(&self) -> Result<FittedOls, OlsError> {
        let retained = self.retained_predictor_names();
        if retained.len() < 2 {
            return Err(OlsError::InsufficientPredictors);
        }
        let rows = self.complete_rows(&retained);
        if rows.len() < retained.len() + 2 {
            return Err(OlsError::InsufficientRows);
        }

        let x = self.design_matrix(&retained, &rows);
        let y = DVector::from_iterator(rows.len(), rows.iter().map(|&i| self.target[i].unwrap()));

        let xt = x.transpose();
        let xtx = &xt * &x;
        let xtx_inv = xtx.try_inverse().ok_or(OlsError::Singular)?;
        let beta = xtx_inv * &xt * y;

        Ok(FittedOls {
            retained_predictors: retained,
            coefficients: beta.iter().copied().collect(),
            n_obs: rows.len(),
        })
    }

    /// Predict the most recent row using the same design-matrix construction
    /// as `fit` (identical column order, identical retained predictors).
    pub fn predict_latest(&self, fitted: &FittedOls) -> Option<f64> {
        let last = self.n_rows().checked_sub(1)?;
        let has_all = fitted
            .retained_predictors
            .iter()
            .all(|name| self.predictors.iter().find(|(n, _)| n == name).and_then(|(_, v)| v[last]).is_some());
        if !has_all {
            return None;
        }
        let x = self.design_matrix(&fitted.retained_predictors, &[last]);
        let beta = DVector::from_vec(fitted.coefficients.clone());
        Some((x.row(0) * beta)[(0, 0)])
    }

    pub fn latest_actual(&self) -> Option<f64> {
        self.target.last().copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> OlsFrame {
        // y = 1 + 2*x1 + 3*x2, x3 mostly missing (dropped for coverage).
        let n = 40;
        let mut target = Vec::new();
        let mut x1 = Vec::new();
        let mut x2 = Vec::new();
        let mut x3 = Vec::new();
        for i in 0..n {
            let a = i as f64 * 0.1;
            let b = (n - i) as f64 * 0.05;
            target.push(Some(1.0 + 2.0 * a + 3.0 * b));
            x1.push(Some(a));
            x2.push(Some(b));
            x3.push(if i < 5 { Some(a) } else { None });
        }
        OlsFrame {
            target,
            predictors: vec![
                ("x1".to_string(), x1),
                ("x2".to_string(), x2),
                ("x3".to_string(), x3),
            ],
        }
    }

    #[test]
    fn fits_and_predicts_linear_relationship() {
        let f = frame();
        let fitted = f.fit().unwrap();
        assert_eq!(fitted.retained_predictors, vec!["x1".to_string(), "x2".to_string()]);
        let predicted = f.predict_latest(&fitted).unwrap();
        let actual = f.latest_actual().unwrap();
        assert!((predicted - actual).abs() < 1e-6, "predicted={predicted} actual={actual}");
    }

    #[test]
    fn single_surviving_predictor_is_insufficient() {
        let mut f = frame();
        // Make x2 mostly missing too, leaving only x1 with enough coverage.
        f.predictors[1].1 = f.predictors[1].1.iter().enumerate().map(|(i, v)| if i < 3 { *v } else { None }).collect();
        let err = f.fit().unwrap_err();
        assert_eq!(err, OlsError::InsufficientPredictors);
    }
}
