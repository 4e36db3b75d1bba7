//! L2-regularized logistic regression fitted by batch gradient descent

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::{check_features, check_training_data, sigmoid, ModelError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Inverse regularization strength
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub learning_rate: f64,
    coefficients: Option<Vec<f64>>,
    intercept: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
            coefficients: None,
            intercept: 0.0,
        }
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Minimize `mean(log_loss) + ||w||^2 / (2 * C * n)`; the intercept is
    /// not penalized
    pub fn fit(&mut self, x: &Array2<f64>, y: &[f64]) -> Result<(), ModelError> {
        check_training_data(x, y)?;

        let n_samples = x.nrows() as f64;
        let y = Array1::from_vec(y.to_vec());
        let alpha = 1.0 / (self.c * n_samples);

        let mut weights = Array1::<f64>::zeros(x.ncols());
        let mut bias = 0.0;

        for _ in 0..self.max_iter {
            let linear = x.dot(&weights) + bias;
            let predictions = linear.mapv(sigmoid);

            let errors = &predictions - &y;
            let dw = x.t().dot(&errors) / n_samples + alpha * &weights;
            let db = errors.sum() / n_samples;

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - self.learning_rate * dw;
            bias -= self.learning_rate * db;
        }

        self.coefficients = Some(weights.to_vec());
        self.intercept = bias;
        Ok(())
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, ModelError> {
        let coefficients = self.coefficients.as_ref().ok_or(ModelError::NotFitted)?;
        check_features(x, coefficients.len())?;

        let w = Array1::from_vec(coefficients.clone());
        Ok(x.dot(&w).mapv(|z| sigmoid(z + self.intercept)).to_vec())
    }

    pub fn coefficients(&self) -> Option<&[f64]> {
        self.coefficients.as_deref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_separable_data_learns_positive_weight() {
        let x = array![[-2.0], [-1.5], [-1.0], [1.0], [1.5], [2.0]];
        let y = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();

        assert!(model.coefficients().unwrap()[0] > 0.0);
        let proba = model.predict_proba(&x).unwrap();
        assert!(proba[0] < 0.5 && proba[5] > 0.5);
        assert!(proba.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_stronger_penalty_shrinks_weights() {
        let x = array![[-2.0], [-1.5], [-1.0], [1.0], [1.5], [2.0]];
        let y = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut loose = LogisticRegression::new();
        loose.fit(&x, &y).unwrap();
        let mut tight = LogisticRegression::new().with_c(0.01);
        tight.fit(&x, &y).unwrap();

        let w_loose = loose.coefficients().unwrap()[0];
        let w_tight = tight.coefficients().unwrap()[0];
        assert!(w_tight > 0.0 && w_tight < w_loose);
    }

    #[test]
    fn test_unfitted_model_errors() {
        let model = LogisticRegression::new();
        assert_eq!(
            model.predict_proba(&array![[1.0]]),
            Err(ModelError::NotFitted)
        );
    }

    #[test]
    fn test_wrong_width_errors() {
        let x = array![[-1.0, 0.0], [1.0, 0.0]];
        let mut model = LogisticRegression::new().with_max_iter(10);
        model.fit(&x, &[0.0, 1.0]).unwrap();
        assert!(matches!(
            model.predict_proba(&array![[1.0]]),
            Err(ModelError::ShapeMismatch { .. })
        ));
    }
}
