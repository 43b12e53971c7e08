use ndarray::{Array2, ArrayView2};

/// Logistic nonlinearity applied by every hidden layer.
pub struct Sigmoid;

impl Sigmoid {
    fn compute_one(x: &f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }

    pub fn compute(&self, x: &Array2<f64>) -> Array2<f64> {
        x.map(Sigmoid::compute_one)
    }

    /// Derivative expressed through the sigmoid's own output `z`: `z * (1 - z)`.
    pub fn derivative_from_output(&self, z: ArrayView2<f64>) -> Array2<f64> {
        z.map(|&w| w * (1.0 - w))
    }
}
