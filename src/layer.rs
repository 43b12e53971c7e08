use ndarray::{Array, Array1, Array2, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis};
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use crate::error::{Error, Result};

/// Weight and bias of one affine layer.
/// `weight` has shape (output_dim, input_dim) and `bias` has length output_dim.
#[derive(Clone, Debug, PartialEq)]
pub struct Linear {
    weight: Array2<f64>,
    bias: Array1<f64>,
}

/// Gradient of the loss with respect to one [`Linear`] layer. Shapes mirror the layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradient {
    pub weight: Array2<f64>,
    pub bias: Array1<f64>,
}

impl LinearGradient {
    pub fn zeros_like(layer: &Linear) -> Self {
        Self {
            weight: Array2::zeros(layer.weight.raw_dim()),
            bias: Array1::zeros(layer.bias.raw_dim()),
        }
    }

    /// True if the shapes match `layer`'s parameters.
    pub fn fits(&self, layer: &Linear) -> bool {
        self.weight.dim() == layer.weight.dim() && self.bias.len() == layer.bias.len()
    }
}

impl Linear {
    /// Glorot uniform initialization scaled by 4 for logistic units, zero bias.
    pub fn new<R: Rng + ?Sized>(input_dim: usize, output_dim: usize, rng: &mut R) -> Self {
        let bound = (6.0 / (input_dim + output_dim) as f64).sqrt();
        let weight =
            Array::random_using((output_dim, input_dim), Uniform::new(-bound, bound), rng) * 4.0;
        let bias = Array1::zeros(output_dim);
        Self { weight, bias }
    }

    pub fn with_weights(weight: Array2<f64>, bias: Array1<f64>) -> Result<Self> {
        if weight.nrows() != bias.len() {
            return Err(Error::Config(format!(
                "weight has {} rows but bias has {} entries",
                weight.nrows(),
                bias.len()
            )));
        }
        Ok(Self { weight, bias })
    }

    pub fn input_dim(&self) -> usize {
        self.weight.ncols()
    }

    pub fn output_dim(&self) -> usize {
        self.weight.nrows()
    }

    pub fn weight(&self) -> &Array2<f64> {
        &self.weight
    }

    pub fn bias(&self) -> &Array1<f64> {
        &self.bias
    }

    // Views keep the parameter shapes fixed.
    pub fn weight_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.weight.view_mut()
    }

    pub fn bias_mut(&mut self) -> ArrayViewMut1<'_, f64> {
        self.bias.view_mut()
    }

    /// Pre-activation `input · Wᵗ + b` for a (batch_size, input_dim) batch.
    pub fn forward(&self, input: ArrayView2<f64>) -> Result<Array2<f64>> {
        if input.ncols() != self.input_dim() {
            return Err(Error::shape("layer input", self.input_dim(), input.ncols()));
        }
        Ok(input.dot(&self.weight.t()) + &self.bias)
    }

    /// Gradients given this layer's error signal and the input it received in the forward pass.
    /// Both are averaged over the batch.
    pub fn gradient(&self, error: ArrayView2<f64>, layer_input: ArrayView2<f64>) -> LinearGradient {
        let batch_size = error.nrows() as f64;
        LinearGradient {
            weight: error.t().dot(&layer_input) / batch_size,
            bias: error.sum_axis(Axis(0)) / batch_size,
        }
    }

    /// Project an error signal back onto this layer's input: `error · W`.
    pub fn back_project(&self, error: ArrayView2<f64>) -> Array2<f64> {
        error.dot(&self.weight)
    }
}
