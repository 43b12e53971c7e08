use ndarray::Zip;

use crate::{
    layer::{Linear, LinearGradient},
    optimizer::Optimizer,
};

/// Plain gradient descent with a fixed learning rate.
#[derive(Clone, Copy, Debug)]
pub struct GradientDescent {
    learning_rate: f64,
}

impl GradientDescent {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}

impl Optimizer for GradientDescent {
    fn update(&self, layer: &mut Linear, gradient: &LinearGradient) {
        Zip::from(layer.weight_mut())
            .and(&gradient.weight)
            .for_each(|w, g| *w -= self.learning_rate * g);
        Zip::from(layer.bias_mut())
            .and(&gradient.bias)
            .for_each(|b, g| *b -= self.learning_rate * g);
    }
}
