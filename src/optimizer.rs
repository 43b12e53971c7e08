mod gradient_descent;

use crate::layer::{Linear, LinearGradient};

pub use gradient_descent::GradientDescent;

/// Trait to abstract parameter update rules.
pub trait Optimizer {
    fn update(&self, layer: &mut Linear, gradient: &LinearGradient);
}
