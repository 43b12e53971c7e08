use std::ops::Index;
use std::slice;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_rand::rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, trace};

use crate::{
    activation::Sigmoid,
    config::MlpConfig,
    error::{Error, Result},
    layer::{Linear, LinearGradient},
    loss,
    numeric::{argmax_rows, log_sum_exp_keepdims, one_hot},
    optimizer::{GradientDescent, Optimizer},
};

/// Inputs fed into every layer during one forward pass: the raw batch followed by the output of
/// each sigmoid layer. Entry `i` is the input of layer `i`.
#[derive(Clone, Debug)]
pub struct ActivationCache {
    layer_inputs: Vec<Array2<f64>>,
}

impl ActivationCache {
    pub fn layer_inputs(&self) -> &[Array2<f64>] {
        &self.layer_inputs
    }

    pub fn len(&self) -> usize {
        self.layer_inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layer_inputs.is_empty()
    }
}

/// One gradient per layer, in forward order.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradients {
    layers: Vec<LinearGradient>,
}

impl Gradients {
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, LinearGradient> {
        self.layers.iter()
    }
}

impl Index<usize> for Gradients {
    type Output = LinearGradient;

    fn index(&self, index: usize) -> &LinearGradient {
        &self.layers[index]
    }
}

/// Multilayer perceptron: sigmoid hidden layers followed by a softmax output layer.
/// The gradients are derived by hand rather than by automatic differentiation.
#[derive(Clone, Debug)]
pub struct Mlp {
    layers: Vec<Linear>,
    optimizer: GradientDescent,
}

impl Mlp {
    /// Initialize parameters for `config.geometry` from a generator seeded with
    /// `config.random_seed`.
    pub fn new(config: &MlpConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.random_seed);
        let layers = config
            .geometry
            .windows(2)
            .map(|dims| Linear::new(dims[0], dims[1], &mut rng))
            .collect();
        debug!(
            geometry = ?config.geometry,
            learning_rate = config.learning_rate,
            "initialized perceptron"
        );
        Self::from_layers(layers, config.learning_rate)
    }

    /// Build a network from explicit layers. The last layer is the softmax output layer.
    pub fn from_layers(layers: Vec<Linear>, learning_rate: f64) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::Config("network needs at least one layer".to_string()));
        }
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(Error::Config(format!(
                "learning rate must be positive and finite, got {}",
                learning_rate
            )));
        }
        if let Some(index) = layers
            .iter()
            .position(|layer| layer.input_dim() == 0 || layer.output_dim() == 0)
        {
            return Err(Error::Config(format!(
                "layer {} has shape ({}, {}); every layer needs at least one input and one output",
                index,
                layers[index].output_dim(),
                layers[index].input_dim()
            )));
        }
        for (index, pair) in layers.windows(2).enumerate() {
            if pair[0].output_dim() != pair[1].input_dim() {
                return Err(Error::Config(format!(
                    "layer {} outputs {} features but layer {} expects {}",
                    index,
                    pair[0].output_dim(),
                    index + 1,
                    pair[1].input_dim()
                )));
            }
        }
        Ok(Self {
            layers,
            optimizer: GradientDescent::new(learning_rate),
        })
    }

    pub fn layers(&self) -> &[Linear] {
        &self.layers
    }

    pub fn input_dim(&self) -> usize {
        self.layers[0].input_dim()
    }

    pub fn num_classes(&self) -> usize {
        self.layers[self.layers.len() - 1].output_dim()
    }

    pub fn num_hidden_layers(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate()
    }

    fn check_input(&self, input: ArrayView2<f64>) -> Result<()> {
        if input.nrows() == 0 {
            return Err(Error::EmptyBatch);
        }
        if input.ncols() != self.input_dim() {
            return Err(Error::shape("input batch", self.input_dim(), input.ncols()));
        }
        Ok(())
    }

    fn check_labels(&self, input: ArrayView2<f64>, labels: ArrayView1<usize>) -> Result<()> {
        self.check_input(input)?;
        if labels.len() != input.nrows() {
            return Err(Error::shape("labels", input.nrows(), labels.len()));
        }
        let num_classes = self.num_classes();
        match labels.iter().find(|&&label| label >= num_classes) {
            Some(&label) => Err(Error::LabelOutOfRange { label, num_classes }),
            None => Ok(()),
        }
    }

    /// Log class-probabilities of shape (batch_size, num_classes) together with the input of
    /// every layer.
    pub fn log_forward(&self, input: ArrayView2<f64>) -> Result<(Array2<f64>, ActivationCache)> {
        self.check_input(input)?;
        let (output_layer, hidden_layers) = self
            .layers
            .split_last()
            .ok_or_else(|| Error::Config("network has no layers".to_string()))?;

        let mut layer_inputs = Vec::with_capacity(self.layers.len());
        let mut activation = input.to_owned();
        for layer in hidden_layers {
            let z = layer.forward(activation.view())?;
            layer_inputs.push(activation);
            activation = Sigmoid.compute(&z);
        }

        let z = output_layer.forward(activation.view())?;
        layer_inputs.push(activation);

        // Softmax in the log domain.
        let log_probabilities = &z - &log_sum_exp_keepdims(z.view(), Axis(1));
        Ok((log_probabilities, ActivationCache { layer_inputs }))
    }

    /// Mean negative log-probability of the true classes.
    pub fn cross_entropy_loss(
        &self,
        input: ArrayView2<f64>,
        labels: ArrayView1<usize>,
    ) -> Result<f64> {
        self.check_labels(input, labels)?;
        let (log_probabilities, _) = self.log_forward(input)?;
        loss::cross_entropy(log_probabilities.view(), labels)
    }

    /// Gradients of the mean cross-entropy with respect to every weight and bias.
    pub fn backpropagation(
        &self,
        input: ArrayView2<f64>,
        labels: ArrayView1<usize>,
    ) -> Result<Gradients> {
        self.check_labels(input, labels)?;
        let (log_probabilities, cache) = self.log_forward(input)?;
        let probabilities = log_probabilities.mapv(f64::exp);

        // Softmax with cross-entropy: d loss / d z = p - y.
        let mut error = probabilities - one_hot(labels, self.num_classes())?;

        let mut gradients = self
            .layers
            .iter()
            .map(LinearGradient::zeros_like)
            .collect::<Vec<_>>();
        for (index, layer) in self.layers.iter().enumerate().rev() {
            let layer_input = cache.layer_inputs[index].view();
            gradients[index] = layer.gradient(error.view(), layer_input);

            if index > 0 {
                // `layer_input` is the sigmoid output of the layer below.
                error = layer.back_project(error.view())
                    * Sigmoid.derivative_from_output(layer_input);
            }
        }

        trace!(batch_size = input.nrows(), "computed gradients");
        Ok(Gradients { layers: gradients })
    }

    /// Subtract `learning_rate * gradient` from every parameter.
    pub fn apply_gradients(&mut self, gradients: &Gradients) -> Result<()> {
        if gradients.len() != self.layers.len() {
            return Err(Error::shape("gradients", self.layers.len(), gradients.len()));
        }
        if let Some(index) = gradients
            .iter()
            .zip(self.layers.iter())
            .position(|(gradient, layer)| !gradient.fits(layer))
        {
            return Err(Error::shape(
                "gradient rows",
                self.layers[index].output_dim(),
                gradients[index].weight.nrows(),
            ));
        }

        for (layer, gradient) in self.layers.iter_mut().zip(gradients.iter()) {
            self.optimizer.update(layer, gradient);
        }
        Ok(())
    }

    /// One step of gradient descent on a batch.
    /// Parameters are left untouched when an error is returned.
    pub fn update(&mut self, input: ArrayView2<f64>, labels: ArrayView1<usize>) -> Result<()> {
        let gradients = self.backpropagation(input, labels)?;
        self.apply_gradients(&gradients)
    }

    /// Most probable class of each example.
    pub fn predict(&self, input: ArrayView2<f64>) -> Result<Array1<usize>> {
        let (log_probabilities, _) = self.log_forward(input)?;
        Ok(argmax_rows(log_probabilities.view()))
    }
}

#[cfg(test)]
mod tests {
    use crate::{assert_rel_eq_arr1, assert_rel_eq_arr2};

    use super::*;

    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};

    fn two_layer_network() -> Mlp {
        Mlp::new(&MlpConfig::new(vec![2, 3, 2], 0.1)).unwrap()
    }

    #[test]
    fn forward_rows_are_distributions() {
        let model = two_layer_network();
        let input = arr2(&[[0.0, 0.0], [1.0, 1.0]]);
        let (log_probabilities, cache) = model.log_forward(input.view()).unwrap();

        assert_eq!(&[2, 2], log_probabilities.shape());
        assert_rel_eq_arr1!(
            log_probabilities.mapv(f64::exp).sum_axis(Axis(1)),
            arr1(&[1.0, 1.0]),
            epsilon = 1e-12
        );

        assert_eq!(2, cache.len());
        assert_rel_eq_arr2!(cache.layer_inputs()[0], input);
        assert_eq!(&[2, 3], cache.layer_inputs()[1].shape());
        assert!(cache.layer_inputs()[1]
            .iter()
            .all(|&z| z > 0.0 && z < 1.0));
    }

    #[test]
    fn gradients_mirror_parameters() {
        let model = Mlp::new(&MlpConfig::new(vec![2, 3, 4, 2], 0.1)).unwrap();
        let input = arr2(&[[0.0, 0.0], [1.0, 1.0], [0.5, -1.0]]);
        let labels = arr1(&[0, 1, 1]);
        let gradients = model.backpropagation(input.view(), labels.view()).unwrap();

        assert_eq!(model.layers().len(), gradients.len());
        for (gradient, layer) in gradients.iter().zip(model.layers()) {
            assert_eq!(layer.weight().shape(), gradient.weight.shape());
            assert_eq!(layer.bias().shape(), gradient.bias.shape());
        }
    }

    #[test]
    fn single_layer_gradient_has_closed_form() {
        let weight = arr2(&[[0.2, -0.4, 0.1], [0.5, 0.3, -0.2], [-0.1, 0.0, 0.4]]);
        let bias = arr1(&[0.1, -0.1, 0.0]);
        let model = Mlp::from_layers(vec![Linear::with_weights(weight, bias).unwrap()], 0.1)
            .unwrap();
        assert_eq!(0, model.num_hidden_layers());

        let input = arr2(&[[1.0, 2.0, -1.0], [0.5, 0.0, 1.5]]);
        let labels = arr1(&[2, 0]);
        let gradients = model.backpropagation(input.view(), labels.view()).unwrap();

        let (log_probabilities, _) = model.log_forward(input.view()).unwrap();
        let error =
            log_probabilities.mapv(f64::exp) - one_hot(labels.view(), 3).unwrap();
        let expected_weight = error.t().dot(&input) / 2.0;
        let expected_bias = error.sum_axis(Axis(0)) / 2.0;

        assert_eq!(1, gradients.len());
        assert_rel_eq_arr2!(gradients[0].weight, expected_weight, epsilon = 1e-15);
        assert_rel_eq_arr1!(gradients[0].bias, expected_bias, epsilon = 1e-15);
    }

    #[test]
    fn update_moves_parameters_against_gradient() {
        let mut model = two_layer_network();
        let input = arr2(&[[0.0, 0.0], [1.0, 1.0]]);
        let labels = arr1(&[0, 1]);

        let before = model.layers().to_vec();
        let gradients = model.backpropagation(input.view(), labels.view()).unwrap();
        model.update(input.view(), labels.view()).unwrap();

        assert_eq!(2, gradients.len());
        for ((layer, old), gradient) in model.layers().iter().zip(&before).zip(gradients.iter()) {
            assert_rel_eq_arr2!(
                layer.weight().clone(),
                old.weight() - &(&gradient.weight * 0.1)
            );
            assert_rel_eq_arr1!(layer.bias().clone(), old.bias() - &(&gradient.bias * 0.1));
        }
    }

    #[test]
    fn loss_is_mean_negative_log_probability() {
        let model = two_layer_network();
        let input = arr2(&[[0.0, 0.0], [1.0, 1.0]]);
        let labels = arr1(&[0, 1]);
        let (log_probabilities, _) = model.log_forward(input.view()).unwrap();
        let expected = -(log_probabilities[[0, 0]] + log_probabilities[[1, 1]]) / 2.0;
        assert_relative_eq!(
            expected,
            model.cross_entropy_loss(input.view(), labels.view()).unwrap()
        );
    }

    #[test]
    fn predict_picks_most_probable_class() {
        // Output logits are [x, -x]: class 0 for positive inputs.
        let weight = arr2(&[[1.0], [-1.0]]);
        let model =
            Mlp::from_layers(vec![Linear::with_weights(weight, arr1(&[0.0, 0.0])).unwrap()], 1.0)
                .unwrap();
        let input = arr2(&[[2.0], [-0.5], [0.0]]);
        assert_eq!(arr1(&[0usize, 1, 0]), model.predict(input.view()).unwrap());
    }

    #[test]
    fn rejects_unchained_layers() {
        let mut rng = StdRng::seed_from_u64(0);
        let layers = vec![Linear::new(2, 3, &mut rng), Linear::new(4, 2, &mut rng)];
        let err = Mlp::from_layers(layers, 0.1).unwrap_err();
        assert!(err.is_config());
        assert!(Mlp::from_layers(Vec::new(), 0.1).unwrap_err().is_config());
    }

    #[test]
    fn rejects_zero_width_layers() {
        let no_classes =
            Linear::with_weights(Array2::<f64>::zeros((0, 2)), Array1::<f64>::zeros(0)).unwrap();
        let err = Mlp::from_layers(vec![no_classes], 0.1).unwrap_err();
        assert!(err.is_config());

        let empty_hidden =
            Linear::with_weights(Array2::<f64>::zeros((0, 2)), Array1::<f64>::zeros(0)).unwrap();
        let output =
            Linear::with_weights(Array2::<f64>::zeros((2, 0)), Array1::<f64>::zeros(2)).unwrap();
        let err = Mlp::from_layers(vec![empty_hidden, output], 0.1).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn rejects_bad_batches() {
        let mut model = two_layer_network();
        let before = model.layers().to_vec();

        let wide = arr2(&[[0.0, 0.0, 0.0]]);
        let err = model.log_forward(wide.view()).unwrap_err();
        assert!(matches!(err, Error::Shape { .. }));
        assert!(!err.is_config());

        let input = arr2(&[[0.0, 0.0], [1.0, 1.0]]);
        assert!(matches!(
            model.update(input.view(), arr1(&[0, 2]).view()),
            Err(Error::LabelOutOfRange { label: 2, .. })
        ));
        assert!(matches!(
            model.update(input.view(), arr1(&[0]).view()),
            Err(Error::Shape { .. })
        ));
        assert!(matches!(
            model.predict(Array2::<f64>::zeros((0, 2)).view()),
            Err(Error::EmptyBatch)
        ));
        assert_eq!(before, model.layers());
    }
}
