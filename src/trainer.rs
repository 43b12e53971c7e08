use ndarray::{ArrayView1, ArrayView2};
use tracing::{debug, info};

use crate::{
    config::MlpConfig,
    data::DataLoader,
    error::{Error, Result},
    metrics::accuracy,
    network::Mlp,
};

/// Loss and accuracy of a model on one dataset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub loss: f64,
    pub accuracy: f64,
}

/// Training-set metrics recorded after each epoch. `epoch` counts from 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpochReport {
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
}

/// Runs epochs of mini-batch gradient descent.
pub struct Trainer {
    num_epochs: usize,
    batch_size: usize,
}

impl Trainer {
    pub fn new(config: &MlpConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            num_epochs: config.num_epochs,
            batch_size: config.batch_size,
        })
    }

    /// Update `model` on every minibatch of `loader` for each epoch, then measure it on the
    /// whole training set.
    pub fn train(&self, model: &mut Mlp, loader: &mut DataLoader) -> Result<Vec<EpochReport>> {
        if loader.size() == 0 {
            return Err(Error::EmptyBatch);
        }

        let mut reports = Vec::with_capacity(self.num_epochs);
        for epoch in 1..=self.num_epochs {
            let mut n_batches = 0;
            for (input, labels) in loader.batch(self.batch_size) {
                model.update(input.view(), labels.view())?;
                n_batches += 1;
            }
            debug!(epoch, n_batches, "applied minibatch updates");

            let evaluation = Self::evaluate(model, loader.input(), loader.labels())?;
            info!(
                epoch,
                loss = evaluation.loss,
                accuracy = evaluation.accuracy,
                "finished epoch"
            );
            reports.push(EpochReport {
                epoch,
                loss: evaluation.loss,
                accuracy: evaluation.accuracy,
            });
        }
        Ok(reports)
    }

    pub fn evaluate(
        model: &Mlp,
        input: ArrayView2<f64>,
        labels: ArrayView1<usize>,
    ) -> Result<Evaluation> {
        let loss = model.cross_entropy_loss(input, labels)?;
        let predictions = model.predict(input)?;
        Ok(Evaluation {
            loss,
            accuracy: accuracy(labels, predictions.view()),
        })
    }
}
