use std::vec;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_rand::rand::{rngs::StdRng, seq::index::sample, SeedableRng};

use crate::error::{Error, Result};

/// Sampler produces a vector of indices in a dataset.
pub enum Sampler {
    Sequential(usize),
    Random(usize, StdRng),
}

impl Sampler {
    pub fn sample(&mut self) -> Vec<usize> {
        match self {
            Self::Sequential(size) => (0..*size).collect(),
            Self::Random(size, rng) => sample(rng, *size, *size).into_vec(),
        }
    }
}

/// Batch yields a minibatch each time `Iterator::next()` is called.
/// This struct is created in each epoch in a train phase.
pub struct Batch<'a> {
    // `indices` should be an `Iterator` because we have to keep track of the current batch
    // indices.
    indices: vec::IntoIter<usize>,
    batch_size: usize,
    drop_last: bool,
    input: ArrayView2<'a, f64>,
    labels: ArrayView1<'a, usize>,
}

impl<'a> Batch<'a> {
    pub fn new(
        indices: Vec<usize>,
        batch_size: usize,
        input: ArrayView2<'a, f64>,
        labels: ArrayView1<'a, usize>,
    ) -> Self {
        Self {
            indices: indices.into_iter(),
            batch_size,
            drop_last: false,
            input,
            labels,
        }
    }

    /// If `drop_last` is true, discard last minibatch whose size is smaller than
    /// `self.batch_size`.
    pub fn drop_last(self, drop_last: bool) -> Self {
        Self { drop_last, ..self }
    }

    fn should_drop_last(&self, indices: &[usize]) -> bool {
        self.drop_last && indices.len() != self.batch_size
    }
}

impl<'a> Iterator for Batch<'a> {
    type Item = (Array2<f64>, Array1<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        let indices = self
            .indices
            .by_ref()
            .take(self.batch_size)
            .collect::<Vec<_>>();

        if indices.is_empty() || self.should_drop_last(&indices) {
            None
        } else {
            Some((
                self.input.select(Axis(0), &indices),
                self.labels.select(Axis(0), &indices),
            ))
        }
    }
}

/// DataLoader wraps a labelled training set.
pub struct DataLoader {
    sampler: Sampler,
    input: Array2<f64>,
    labels: Array1<usize>,
}

impl DataLoader {
    pub fn new(input: Array2<f64>, labels: Array1<usize>) -> Result<Self> {
        if input.nrows() != labels.len() {
            return Err(Error::shape("labels", input.nrows(), labels.len()));
        }
        Ok(Self {
            sampler: Sampler::Sequential(input.nrows()),
            input,
            labels,
        })
    }

    pub fn size(&self) -> usize {
        self.input.nrows()
    }

    pub fn input(&self) -> ArrayView2<'_, f64> {
        self.input.view()
    }

    pub fn labels(&self) -> ArrayView1<'_, usize> {
        self.labels.view()
    }

    /// If enabled, generate minibatches in a random order drawn from `seed`.
    pub fn shuffle(mut self, seed: u64) -> Self {
        self.sampler = Sampler::Random(self.size(), StdRng::seed_from_u64(seed));
        self
    }

    /// Create a minibatch generator. This is intended to be called each epoch.
    pub fn batch(&mut self, batch_size: usize) -> Batch<'_> {
        Batch::new(
            self.sampler.sample(),
            batch_size,
            self.input.view(),
            self.labels.view(),
        )
    }
}
