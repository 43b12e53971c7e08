use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_rand::rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::error::{Error, Result};

/// Split a labelled dataset into train and test data after shuffling it with `seed`.
/// `test_ratio` is a ratio of the number of test data to the whole dataset.
/// Returns `(x_train, y_train, x_test, y_test)`.
pub fn train_test_split(
    x: ArrayView2<f64>,
    y: ArrayView1<usize>,
    test_ratio: f64,
    seed: u64,
) -> Result<(Array2<f64>, Array1<usize>, Array2<f64>, Array1<usize>)> {
    if x.nrows() != y.len() {
        return Err(Error::shape("labels", x.nrows(), y.len()));
    }
    if !(0.0..1.0).contains(&test_ratio) {
        return Err(Error::Config(format!(
            "test ratio must lie in [0, 1), got {}",
            test_ratio
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let n_trains = (x.nrows() as f64 * (1.0 - test_ratio)) as usize;

    let mut indices = (0..x.nrows()).collect::<Vec<_>>();
    indices.shuffle(&mut rng);
    let (train, test) = indices.split_at(n_trains);

    Ok((
        x.select(Axis(0), train),
        y.select(Axis(0), train),
        x.select(Axis(0), test),
        y.select(Axis(0), test),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::{arr1, Array};

    #[test]
    fn split_keeps_pairs_together() {
        let x = Array::linspace(0.0, 9.0, 10).insert_axis(Axis(1));
        let y = arr1(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let (x_train, y_train, x_test, y_test) =
            train_test_split(x.view(), y.view(), 0.3, 5).unwrap();

        assert_eq!(7, x_train.nrows());
        assert_eq!(3, x_test.nrows());
        for (row, &label) in x_train.rows().into_iter().zip(y_train.iter()) {
            assert_eq!(label as f64, row[0]);
        }
        for (row, &label) in x_test.rows().into_iter().zip(y_test.iter()) {
            assert_eq!(label as f64, row[0]);
        }
    }

    #[test]
    fn split_rejects_bad_ratio() {
        let x = Array::<f64, _>::zeros((2, 1));
        let y = arr1(&[0, 1]);
        assert!(train_test_split(x.view(), y.view(), 1.0, 0).is_err());
    }
}
