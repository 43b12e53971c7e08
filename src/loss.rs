use ndarray::{ArrayView1, ArrayView2, Zip};

use crate::error::{Error, Result};

/// Mean negative log-likelihood of the true classes.
/// `log_probabilities` has shape (batch_size, num_classes), one normalized row per example.
pub fn cross_entropy(log_probabilities: ArrayView2<f64>, labels: ArrayView1<usize>) -> Result<f64> {
    let (batch_size, num_classes) = log_probabilities.dim();
    if batch_size == 0 {
        return Err(Error::EmptyBatch);
    }
    if labels.len() != batch_size {
        return Err(Error::shape("labels", batch_size, labels.len()));
    }
    if let Some(&label) = labels.iter().find(|&&label| label >= num_classes) {
        return Err(Error::LabelOutOfRange { label, num_classes });
    }

    let total = Zip::from(log_probabilities.rows())
        .and(&labels)
        .fold(0.0, |total, row, &label| total + row[label]);
    Ok(-total / batch_size as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2, Array2};

    fn prepare_log_probabilities() -> Array2<f64> {
        arr2(&[[0.5f64, 0.25, 0.25], [0.1, 0.2, 0.7]]).map(|p| p.ln())
    }

    #[test]
    fn compute_cross_entropy() {
        let log_probabilities = prepare_log_probabilities();
        let labels = arr1(&[0, 2]);
        let loss = cross_entropy(log_probabilities.view(), labels.view()).unwrap();
        assert_relative_eq!(-(0.5f64.ln() + 0.7f64.ln()) / 2.0, loss, epsilon = 1e-12);
    }

    #[test]
    fn certain_prediction_has_zero_loss() {
        let log_probabilities = arr2(&[[0.0, f64::NEG_INFINITY]]);
        let labels = arr1(&[0]);
        let loss = cross_entropy(log_probabilities.view(), labels.view()).unwrap();
        assert_relative_eq!(0.0, loss);
    }

    #[test]
    fn rejects_label_out_of_range() {
        let log_probabilities = prepare_log_probabilities();
        let labels = arr1(&[0, 3]);
        assert!(matches!(
            cross_entropy(log_probabilities.view(), labels.view()),
            Err(Error::LabelOutOfRange { label: 3, .. })
        ));
    }

    #[test]
    fn rejects_mismatched_label_count() {
        let log_probabilities = prepare_log_probabilities();
        let labels = arr1(&[0]);
        assert!(matches!(
            cross_entropy(log_probabilities.view(), labels.view()),
            Err(Error::Shape { .. })
        ));
    }
}
