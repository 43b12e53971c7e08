use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{Error, Result};

fn log_sum_exp_lane(lane: ArrayView1<f64>) -> f64 {
    let max_element = lane.fold(f64::NEG_INFINITY, |v, &w| v.max(w));
    if !max_element.is_finite() {
        return max_element;
    }
    max_element + lane.map(|v| (v - max_element).exp()).sum().ln()
}

/// Compute `log(sum(exp(x)))` along `axis` without overflowing.
/// The largest element of each lane is factored out before exponentiating.
pub fn log_sum_exp(x: ArrayView2<f64>, axis: Axis) -> Array1<f64> {
    x.map_axis(axis, log_sum_exp_lane)
}

/// Same as [`log_sum_exp`] but keeps the reduced axis with length 1, so that the result
/// broadcasts against `x`.
pub fn log_sum_exp_keepdims(x: ArrayView2<f64>, axis: Axis) -> Array2<f64> {
    log_sum_exp(x, axis).insert_axis(axis)
}

/// Encode class indices to one-hot rows as a matrix whose shape is (n_data, num_classes).
pub fn one_hot(labels: ArrayView1<usize>, num_classes: usize) -> Result<Array2<f64>> {
    let mut encoded = Array2::zeros((labels.len(), num_classes));
    for (mut row, &label) in encoded.rows_mut().into_iter().zip(labels.iter()) {
        if label >= num_classes {
            return Err(Error::LabelOutOfRange { label, num_classes });
        }
        row[label] = 1.0;
    }
    Ok(encoded)
}

/// Index of the largest element in each row.
/// Ties go to the lowest index and NaN never wins.
pub fn argmax_rows(x: ArrayView2<f64>) -> Array1<usize> {
    x.map_axis(Axis(1), |row| {
        // argmax of `row`
        row.iter()
            .enumerate()
            .fold(
                (0, f64::NEG_INFINITY),
                |(max_index, max_elem), (index, &elem)| {
                    if elem > max_elem {
                        (index, elem)
                    } else {
                        (max_index, max_elem)
                    }
                },
            )
            .0
    })
}
