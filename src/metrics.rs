use ndarray::{ArrayView1, Zip};

/// Compute accuracy of the predicted labels `y_pred` to the correct labels `y_true`.
/// An empty set of labels has accuracy 0. Panics if the lengths differ.
pub fn accuracy<Label>(y_true: ArrayView1<Label>, y_pred: ArrayView1<Label>) -> f64
where
    Label: PartialEq,
{
    if y_true.is_empty() {
        return 0.0;
    }
    let n_corrects = Zip::from(&y_true)
        .and(&y_pred)
        .fold(0usize, |count, t, p| if t == p { count + 1 } else { count });
    n_corrects as f64 / y_true.len() as f64
}

/// Construct confusion matrix from `y_true` and `y_pred`.
/// An item in i-th row and j-th column is the number of examples of class i predicted as class j.
/// Labels outside `0..num_classes` are not counted.
pub fn confusion_matrix(
    y_true: ArrayView1<usize>,
    y_pred: ArrayView1<usize>,
    num_classes: usize,
) -> Vec<Vec<usize>> {
    let mut matrix = vec![vec![0; num_classes]; num_classes];
    Zip::from(&y_true).and(&y_pred).for_each(|&t, &p| {
        if t < num_classes && p < num_classes {
            matrix[t][p] += 1;
        }
    });
    matrix
}
