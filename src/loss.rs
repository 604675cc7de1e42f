//! Masked reconstruction loss.
//!
//! `L = 0.5 * sum over masked entries of (logits - labels)^2`
//!
//! Entries where the mask is false (e.g. unobserved ratings) contribute nothing to
//! either the loss or its gradient.

use ndarray::{Array2, ArrayBase, Data, Dimension, Zip};

use crate::data::{broadcast_mask, check_same_shape};
use crate::Result;

/// Masked L2 loss.
///
/// `labels` must have the shape of `logits`; `mask` must broadcast to it.
pub fn masked_l2<S, D>(
    logits: &Array2<f32>,
    labels: &Array2<f32>,
    mask: &ArrayBase<S, D>,
) -> Result<f32>
where
    S: Data<Elem = bool>,
    D: Dimension,
{
    check_same_shape(logits, labels)?;
    let mask = broadcast_mask(mask, logits.dim())?;

    let mut sum_sq = 0.0_f32;
    Zip::from(logits)
        .and(labels)
        .and(&mask)
        .for_each(|&y, &t, &m| {
            if m {
                let diff = y - t;
                sum_sq = diff.mul_add(diff, sum_sq);
            }
        });
    Ok(0.5 * sum_sq)
}

/// Masked L2 loss + gradient w.r.t. `logits`.
///
/// Returns the loss and `dL/d(logits) = (logits - labels) * mask`.
pub fn masked_l2_backward<S, D>(
    logits: &Array2<f32>,
    labels: &Array2<f32>,
    mask: &ArrayBase<S, D>,
) -> Result<(f32, Array2<f32>)>
where
    S: Data<Elem = bool>,
    D: Dimension,
{
    check_same_shape(logits, labels)?;
    let mask = broadcast_mask(mask, logits.dim())?;

    let mut sum_sq = 0.0_f32;
    let mut d_logits = Array2::zeros(logits.raw_dim());
    Zip::from(&mut d_logits)
        .and(logits)
        .and(labels)
        .and(&mask)
        .for_each(|d, &y, &t, &m| {
            if m {
                let diff = y - t;
                sum_sq = diff.mul_add(diff, sum_sq);
                *d = diff;
            }
        });
    Ok((0.5 * sum_sq, d_logits))
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    use crate::Error;

    #[test]
    fn loss_is_zero_when_equal() {
        let x = array![[1.0_f32, -2.0, 0.5], [3.0, 0.0, -1.0]];
        let mask = Array2::from_elem((2, 3), true);
        assert_eq!(masked_l2(&x, &x, &mask).unwrap(), 0.0);
    }

    #[test]
    fn all_false_mask_gives_zero_loss() {
        let logits = array![[10.0_f32, -4.0], [7.0, 1.0]];
        let labels = array![[0.0_f32, 0.0], [0.0, 0.0]];
        let mask = array![false];
        assert_eq!(masked_l2(&logits, &labels, &mask).unwrap(), 0.0);
    }

    #[test]
    fn only_masked_entries_count() {
        let logits = array![[1.0_f32, 3.0], [0.0, 5.0]];
        let labels = array![[2.0_f32, 1.0], [0.0, 0.0]];
        let mask = array![[true, true], [false, false]];
        // 0.5 * ((-1)^2 + 2^2) = 2.5
        let (loss, d) = masked_l2_backward(&logits, &labels, &mask).unwrap();
        assert!((loss - 2.5).abs() < 1e-6);
        assert_eq!(d, array![[-1.0, 2.0], [0.0, 0.0]]);
        assert_eq!(masked_l2(&logits, &labels, &mask).unwrap(), loss);
    }

    #[test]
    fn row_mask_broadcasts_over_batch() {
        let logits = array![[1.0_f32, 1.0], [1.0, 1.0]];
        let labels = array![[0.0_f32, 0.0], [0.0, 0.0]];
        let mask = array![true, false];
        assert!((masked_l2(&logits, &labels, &mask).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn shape_errors_are_reported() {
        let logits = Array2::<f32>::zeros((2, 3));
        let labels = Array2::<f32>::zeros((3, 2));
        let mask = Array2::from_elem((2, 3), true);
        assert!(matches!(
            masked_l2(&logits, &labels, &mask),
            Err(Error::InvalidShape(_))
        ));

        let bad_mask = Array2::from_elem((2, 2), true);
        assert!(matches!(
            masked_l2(&logits, &logits, &bad_mask),
            Err(Error::InvalidShape(_))
        ));
    }
}
