//! Metrics.
//!
//! Metrics are evaluation helpers (they do not participate in backprop).
//!
//! Reconstruction quality is measured with a rounding tolerance: a prediction counts
//! as correct when `round(prediction - label) == 0`. Rounding is half-to-even, so a
//! difference of exactly `0.5` or `-0.5` rounds to zero and counts as correct, while
//! `1.5` rounds to `2` and does not.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use ndarray::{Array, Array2, ArrayBase, Data, Dimension, Zip};

use crate::data::{broadcast_mask, check_same_shape};
use crate::{Error, Result};

/// `1 - |sign(round(a - b))|` for a single pair of values.
///
/// Returns `1.0` when `a` and `b` differ by less than the rounding tolerance,
/// `0.0` otherwise, and NaN if either input is NaN.
#[inline]
pub fn almost_equal_value(a: f32, b: f32) -> f32 {
    1.0 - sign((a - b).round_ties_even()).abs()
}

/// Element-wise [`almost_equal_value`] over two arrays of identical shape.
pub fn almost_equal<S1, S2, D>(a: &ArrayBase<S1, D>, b: &ArrayBase<S2, D>) -> Result<Array<f32, D>>
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = f32>,
    D: Dimension,
{
    if a.shape() != b.shape() {
        return Err(Error::shape_mismatch("almost_equal rhs", a.shape(), b.shape()));
    }
    Ok(Zip::from(a).and(b).map_collect(|&x, &y| almost_equal_value(x, y)))
}

/// Masked reconstruction accuracy counts.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Evaluation {
    /// Masked entries where `almost_equal(logits, labels) == 1`.
    pub correct: usize,
    /// Masked entries in total.
    pub total: usize,
}

impl Evaluation {
    /// `[correct, total]`.
    #[inline]
    pub fn to_array(self) -> [usize; 2] {
        [self.correct, self.total]
    }

    /// `correct / total`, or `None` when nothing is masked in.
    #[inline]
    pub fn accuracy(self) -> Option<f32> {
        if self.total == 0 {
            None
        } else {
            Some(self.correct as f32 / self.total as f32)
        }
    }
}

/// Count masked entries reconstructed within the rounding tolerance.
///
/// `labels` must have the shape of `logits`; `mask` must broadcast to it. `total` counts
/// the true entries of the broadcast mask, so `correct <= total` always holds.
pub fn evaluate<S, D>(
    logits: &Array2<f32>,
    labels: &Array2<f32>,
    mask: &ArrayBase<S, D>,
) -> Result<Evaluation>
where
    S: Data<Elem = bool>,
    D: Dimension,
{
    check_same_shape(logits, labels)?;
    let mask = broadcast_mask(mask, logits.dim())?;

    let mut eval = Evaluation::default();
    Zip::from(logits)
        .and(labels)
        .and(&mask)
        .for_each(|&y, &t, &m| {
            if m {
                eval.total += 1;
                if almost_equal_value(y, t) == 1.0 {
                    eval.correct += 1;
                }
            }
        });
    Ok(eval)
}

/// `sign` with `sign(±0) == 0` and NaN passed through (unlike `f32::signum`).
#[inline]
fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else if x.is_nan() {
        f32::NAN
    } else {
        0.0
    }
}
