//! Batches and shape helpers.
//!
//! All batched tensors are `ndarray` arrays with shape `(batch_size, embedding_dim)`.
//! Masks may have any shape that broadcasts to that, e.g. `(batch_size, embedding_dim)`,
//! `(1, embedding_dim)`, `(batch_size, 1)` or `(embedding_dim,)`.

use ndarray::{Array2, ArrayBase, ArrayView2, Data, Dimension};

use crate::{Error, Result};

/// Broadcast `mask` to `dim`, or fail with a shape error.
pub(crate) fn broadcast_mask<S, D>(
    mask: &ArrayBase<S, D>,
    dim: (usize, usize),
) -> Result<ArrayView2<'_, bool>>
where
    S: Data<Elem = bool>,
    D: Dimension,
{
    mask.broadcast(dim)
        .ok_or_else(|| Error::shape_mismatch("mask", &[dim.0, dim.1], mask.shape()))
}

/// Fail unless `labels` has exactly the shape of `logits`.
pub(crate) fn check_same_shape(logits: &Array2<f32>, labels: &Array2<f32>) -> Result<()> {
    if logits.dim() != labels.dim() {
        return Err(Error::shape_mismatch(
            "labels",
            logits.shape(),
            labels.shape(),
        ));
    }
    Ok(())
}

/// One training/evaluation batch: inputs (X), labels (Y) and an observation mask.
///
/// The mask is stored already broadcast to `(batch_size, embedding_dim)`.
#[derive(Debug, Clone)]
pub struct Batch {
    inputs: Array2<f32>,
    labels: Array2<f32>,
    mask: Array2<bool>,
}

impl Batch {
    /// Build a batch from inputs, labels and a broadcastable mask.
    pub fn new<S, D>(inputs: Array2<f32>, labels: Array2<f32>, mask: &ArrayBase<S, D>) -> Result<Self>
    where
        S: Data<Elem = bool>,
        D: Dimension,
    {
        if inputs.nrows() == 0 {
            return Err(Error::InvalidData("batch must not be empty".to_owned()));
        }
        if inputs.ncols() == 0 {
            return Err(Error::InvalidData("embedding_dim must be > 0".to_owned()));
        }
        check_same_shape(&inputs, &labels)?;
        let mask = broadcast_mask(mask, inputs.dim())?.to_owned();

        Ok(Self {
            inputs,
            labels,
            mask,
        })
    }

    /// Reconstruction batch: the labels are the inputs themselves.
    pub fn reconstruction<S, D>(inputs: Array2<f32>, mask: &ArrayBase<S, D>) -> Result<Self>
    where
        S: Data<Elem = bool>,
        D: Dimension,
    {
        let labels = inputs.clone();
        Self::new(inputs, labels, mask)
    }

    /// Reconstruction batch with every entry observed.
    pub fn fully_observed(inputs: Array2<f32>) -> Result<Self> {
        let mask = Array2::from_elem(inputs.raw_dim(), true);
        Self::reconstruction(inputs, &mask)
    }

    #[inline]
    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.inputs.nrows()
    }

    #[inline]
    /// Always false: empty batches are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    #[inline]
    pub fn embedding_dim(&self) -> usize {
        self.inputs.ncols()
    }

    #[inline]
    pub fn inputs(&self) -> &Array2<f32> {
        &self.inputs
    }

    #[inline]
    pub fn labels(&self) -> &Array2<f32> {
        &self.labels
    }

    #[inline]
    /// The mask, broadcast to `(len, embedding_dim)`.
    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    /// Number of observed (masked-in) entries.
    pub fn observed(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }
}
