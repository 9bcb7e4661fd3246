//! Shaped data/gradient buffers exchanged between a layer and its host.
//!
//! A [`Blob`] pairs a value buffer (`data`) with a gradient buffer (`diff`)
//! of the same shape. Both are stored flat in row-major order, so a blob of
//! shape `(1, C, 4, 1)` lays class `c`'s four values out at `4*c..4*c+4`.

use crate::error::{LayerError, Result};

/// N-dimensional buffer pair owned by the host and lent to layers per call
#[derive(Clone, Debug, PartialEq)]
pub struct Blob {
    shape: Vec<usize>,
    data: Vec<f64>,
    diff: Vec<f64>,
}

impl Blob {
    /// Create a zero-filled blob with the given shape
    pub fn new(shape: &[usize]) -> Self {
        let count = shape.iter().product();
        Blob {
            shape: shape.to_vec(),
            data: vec![0.0; count],
            diff: vec![0.0; count],
        }
    }

    /// Create a blob from existing values; the diff starts at zero
    pub fn from_data(shape: &[usize], data: Vec<f64>) -> Result<Self> {
        let count: usize = shape.iter().product();
        if data.len() != count {
            return Err(LayerError::dimension_mismatch(
                format!("{} values for shape {:?}", count, shape),
                format!("{} values", data.len()),
            ));
        }
        Ok(Blob {
            shape: shape.to_vec(),
            diff: vec![0.0; count],
            data,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Extent of a single axis, `None` when the blob has fewer axes
    pub fn shape_at(&self, axis: usize) -> Option<usize> {
        self.shape.get(axis).copied()
    }

    pub fn num_axes(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements
    pub fn count(&self) -> usize {
        self.data.len()
    }

    /// Change the shape. Contents are kept when the element count is
    /// unchanged and reset to zero otherwise.
    pub fn reshape(&mut self, shape: &[usize]) {
        if self.shape == shape {
            return;
        }
        let count: usize = shape.iter().product();
        if count != self.data.len() {
            self.data = vec![0.0; count];
            self.diff = vec![0.0; count];
        }
        self.shape = shape.to_vec();
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn diff(&self) -> &[f64] {
        &self.diff
    }

    pub fn diff_mut(&mut self) -> &mut [f64] {
        &mut self.diff
    }

    /// Borrow the values immutably and the gradient mutably at the same time
    pub fn data_and_diff_mut(&mut self) -> (&[f64], &mut [f64]) {
        (&self.data, &mut self.diff)
    }

    pub fn fill_data(&mut self, value: f64) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    pub fn fill_diff(&mut self, value: f64) {
        self.diff.iter_mut().for_each(|x| *x = value);
    }
}

impl Default for Blob {
    /// An empty blob with a single zero-length axis
    fn default() -> Self {
        Blob::new(&[0])
    }
}
