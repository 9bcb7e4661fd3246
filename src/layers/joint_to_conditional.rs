use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};
use tracing::{debug, trace, warn};

use super::traits::Layer as LayerTrait;
use crate::blob::Blob;
use crate::config::{JointToConditionalParameter, DEFAULT_PARALLEL_THRESHOLD};
use crate::debug::numerical_check::{check_blob_data, check_blob_diff};
use crate::error::{LayerError, Result};
use crate::ops::{conditional, DEFAULT_EPSILON};

pub const LAYER_TYPE: &str = "JointToConditional";

const NUM_BOTTOM: usize = 1;
const NUM_TOP: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
enum LayerState {
    Unconfigured,
    Configured { num_classes: usize },
}

/// Joint-to-Conditional Layer
///
/// Takes one bottom holding a 2x2 joint table per class, `(q00, q01, q10, q11)`
/// at offsets `4*c..4*c+4`, and produces four tops with one conditional per
/// class: `p00 = q00/(q00+q10)`, `p01 = q01/(q01+q11)`, `p10 = q10/(q00+q10)`
/// and `p11 = q11/(q01+q11)`, each denominator offset by `epsilon`.
///
/// The bottom must hold exactly `4 * C` values where `C` is its second axis.
/// Every top is shaped `(N, C, 1, 1)` with `N` the bottom's first axis.
#[derive(Clone, Debug)]
pub struct JointToConditionalLayer {
    epsilon: f64,
    parallel_threshold: usize,
    check_finite: bool,
    state: LayerState,
}

impl JointToConditionalLayer {
    /// Create an unconfigured layer with the default epsilon
    pub fn new() -> Self {
        JointToConditionalLayer {
            epsilon: DEFAULT_EPSILON,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            check_finite: false,
            state: LayerState::Unconfigured,
        }
    }

    /// Create an unconfigured layer from its parameter block
    pub fn from_param(param: &JointToConditionalParameter) -> Result<Self> {
        param.validate()?;
        Ok(JointToConditionalLayer {
            epsilon: param.epsilon,
            parallel_threshold: param.parallel_threshold,
            check_finite: param.check_finite,
            state: LayerState::Unconfigured,
        })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    pub fn check_finite(&self) -> bool {
        self.check_finite
    }

    /// Class count recorded by the last successful setup
    pub fn num_classes(&self) -> Option<usize> {
        match self.state {
            LayerState::Unconfigured => None,
            LayerState::Configured { num_classes } => Some(num_classes),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.num_classes().is_some()
    }

    fn configured_classes(&self) -> Result<usize> {
        self.num_classes()
            .ok_or_else(|| LayerError::NotConfigured(LAYER_TYPE.to_string()))
    }

    fn check_blob_counts(num_bottom: usize, num_top: usize) -> Result<()> {
        if num_bottom != NUM_BOTTOM {
            return Err(LayerError::blob_count(LAYER_TYPE, "bottom", NUM_BOTTOM, num_bottom));
        }
        if num_top != NUM_TOP {
            return Err(LayerError::blob_count(LAYER_TYPE, "top", NUM_TOP, num_top));
        }
        Ok(())
    }

    fn use_parallel(&self, num_classes: usize) -> bool {
        num_classes >= self.parallel_threshold
    }
}

impl Default for JointToConditionalLayer {
    fn default() -> Self {
        Self::new()
    }
}

fn check_bottom_len(len: usize, num_classes: usize, what: &str) -> Result<()> {
    if len != num_classes * 4 {
        return Err(LayerError::dimension_mismatch(
            format!("{} with {} values (4 per class)", what, num_classes * 4),
            format!("{} values", len),
        ));
    }
    Ok(())
}

/// View a bottom buffer as one `[q00, q01, q10, q11]` row per class
fn joint_view(values: &[f64], num_classes: usize) -> Result<ArrayView2<'_, f64>> {
    check_bottom_len(values.len(), num_classes, "bottom")?;
    ArrayView2::from_shape((num_classes, 4), values)
        .map_err(|err| LayerError::dimension_mismatch(format!("({}, 4) bottom", num_classes), err.to_string()))
}

fn joint_view_mut(values: &mut [f64], num_classes: usize) -> Result<ArrayViewMut2<'_, f64>> {
    check_bottom_len(values.len(), num_classes, "bottom diff")?;
    ArrayViewMut2::from_shape((num_classes, 4), values)
        .map_err(|err| LayerError::dimension_mismatch(format!("({}, 4) bottom diff", num_classes), err.to_string()))
}

fn check_top_len(blob: &Blob, num_classes: usize) -> Result<()> {
    if blob.count() < num_classes {
        return Err(LayerError::dimension_mismatch(
            format!("top with at least {} values", num_classes),
            format!("{} values", blob.count()),
        ));
    }
    Ok(())
}

fn log_diff_range(idx: usize, diff: ArrayView1<'_, f64>) {
    let min = diff.iter().copied().fold(f64::INFINITY, f64::min);
    let max = diff.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    trace!(top = idx, min, max, "JointToConditional top diff range");
}

impl LayerTrait for JointToConditionalLayer {
    fn layer_type(&self) -> &'static str {
        LAYER_TYPE
    }

    fn setup(&mut self, bottom_shapes: &[&[usize]], num_top: usize) -> Result<Vec<Vec<usize>>> {
        Self::check_blob_counts(bottom_shapes.len(), num_top)?;

        let shape = bottom_shapes[0];
        if shape.len() < 2 {
            return Err(LayerError::dimension_mismatch(
                "bottom with at least 2 axes".to_string(),
                format!("shape {:?}", shape),
            ));
        }

        let num_classes = shape[1];
        let count: usize = shape.iter().product();
        if count != num_classes * 4 {
            return Err(LayerError::dimension_mismatch(
                format!("{} values (4 per class, {} classes)", num_classes * 4, num_classes),
                format!("{} values in shape {:?}", count, shape),
            ));
        }

        self.state = LayerState::Configured { num_classes };
        debug!(num_classes, "JointToConditional configured");

        let top_shape = vec![shape[0], num_classes, 1, 1];
        Ok(vec![top_shape; NUM_TOP])
    }

    fn forward(&self, bottom: &[Blob], top: &mut [Blob]) -> Result<()> {
        let num_classes = self.configured_classes()?;
        Self::check_blob_counts(bottom.len(), top.len())?;

        let joint = joint_view(bottom[0].data(), num_classes)?;
        for blob in top.iter() {
            check_top_len(blob, num_classes)?;
        }

        let outputs: Vec<ArrayViewMut1<'_, f64>> = top.iter_mut()
            .map(|blob| ArrayViewMut1::from(&mut blob.data_mut()[..num_classes]))
            .collect();
        let outputs: [ArrayViewMut1<'_, f64>; NUM_TOP] = outputs.try_into()
            .map_err(|v: Vec<_>| LayerError::blob_count(LAYER_TYPE, "top", NUM_TOP, v.len()))?;
        conditional::forward(joint, outputs, self.epsilon, self.use_parallel(num_classes));

        if self.check_finite {
            for (idx, issue) in check_blob_data(top) {
                warn!(top = idx, ?issue, "JointToConditional produced non-finite output");
            }
        }
        Ok(())
    }

    fn backward(&self, top: &[Blob], propagate_down: &[bool], bottom: &mut [Blob]) -> Result<()> {
        let num_classes = self.configured_classes()?;
        Self::check_blob_counts(bottom.len(), top.len())?;
        if propagate_down.len() != bottom.len() {
            return Err(LayerError::dimension_mismatch(
                format!("{} propagate_down flag(s)", bottom.len()),
                format!("{}", propagate_down.len()),
            ));
        }
        if !propagate_down[0] {
            return Ok(());
        }

        for blob in top {
            check_top_len(blob, num_classes)?;
        }
        let output_grads: Vec<ArrayView1<'_, f64>> = top.iter()
            .map(|blob| ArrayView1::from(&blob.diff()[..num_classes]))
            .collect();
        let output_grads: [ArrayView1<'_, f64>; NUM_TOP] = output_grads.try_into()
            .map_err(|v: Vec<_>| LayerError::blob_count(LAYER_TYPE, "top", NUM_TOP, v.len()))?;

        if tracing::enabled!(tracing::Level::TRACE) {
            for (idx, diff) in output_grads.iter().enumerate() {
                log_diff_range(idx, diff.view());
            }
        }

        let (data, diff) = bottom[0].data_and_diff_mut();
        let joint = joint_view(data, num_classes)?;
        let joint_grad = joint_view_mut(diff, num_classes)?;
        conditional::backward(joint, output_grads, joint_grad, self.epsilon, self.use_parallel(num_classes));

        if self.check_finite {
            for issue in check_blob_diff(&bottom[0]) {
                warn!(?issue, "JointToConditional produced non-finite gradient");
            }
        }
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn LayerTrait> {
        Box::new(self.clone())
    }
}
