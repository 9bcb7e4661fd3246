use ndarray::Array1;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::blob::Blob;
use crate::error::{LayerError, Result};
use crate::layers::LayerTrait;

/// One bottom element whose analytic and numeric gradients disagree
#[derive(Debug, Clone, PartialEq)]
pub struct GradientMismatch {
    /// Top blob and element used as the objective, `None` for the squared-sum objective
    pub objective: Option<(usize, usize)>,
    pub bottom_id: usize,
    pub index: usize,
    pub analytic: f64,
    pub numeric: f64,
}

#[derive(Debug, Clone, Copy)]
enum Objective {
    /// A single top element
    Element { top_id: usize, index: usize },
    /// Half the sum of squares of every top element
    HalfSquaredSum,
}

/// Numerical gradient checker for layers
///
/// Compares the bottom diffs a layer's backward pass produces against central
/// finite differences of its forward pass. An element fails when
/// `|analytic - numeric| > threshold * max(|analytic|, |numeric|, 1)`.
#[derive(Debug, Clone)]
pub struct GradientChecker {
    stepsize: f64,
    threshold: f64,
    seed: u64,
}

impl GradientChecker {
    pub fn new(stepsize: f64, threshold: f64, seed: u64) -> Self {
        GradientChecker { stepsize, threshold, seed }
    }

    pub fn stepsize(&self) -> f64 {
        self.stepsize
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fill a blob's data uniformly in `[low, high)` from the checker's seed
    pub fn fill_uniform(&self, blob: &mut Blob, low: f64, high: f64) -> Result<()> {
        if !(low < high) {
            return Err(LayerError::invalid_parameter(
                "range".to_string(),
                format!("low {} must be below high {}", low, high),
            ));
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        let values = Array1::random_using(blob.count(), Uniform::new(low, high), &mut rng);
        for (dst, &src) in blob.data_mut().iter_mut().zip(values.iter()) {
            *dst = src;
        }
        Ok(())
    }

    /// Check every top element as its own objective.
    ///
    /// `check_bottom` restricts the check to one bottom blob; `None` checks all.
    pub fn check_gradient_exhaustive<L: LayerTrait + ?Sized>(
        &self,
        layer: &mut L,
        bottom: &mut [Blob],
        top: &mut [Blob],
        check_bottom: Option<usize>,
    ) -> Result<Vec<GradientMismatch>> {
        layer.setup_blobs(bottom, top)?;
        let objectives: Vec<Objective> = top.iter()
            .enumerate()
            .flat_map(|(top_id, blob)| (0..blob.count()).map(move |index| Objective::Element { top_id, index }))
            .collect();
        let mismatches = self.check_objectives(layer, bottom, top, check_bottom, &objectives)?;
        debug!(
            stepsize = self.stepsize,
            threshold = self.threshold,
            objectives = objectives.len(),
            mismatches = mismatches.len(),
            "exhaustive gradient check finished"
        );
        Ok(mismatches)
    }

    /// Check with a single objective, half the sum of squares of all top elements
    pub fn check_gradient<L: LayerTrait + ?Sized>(
        &self,
        layer: &mut L,
        bottom: &mut [Blob],
        top: &mut [Blob],
        check_bottom: Option<usize>,
    ) -> Result<Vec<GradientMismatch>> {
        layer.setup_blobs(bottom, top)?;
        self.check_objectives(layer, bottom, top, check_bottom, &[Objective::HalfSquaredSum])
    }

    fn check_objectives<L: LayerTrait + ?Sized>(
        &self,
        layer: &mut L,
        bottom: &mut [Blob],
        top: &mut [Blob],
        check_bottom: Option<usize>,
        objectives: &[Objective],
    ) -> Result<Vec<GradientMismatch>> {
        if let Some(id) = check_bottom {
            if id >= bottom.len() {
                return Err(LayerError::invalid_parameter(
                    "check_bottom".to_string(),
                    format!("{} out of range for {} bottom blob(s)", id, bottom.len()),
                ));
            }
        }
        let checked: Vec<usize> = (0..bottom.len())
            .filter(|&id| check_bottom.map_or(true, |only| only == id))
            .collect();
        let propagate_down: Vec<bool> = (0..bottom.len()).map(|id| checked.contains(&id)).collect();

        // analytic[objective][slot] holds the bottom diff of a checked blob
        let mut analytic: Vec<Vec<Vec<f64>>> = Vec::with_capacity(objectives.len());
        for &objective in objectives {
            layer.forward(bottom, top)?;
            seed_top_diff(top, objective);
            layer.backward(top, &propagate_down, bottom)?;
            analytic.push(checked.iter().map(|&id| bottom[id].diff().to_vec()).collect());
        }

        let mut mismatches = Vec::new();
        for (slot, &bottom_id) in checked.iter().enumerate() {
            for index in 0..bottom[bottom_id].count() {
                let original = bottom[bottom_id].data()[index];

                bottom[bottom_id].data_mut()[index] = original + self.stepsize;
                layer.forward(bottom, top)?;
                let positive: Vec<f64> = objectives.iter().map(|&o| objective_value(top, o)).collect();

                bottom[bottom_id].data_mut()[index] = original - self.stepsize;
                layer.forward(bottom, top)?;
                let negative: Vec<f64> = objectives.iter().map(|&o| objective_value(top, o)).collect();

                bottom[bottom_id].data_mut()[index] = original;

                for (obj_idx, &objective) in objectives.iter().enumerate() {
                    let numeric = (positive[obj_idx] - negative[obj_idx]) / (2.0 * self.stepsize);
                    let computed = analytic[obj_idx][slot][index];
                    let scale = computed.abs().max(numeric.abs()).max(1.0);
                    if (computed - numeric).abs() > self.threshold * scale {
                        mismatches.push(GradientMismatch {
                            objective: match objective {
                                Objective::Element { top_id, index: top_index } => Some((top_id, top_index)),
                                Objective::HalfSquaredSum => None,
                            },
                            bottom_id,
                            index,
                            analytic: computed,
                            numeric,
                        });
                    }
                }
            }
        }
        Ok(mismatches)
    }
}

/// Value of the objective on the current top data
fn objective_value(top: &[Blob], objective: Objective) -> f64 {
    match objective {
        Objective::Element { top_id, index } => top[top_id].data()[index],
        Objective::HalfSquaredSum => {
            top.iter()
                .flat_map(|blob| blob.data().iter())
                .map(|&x| x * x)
                .sum::<f64>() / 2.0
        }
    }
}

/// Write the objective's gradient with respect to the top data into the top diffs
fn seed_top_diff(top: &mut [Blob], objective: Objective) {
    match objective {
        Objective::Element { top_id, index } => {
            for blob in top.iter_mut() {
                blob.fill_diff(0.0);
            }
            top[top_id].diff_mut()[index] = 1.0;
        }
        Objective::HalfSquaredSum => {
            for blob in top.iter_mut() {
                let (data, diff) = blob.data_and_diff_mut();
                diff.copy_from_slice(data);
            }
        }
    }
}
