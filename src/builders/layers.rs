use crate::config::{JointToConditionalParameter, DEFAULT_PARALLEL_THRESHOLD};
use crate::error::{LayerError, Result};
use crate::layers::JointToConditionalLayer;
use crate::ops::DEFAULT_EPSILON;

/// Builder for JointToConditionalLayer
pub struct JointToConditionalLayerBuilder {
    epsilon: f64,
    parallel_threshold: usize,
    check_finite: bool,
}

impl JointToConditionalLayerBuilder {
    /// Create a new builder with the default settings
    pub fn new() -> Self {
        JointToConditionalLayerBuilder {
            epsilon: DEFAULT_EPSILON,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            check_finite: false,
        }
    }

    /// Set the term added to every denominator
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the class count from which the parallel kernels are used
    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Always use the parallel kernels
    pub fn always_parallel(self) -> Self {
        self.parallel_threshold(0)
    }

    /// Never use the parallel kernels
    pub fn serial(self) -> Self {
        self.parallel_threshold(usize::MAX)
    }

    /// Warn about NaN/Inf in outputs and gradients
    pub fn check_finite(mut self, check: bool) -> Self {
        self.check_finite = check;
        self
    }

    /// Build the layer
    pub fn build(self) -> Result<JointToConditionalLayer> {
        if self.epsilon <= 0.0 || !self.epsilon.is_finite() {
            return Err(LayerError::InvalidParameter {
                name: "epsilon".to_string(),
                reason: "Epsilon must be positive and finite".to_string(),
            });
        }

        JointToConditionalLayer::from_param(&JointToConditionalParameter {
            epsilon: self.epsilon,
            parallel_threshold: self.parallel_threshold,
            check_finite: self.check_finite,
        })
    }
}

impl Default for JointToConditionalLayerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
