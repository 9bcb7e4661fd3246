//! Layer configuration as the graph runtime hands it over.
//!
//! ```rust
//! use joint_conditional::config::LayerParameter;
//!
//! let param = LayerParameter::from_json_str(r#"{
//!     "name": "cond",
//!     "type": "JointToConditional",
//!     "joint_to_conditional_param": { "parallel_threshold": 1024 }
//! }"#).unwrap();
//! assert_eq!(param.layer_type, "JointToConditional");
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LayerError, Result};
use crate::ops::DEFAULT_EPSILON;

/// Class count from which the kernels switch to the rayon pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Description of one layer in a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerParameter {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type")]
    pub layer_type: String,

    #[serde(default)]
    pub joint_to_conditional_param: Option<JointToConditionalParameter>,
}

/// Settings of a JointToConditional layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JointToConditionalParameter {
    /// Added to every denominator to keep all-zero pairs finite
    pub epsilon: f64,

    /// Use the parallel kernels when the class count reaches this value
    pub parallel_threshold: usize,

    /// Scan outputs and gradients for NaN/Inf after each pass
    pub check_finite: bool,
}

impl Default for JointToConditionalParameter {
    fn default() -> Self {
        JointToConditionalParameter {
            epsilon: DEFAULT_EPSILON,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            check_finite: false,
        }
    }
}

impl JointToConditionalParameter {
    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(LayerError::invalid_parameter(
                "epsilon".to_string(),
                format!("must be finite and positive, got {}", self.epsilon),
            ));
        }
        Ok(())
    }
}

impl LayerParameter {
    pub fn new<S: Into<String>>(name: S, layer_type: S) -> Self {
        LayerParameter {
            name: name.into(),
            layer_type: layer_type.into(),
            joint_to_conditional_param: None,
        }
    }

    pub fn with_joint_to_conditional_param(mut self, param: JointToConditionalParameter) -> Self {
        self.joint_to_conditional_param = Some(param);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
