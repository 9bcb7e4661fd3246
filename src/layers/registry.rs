use std::collections::HashMap;

use super::joint_to_conditional::{JointToConditionalLayer, LAYER_TYPE as JOINT_TO_CONDITIONAL};
use super::traits::Layer as LayerTrait;
use crate::config::LayerParameter;
use crate::error::{LayerError, Result};

/// Constructor stored in a [`LayerRegistry`]
pub type LayerCreator = fn(&LayerParameter) -> Result<Box<dyn LayerTrait>>;

/// Factory mapping a layer type name to its constructor
#[derive(Clone)]
pub struct LayerRegistry {
    creators: HashMap<String, LayerCreator>,
}

impl LayerRegistry {
    /// Create a registry with no layer types
    pub fn empty() -> Self {
        LayerRegistry {
            creators: HashMap::new(),
        }
    }

    /// Register a constructor. Registering a name twice is an error.
    pub fn register<S: Into<String>>(&mut self, layer_type: S, creator: LayerCreator) -> Result<()> {
        let layer_type = layer_type.into();
        if self.creators.contains_key(&layer_type) {
            return Err(LayerError::invalid_parameter(
                "layer_type".to_string(),
                format!("{} is already registered", layer_type),
            ));
        }
        self.creators.insert(layer_type, creator);
        Ok(())
    }

    /// Build an unconfigured layer from its parameter
    pub fn create(&self, param: &LayerParameter) -> Result<Box<dyn LayerTrait>> {
        let creator = self.creators.get(&param.layer_type)
            .ok_or_else(|| LayerError::UnknownLayerType(param.layer_type.clone()))?;
        creator(param)
    }

    pub fn contains(&self, layer_type: &str) -> bool {
        self.creators.contains_key(layer_type)
    }

    /// Registered type names in sorted order
    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.creators.keys().cloned().collect();
        types.sort();
        types
    }
}

impl Default for LayerRegistry {
    /// A registry that knows every layer type in this crate
    fn default() -> Self {
        let mut creators: HashMap<String, LayerCreator> = HashMap::new();
        creators.insert(JOINT_TO_CONDITIONAL.to_string(), create_joint_to_conditional);
        LayerRegistry { creators }
    }
}

fn create_joint_to_conditional(param: &LayerParameter) -> Result<Box<dyn LayerTrait>> {
    let settings = param.joint_to_conditional_param.clone().unwrap_or_default();
    Ok(Box::new(JointToConditionalLayer::from_param(&settings)?))
}
