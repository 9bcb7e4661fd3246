use std::io::Write;

use crate::blob::Blob;
use crate::config::{JointToConditionalParameter, LayerParameter, DEFAULT_PARALLEL_THRESHOLD};
use crate::error::{LayerError, Result};
use crate::layers::{JointToConditionalLayer, LayerRegistry, LayerTrait};
use crate::ops::DEFAULT_EPSILON;

#[test]
fn test_default_registry_types() {
    let registry = LayerRegistry::default();
    assert!(registry.contains("JointToConditional"));
    assert_eq!(registry.types(), vec!["JointToConditional".to_string()]);
    assert!(LayerRegistry::empty().types().is_empty());
}

#[test]
fn test_create_from_json() {
    let param = LayerParameter::from_json_str(r#"{
        "name": "cond",
        "type": "JointToConditional",
        "joint_to_conditional_param": { "epsilon": 1e-10 }
    }"#).unwrap();
    assert_eq!(param.name, "cond");
    let settings = param.joint_to_conditional_param.clone().unwrap();
    assert_eq!(settings.epsilon, 1e-10);
    assert_eq!(settings.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
    assert!(!settings.check_finite);

    let mut layer = LayerRegistry::default().create(&param).unwrap();
    assert_eq!(layer.layer_type(), "JointToConditional");

    let bottom = vec![Blob::from_data(&[1, 1, 4, 1], vec![0.5, 0.0, 0.0, 0.5]).unwrap()];
    let mut top = vec![Blob::default(); 4];
    layer.setup_blobs(&bottom, &mut top).unwrap();
    layer.forward(&bottom, &mut top).unwrap();
    assert!((top[0].data()[0] - 0.5 / (0.5 + 1e-10)).abs() < 1e-15);
}

#[test]
fn test_missing_param_block_uses_defaults() {
    let param = LayerParameter::from_json_str(r#"{ "type": "JointToConditional" }"#).unwrap();
    assert_eq!(param.name, "");
    assert!(param.joint_to_conditional_param.is_none());
    assert!(LayerRegistry::default().create(&param).is_ok());
}

#[test]
fn test_unknown_layer_type() {
    let param = LayerParameter::new("conv1", "Convolution");
    let err = LayerRegistry::default().create(&param).err().unwrap();
    assert_eq!(err, LayerError::UnknownLayerType("Convolution".to_string()));
}

#[test]
fn test_invalid_epsilon_rejected() {
    let param = LayerParameter::new("cond", "JointToConditional")
        .with_joint_to_conditional_param(JointToConditionalParameter {
            epsilon: 0.0,
            ..Default::default()
        });
    let err = LayerRegistry::default().create(&param).err().unwrap();
    assert!(matches!(err, LayerError::InvalidParameter { .. }));
}

#[test]
fn test_malformed_json() {
    let err = LayerParameter::from_json_str("{ \"name\": 3 }").unwrap_err();
    assert!(matches!(err, LayerError::ConfigError(_)));
}

#[test]
fn test_json_round_trip() {
    let param = LayerParameter::new("cond", "JointToConditional")
        .with_joint_to_conditional_param(JointToConditionalParameter {
            epsilon: DEFAULT_EPSILON,
            parallel_threshold: 16,
            check_finite: true,
        });
    let json = param.to_json_string().unwrap();
    assert!(json.contains("\"type\": \"JointToConditional\""));
    assert_eq!(LayerParameter::from_json_str(&json).unwrap(), param);
}

#[test]
fn test_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "name": "cond", "type": "JointToConditional", "joint_to_conditional_param": {{ "check_finite": true }} }}"#).unwrap();

    let param = LayerParameter::from_json_file(file.path()).unwrap();
    assert!(param.joint_to_conditional_param.unwrap().check_finite);

    let err = LayerParameter::from_json_file(file.path().with_extension("missing")).unwrap_err();
    assert!(matches!(err, LayerError::IoError(_)));
}

fn create_custom(_param: &LayerParameter) -> Result<Box<dyn LayerTrait>> {
    Ok(Box::new(JointToConditionalLayer::new()))
}

#[test]
fn test_register_custom_type() {
    let mut registry = LayerRegistry::empty();
    registry.register("Custom", create_custom).unwrap();
    assert!(registry.contains("Custom"));
    assert!(registry.create(&LayerParameter::new("c", "Custom")).is_ok());

    let err = registry.register("Custom", create_custom).unwrap_err();
    assert!(matches!(err, LayerError::InvalidParameter { .. }));
}
