use joint_conditional::blob::Blob;
use joint_conditional::builders::JointToConditionalLayerBuilder;
use joint_conditional::config::LayerParameter;
use joint_conditional::debug::GradientChecker;
use joint_conditional::error::LayerError;
use joint_conditional::layers::{LayerRegistry, LayerTrait};

const CONFIG: &str = r#"{
    "name": "cond",
    "type": "JointToConditional",
    "joint_to_conditional_param": {
        "epsilon": 1e-12,
        "parallel_threshold": 64,
        "check_finite": true
    }
}"#;

#[test]
fn test_config_to_gradient_check() {
    let param = LayerParameter::from_json_str(CONFIG).unwrap();
    let registry = LayerRegistry::default();
    let mut layer = registry.create(&param).unwrap();
    assert_eq!(layer.layer_type(), "JointToConditional");

    let classes = 20;
    let checker = GradientChecker::new(1e-6, 1e-4, 1701);
    let mut bottom = vec![Blob::new(&[1, classes, 4, 1])];
    checker.fill_uniform(&mut bottom[0], 0.1, 1.0).unwrap();
    let mut top = vec![Blob::default(); 4];

    layer.setup_blobs(&bottom, &mut top).unwrap();
    for blob in &top {
        assert_eq!(blob.shape(), &[1, classes, 1, 1]);
    }

    layer.forward(&bottom, &mut top).unwrap();
    for c in 0..classes {
        let first = top[0].data()[c] + top[2].data()[c];
        let second = top[1].data()[c] + top[3].data()[c];
        assert!((first - 1.0).abs() < 1e-9);
        assert!((second - 1.0).abs() < 1e-9);
    }

    let mismatches = checker.check_gradient_exhaustive(layer.as_mut(), &mut bottom, &mut top, Some(0)).unwrap();
    assert!(mismatches.is_empty(), "{:?}", mismatches);

    let mismatches = checker.check_gradient(layer.as_mut(), &mut bottom, &mut top, None).unwrap();
    assert!(mismatches.is_empty(), "{:?}", mismatches);
}

#[test]
fn test_registry_and_builder_agree() {
    let param = LayerParameter::from_json_str(CONFIG).unwrap();
    let mut from_registry = LayerRegistry::default().create(&param).unwrap();
    let mut from_builder = JointToConditionalLayerBuilder::new()
        .parallel_threshold(64)
        .check_finite(true)
        .build()
        .unwrap();

    // Large enough to take the parallel kernels
    let classes = 100;
    let checker = GradientChecker::new(1e-6, 1e-4, 7);
    let mut bottom = vec![Blob::new(&[1, classes, 4, 1])];
    checker.fill_uniform(&mut bottom[0], 0.0, 2.0).unwrap();

    let mut top_a = vec![Blob::default(); 4];
    let mut top_b = vec![Blob::default(); 4];
    from_registry.setup_blobs(&bottom, &mut top_a).unwrap();
    from_builder.setup_blobs(&bottom, &mut top_b).unwrap();
    from_registry.forward(&bottom, &mut top_a).unwrap();
    from_builder.forward(&bottom, &mut top_b).unwrap();

    for (a, b) in top_a.iter().zip(top_b.iter()) {
        assert_eq!(a.data(), b.data());
    }

    for blob in top_a.iter_mut() {
        blob.fill_diff(1.0);
    }
    let mut bottom_b = bottom.clone();
    from_registry.backward(&top_a, &[true], &mut bottom).unwrap();
    from_builder.backward(&top_a, &[true], &mut bottom_b).unwrap();
    assert_eq!(bottom[0].diff(), bottom_b[0].diff());
}

#[test]
fn test_shape_errors_surface_through_registry() {
    let param = LayerParameter::from_json_str(CONFIG).unwrap();
    let mut layer = LayerRegistry::default().create(&param).unwrap();

    // 3 values per class instead of 4
    let bottom = vec![Blob::new(&[1, 5, 3, 1])];
    let mut top = vec![Blob::default(); 4];
    let err = layer.setup_blobs(&bottom, &mut top).unwrap_err();
    assert!(err.is_shape_error());

    let bottom = vec![Blob::new(&[1, 5, 4, 1])];
    let mut top = vec![Blob::default(); 3];
    let err = layer.setup_blobs(&bottom, &mut top).unwrap_err();
    assert!(matches!(err, LayerError::BlobCount { expected: 4, actual: 3, .. }));
}
