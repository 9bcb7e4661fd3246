use crate::blob::Blob;

/// Types of numerical issues
#[derive(Debug, Clone, PartialEq)]
pub enum NumericalIssue {
    NaN { count: usize },
    Infinity { count: usize },
    Overflow { count: usize },
}

/// Magnitude above which a finite value is reported as an overflow risk
pub const OVERFLOW_THRESHOLD: f64 = 1e300;

/// Check a flat buffer for numerical issues
pub fn check_values(values: &[f64]) -> Vec<NumericalIssue> {
    let mut issues = Vec::new();

    let mut nan_count = 0;
    let mut inf_count = 0;
    let mut overflow_count = 0;

    for &value in values {
        if value.is_nan() {
            nan_count += 1;
        } else if value.is_infinite() {
            inf_count += 1;
        } else if value.abs() > OVERFLOW_THRESHOLD {
            overflow_count += 1;
        }
    }

    if nan_count > 0 {
        issues.push(NumericalIssue::NaN { count: nan_count });
    }
    if inf_count > 0 {
        issues.push(NumericalIssue::Infinity { count: inf_count });
    }
    if overflow_count > 0 {
        issues.push(NumericalIssue::Overflow { count: overflow_count });
    }

    issues
}

/// Check the data of several blobs, tagging each issue with its blob index
pub fn check_blob_data(blobs: &[Blob]) -> Vec<(usize, NumericalIssue)> {
    blobs.iter()
        .enumerate()
        .flat_map(|(idx, blob)| check_values(blob.data()).into_iter().map(move |issue| (idx, issue)))
        .collect()
}

/// Check the diff of a blob
pub fn check_blob_diff(blob: &Blob) -> Vec<NumericalIssue> {
    check_values(blob.diff())
}

/// Check if values are in a reasonable range
pub fn check_value_range(values: &[f64], min_val: f64, max_val: f64) -> bool {
    values.iter().all(|&x| x >= min_val && x <= max_val)
}
