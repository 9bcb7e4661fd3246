pub mod gradient_check;
pub mod numerical_check;

pub use gradient_check::{GradientChecker, GradientMismatch};
pub use numerical_check::{check_values, check_blob_data, check_blob_diff, NumericalIssue};
