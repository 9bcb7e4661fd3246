//! Joint-to-conditional normalization kernels.
//!
//! Each class carries an unnormalized 2x2 joint table `(q00, q01, q10, q11)`.
//! The forward pass turns it into four conditionals that share two
//! denominators:
//!
//! ```text
//! p00 = q00 / (eps + q00 + q10)      p10 = q10 / (eps + q00 + q10)
//! p01 = q01 / (eps + q01 + q11)      p11 = q11 / (eps + q11 + q01)
//! ```
//!
//! `eps` is added to the denominator, never used as a floor, so a table whose
//! pair sums to zero maps to `0 / eps = 0`. The backward pass applies the
//! quotient rule to `f = a / (eps + a + b)` with the squared sum (plus `eps`)
//! as denominator. Both of a pair's inputs receive a contribution from both
//! outputs that share the pair's denominator.

use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Zip};

/// Additive denominator term used when a layer is not configured otherwise
pub const DEFAULT_EPSILON: f64 = 1e-12;

/// One class's joint table, addressed by cell instead of by offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointTable {
    pub q00: f64,
    pub q01: f64,
    pub q10: f64,
    pub q11: f64,
}

/// The four conditionals of one class, or the gradients flowing into them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditionals {
    pub p00: f64,
    pub p01: f64,
    pub p10: f64,
    pub p11: f64,
}

impl JointTable {
    pub fn new(q00: f64, q01: f64, q10: f64, q11: f64) -> Self {
        JointTable { q00, q01, q10, q11 }
    }

    /// Read a table from a 4-element row laid out as `[q00, q01, q10, q11]`.
    ///
    /// # Panics
    /// Panics if the row has fewer than four elements.
    pub fn from_row(row: ArrayView1<'_, f64>) -> Self {
        JointTable {
            q00: row[0],
            q01: row[1],
            q10: row[2],
            q11: row[3],
        }
    }

    pub fn conditionals(&self, epsilon: f64) -> Conditionals {
        Conditionals {
            p00: self.q00 / (epsilon + self.q00 + self.q10),
            p01: self.q01 / (epsilon + self.q01 + self.q11),
            p10: self.q10 / (epsilon + self.q00 + self.q10),
            p11: self.q11 / (epsilon + self.q11 + self.q01),
        }
    }

    /// Gradient of the loss with respect to each cell, given the gradients
    /// with respect to the four conditionals.
    ///
    /// Contributions are summed in the order p00, p01, p10, p11.
    pub fn gradient(&self, grads: &Conditionals, epsilon: f64) -> JointTable {
        let mut dq = JointTable::new(0.0, 0.0, 0.0, 0.0);

        let sq00 = (self.q00 + self.q10) * (self.q00 + self.q10);
        dq.q00 += grads.p00 * (self.q10 / (epsilon + sq00));
        dq.q10 += grads.p00 * (-self.q00 / (epsilon + sq00));

        let sq01 = (self.q01 + self.q11) * (self.q01 + self.q11);
        dq.q01 += grads.p01 * (self.q11 / (epsilon + sq01));
        dq.q11 += grads.p01 * (-self.q01 / (epsilon + sq01));

        let sq10 = (self.q10 + self.q00) * (self.q10 + self.q00);
        dq.q10 += grads.p10 * (self.q00 / (epsilon + sq10));
        dq.q00 += grads.p10 * (-self.q10 / (epsilon + sq10));

        let sq11 = (self.q11 + self.q01) * (self.q11 + self.q01);
        dq.q11 += grads.p11 * (self.q01 / (epsilon + sq11));
        dq.q01 += grads.p11 * (-self.q11 / (epsilon + sq11));

        dq
    }
}

/// Compute the four conditionals of every class.
///
/// `joint` is a `(C, 4)` view; `outputs` are the `p00, p01, p10, p11`
/// buffers, each of length `C`. With `parallel` set the classes are spread
/// over the rayon pool.
///
/// # Panics
/// Panics if an output's length differs from the number of rows in `joint`.
pub fn forward(
    joint: ArrayView2<'_, f64>,
    outputs: [ArrayViewMut1<'_, f64>; 4],
    epsilon: f64,
    parallel: bool,
) {
    let [p00, p01, p10, p11] = outputs;
    let zip = Zip::from(joint.rows())
        .and(p00)
        .and(p01)
        .and(p10)
        .and(p11);

    let kernel = |q: ArrayView1<'_, f64>, p00: &mut f64, p01: &mut f64, p10: &mut f64, p11: &mut f64| {
        let p = JointTable::from_row(q).conditionals(epsilon);
        *p00 = p.p00;
        *p01 = p.p01;
        *p10 = p.p10;
        *p11 = p.p11;
    };

    if parallel {
        zip.par_for_each(kernel);
    } else {
        zip.for_each(kernel);
    }
}

/// Zero `joint_grad` and accumulate the gradient flowing back from the four
/// conditionals into it.
///
/// `joint` and `joint_grad` are `(C, 4)`; `output_grads` are the gradients of
/// `p00, p01, p10, p11`, each of length `C`. Each class row of `joint_grad`
/// is written by exactly one task, so the parallel and serial paths produce
/// identical results.
///
/// # Panics
/// Panics if the shapes disagree.
pub fn backward(
    joint: ArrayView2<'_, f64>,
    output_grads: [ArrayView1<'_, f64>; 4],
    mut joint_grad: ArrayViewMut2<'_, f64>,
    epsilon: f64,
    parallel: bool,
) {
    joint_grad.fill(0.0);

    let [d00, d01, d10, d11] = output_grads;
    let zip = Zip::from(joint_grad.rows_mut())
        .and(joint.rows())
        .and(d00)
        .and(d01)
        .and(d10)
        .and(d11);

    let kernel = |mut dq: ArrayViewMut1<'_, f64>,
                  q: ArrayView1<'_, f64>,
                  &d00: &f64,
                  &d01: &f64,
                  &d10: &f64,
                  &d11: &f64| {
        let grads = Conditionals { p00: d00, p01: d01, p10: d10, p11: d11 };
        let g = JointTable::from_row(q).gradient(&grads, epsilon);
        dq[0] += g.q00;
        dq[1] += g.q01;
        dq[2] += g.q10;
        dq[3] += g.q11;
    };

    if parallel {
        zip.par_for_each(kernel);
    } else {
        zip.for_each(kernel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2};

    #[test]
    fn test_pairs_share_denominators() {
        let q = JointTable::new(0.3, 0.2, 0.1, 0.4);
        let p = q.conditionals(DEFAULT_EPSILON);
        assert!((p.p00 - 0.75).abs() < 1e-9);
        assert!((p.p10 - 0.25).abs() < 1e-9);
        assert!((p.p01 - 1.0 / 3.0).abs() < 1e-9);
        assert!((p.p11 - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_pair_maps_to_zero() {
        let p = JointTable::new(0.0, 0.0, 0.0, 0.0).conditionals(DEFAULT_EPSILON);
        assert_eq!(p, Conditionals { p00: 0.0, p01: 0.0, p10: 0.0, p11: 0.0 });
    }

    #[test]
    fn test_epsilon_is_additive() {
        // A floor would give exactly 1.0 here
        let p = JointTable::new(1e-13, 0.0, 0.0, 0.0).conditionals(DEFAULT_EPSILON);
        assert!((p.p00 - 1e-13 / 1.1e-12).abs() < 1e-12);
    }

    #[test]
    fn test_serial_and_parallel_agree() {
        let joint = Array2::from_shape_fn((257, 4), |(c, k)| ((c * 4 + k) as f64 * 0.37).sin().abs());
        let grads: Vec<Array1<f64>> = (0..4)
            .map(|k| Array1::from_shape_fn(257, |c| ((c + k) as f64 * 0.11).cos()))
            .collect();

        let mut serial: Vec<Array1<f64>> = (0..4).map(|_| Array1::zeros(257)).collect();
        let mut parallel: Vec<Array1<f64>> = (0..4).map(|_| Array1::zeros(257)).collect();
        {
            let [a, b, c, d] = &mut serial[..] else { unreachable!() };
            forward(joint.view(), [a.view_mut(), b.view_mut(), c.view_mut(), d.view_mut()], DEFAULT_EPSILON, false);
        }
        {
            let [a, b, c, d] = &mut parallel[..] else { unreachable!() };
            forward(joint.view(), [a.view_mut(), b.view_mut(), c.view_mut(), d.view_mut()], DEFAULT_EPSILON, true);
        }
        assert_eq!(serial, parallel);

        let mut dq_serial = Array2::from_elem((257, 4), 7.0);
        let mut dq_parallel = Array2::from_elem((257, 4), -7.0);
        let views = [grads[0].view(), grads[1].view(), grads[2].view(), grads[3].view()];
        backward(joint.view(), views.clone(), dq_serial.view_mut(), DEFAULT_EPSILON, false);
        backward(joint.view(), views, dq_parallel.view_mut(), DEFAULT_EPSILON, true);
        assert_eq!(dq_serial, dq_parallel);
    }

    #[test]
    fn test_backward_overwrites_stale_gradient() {
        let joint = array![[0.3, 0.2, 0.1, 0.4]];
        let zero = array![0.0];
        let mut dq = array![[5.0, 5.0, 5.0, 5.0]];
        backward(
            joint.view(),
            [zero.view(), zero.view(), zero.view(), zero.view()],
            dq.view_mut(),
            DEFAULT_EPSILON,
            false,
        );
        assert_eq!(dq, array![[0.0, 0.0, 0.0, 0.0]]);
    }
}
