//! Kinematic oracle contract consumed by the IK solver.

use nalgebra::{DMatrix, Matrix3, Vector3};

use crate::types::{Jacobian, JointVec, RotationMatrix, TASK_DIM_POSE};

/// Forward-kinematics and Jacobian provider for a single end-effector.
///
/// Implementations must be pure functions of `q`: every call reflects only
/// the configuration passed in, with no hidden state carried over from
/// earlier queries. The solver calls these repeatedly with different `q`
/// during one solve.
pub trait KinematicOracle {
    /// Number of actuated joints.
    fn dof(&self) -> usize;

    /// End-effector position and rotation for the given joint configuration.
    fn forward_kinematics(&self, q: &JointVec) -> (Vector3<f64>, RotationMatrix);

    /// World-frame geometric Jacobian (6 × dof): linear rows first, then
    /// angular rows, mapping joint velocity to end-effector twist.
    fn jacobian(&self, q: &JointVec) -> Jacobian;
}

/// Planar 2-link revolute arm in the xy-plane, both joints about z.
///
/// The smallest non-trivial oracle: closed-form FK and Jacobian, an
/// analytically known workspace (annulus of radius |l1−l2|..l1+l2). Used by
/// the solver tests and handy as a reference implementation of the trait.
pub struct PlanarTwoLink {
    pub l1: f64,
    pub l2: f64,
}

impl PlanarTwoLink {
    pub const fn new(l1: f64, l2: f64) -> Self {
        Self { l1, l2 }
    }
}

impl KinematicOracle for PlanarTwoLink {
    fn dof(&self) -> usize {
        2
    }

    fn forward_kinematics(&self, q: &JointVec) -> (Vector3<f64>, RotationMatrix) {
        let (s1, c1) = q[0].sin_cos();
        let (s12, c12) = (q[0] + q[1]).sin_cos();

        let p = Vector3::new(self.l1 * c1 + self.l2 * c12, self.l1 * s1 + self.l2 * s12, 0.0);
        #[rustfmt::skip]
        let r = Matrix3::new(
            c12, -s12, 0.0,
            s12,  c12, 0.0,
            0.0,  0.0, 1.0,
        );
        (p, r)
    }

    fn jacobian(&self, q: &JointVec) -> Jacobian {
        let (s1, c1) = q[0].sin_cos();
        let (s12, c12) = (q[0] + q[1]).sin_cos();

        let mut j = DMatrix::zeros(TASK_DIM_POSE, 2);
        j[(0, 0)] = -self.l1 * s1 - self.l2 * s12;
        j[(0, 1)] = -self.l2 * s12;
        j[(1, 0)] = self.l1 * c1 + self.l2 * c12;
        j[(1, 1)] = self.l2 * c12;
        // Angular part: both joints rotate about world z.
        j[(5, 0)] = 1.0;
        j[(5, 1)] = 1.0;
        j
    }
}
