//! Damped least-squares inverse kinematics
//!
//! Iteratively drives a joint configuration toward a desired Cartesian
//! position (or full pose), taking a unit damped-Gauss-Newton step per
//! iteration: Δq = J⁺·e with J⁺ the damped pseudo-inverse. The iteration
//! budget is fixed; convergence is not guaranteed for arbitrary starts,
//! large pose deltas or near-singular Jacobians — damping keeps the steps
//! finite but does not remove ill-conditioning.

use log::debug;
use nalgebra::{DVector, Vector3, Vector6};
use serde::{Deserialize, Serialize};

use crate::error::KinematicsError;
use crate::ik::oracle::KinematicOracle;
use crate::rotation::{axis_angle_error, damped_pseudo_inverse, DEFAULT_DAMPING};
use crate::types::{JointVec, RotationMatrix, TASK_DIM_POSITION};

/// Solver parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct IkConfig {
    /// Fixed iteration budget; there is no other termination rule.
    pub max_iterations: u32,
    /// Damping term λ of the pseudo-inverse.
    pub damping: f64,
    /// Error norm a candidate must beat to count as the best-so-far; also
    /// what `converged` reports against.
    pub tolerance: f64,
}

impl Default for IkConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            damping: DEFAULT_DAMPING,
            tolerance: 1e-6,
        }
    }
}

/// Outcome of one solve. Built fresh per call; nothing survives between
/// invocations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IkResult {
    /// Best configuration found, or the final iterate when the tolerance
    /// was never beaten.
    pub joint_positions: Vec<f64>,
    /// Cartesian error norm at the returned configuration's iterate.
    pub error_norm: f64,
    /// Iterations consumed (always the full budget).
    pub iterations: u32,
    /// Whether the tolerance was met. When false the caller still gets the
    /// best information available, but should treat the result as
    /// approximate.
    pub converged: bool,
}

/// Damped least-squares IK solver over an injected [`KinematicOracle`].
pub struct DlsIkSolver {
    config: IkConfig,
}

impl DlsIkSolver {
    pub const fn new(config: IkConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(IkConfig::default())
    }

    /// Solve for a desired end-effector position, ignoring orientation.
    ///
    /// Uses the top three (linear) rows of the oracle's Jacobian.
    pub fn solve_position<O: KinematicOracle>(
        &self,
        oracle: &O,
        x_des: &Vector3<f64>,
        q0: &[f64],
    ) -> Result<IkResult, KinematicsError> {
        self.validate(oracle, q0)?;

        let mut q = DVector::from_column_slice(q0);
        let mut best: Option<(JointVec, f64)> = None;
        let mut best_norm = self.config.tolerance;
        let mut last_norm = f64::INFINITY;

        for iteration in 0..self.config.max_iterations {
            let (p, _) = oracle.forward_kinematics(&q);
            let e = x_des - p;
            last_norm = e.norm();

            let j = oracle.jacobian(&q);
            let j_pos = j.rows(0, TASK_DIM_POSITION).into_owned();
            let j_inv = damped_pseudo_inverse(&j_pos, self.config.damping)?;
            q += &j_inv * e;

            debug!(
                "ik position iteration {iteration}: |e| = {:.3e}",
                last_norm
            );
            if last_norm < best_norm {
                best_norm = last_norm;
                best = Some((q.clone(), last_norm));
            }
        }

        Ok(self.build_result(best, q, last_norm))
    }

    /// Solve for a desired full pose: position plus orientation, the latter
    /// expressed as a world-frame axis-angle error.
    pub fn solve_pose<O: KinematicOracle>(
        &self,
        oracle: &O,
        x_des: &Vector3<f64>,
        r_des: &RotationMatrix,
        q0: &[f64],
    ) -> Result<IkResult, KinematicsError> {
        self.validate(oracle, q0)?;

        let mut q = DVector::from_column_slice(q0);
        let mut best: Option<(JointVec, f64)> = None;
        let mut best_norm = self.config.tolerance;
        let mut last_norm = f64::INFINITY;

        for iteration in 0..self.config.max_iterations {
            let (p, r) = oracle.forward_kinematics(&q);
            let e_p = x_des - p;
            let e_o = axis_angle_error(r_des, &r);
            let e = Vector6::new(e_p[0], e_p[1], e_p[2], e_o[0], e_o[1], e_o[2]);
            last_norm = e.norm();

            let j = oracle.jacobian(&q);
            let j_inv = damped_pseudo_inverse(&j, self.config.damping)?;
            q += &j_inv * e;

            debug!("ik pose iteration {iteration}: |e| = {:.3e}", last_norm);
            if last_norm < best_norm {
                best_norm = last_norm;
                best = Some((q.clone(), last_norm));
            }
        }

        Ok(self.build_result(best, q, last_norm))
    }

    fn validate<O: KinematicOracle>(
        &self,
        oracle: &O,
        q0: &[f64],
    ) -> Result<(), KinematicsError> {
        if q0.len() != oracle.dof() {
            return Err(KinematicsError::InvalidConfiguration(format!(
                "initial configuration has {} joints, oracle reports {}",
                q0.len(),
                oracle.dof()
            )));
        }
        if self.config.max_iterations == 0 {
            return Err(KinematicsError::InvalidConfiguration(
                "iteration budget must be at least 1".into(),
            ));
        }
        if self.config.damping < 0.0 {
            return Err(KinematicsError::InvalidConfiguration(format!(
                "damping must be non-negative, got {}",
                self.config.damping
            )));
        }
        Ok(())
    }

    fn build_result(
        &self,
        best: Option<(JointVec, f64)>,
        final_q: JointVec,
        final_norm: f64,
    ) -> IkResult {
        match best {
            Some((q, norm)) => IkResult {
                joint_positions: q.as_slice().to_vec(),
                error_norm: norm,
                iterations: self.config.max_iterations,
                converged: true,
            },
            None => IkResult {
                joint_positions: final_q.as_slice().to_vec(),
                error_norm: final_norm,
                iterations: self.config.max_iterations,
                converged: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ik::oracle::PlanarTwoLink;
    use approx::assert_relative_eq;

    fn unit_arm() -> PlanarTwoLink {
        PlanarTwoLink::new(1.0, 1.0)
    }

    #[test]
    fn position_roundtrip_two_link() {
        let _ = env_logger::builder().is_test(true).try_init();

        // FK at known angles, then IK from a cold start to recover the
        // position within tolerance.
        let arm = unit_arm();
        let q_target = DVector::from_vec(vec![0.3, 0.5]);
        let (x_des, _) = arm.forward_kinematics(&q_target);

        let solver = DlsIkSolver::with_defaults();
        let result = solver.solve_position(&arm, &x_des, &[0.0, 0.0]).unwrap();

        let q = DVector::from_vec(result.joint_positions.clone());
        let (p, _) = arm.forward_kinematics(&q);
        assert!(
            (x_des - p).norm() < 1e-4,
            "position error {} too large",
            (x_des - p).norm()
        );
    }

    #[test]
    fn interior_target_converges_within_budget() {
        // Target at distance sqrt(2) < 2, reachable at q = [-π/4, π/2].
        let arm = unit_arm();
        let x_des = Vector3::new(2.0_f64.sqrt(), 0.0, 0.0);

        let solver = DlsIkSolver::with_defaults();
        let result = solver.solve_position(&arm, &x_des, &[0.1, 0.1]).unwrap();
        assert!(result.converged, "error_norm = {}", result.error_norm);

        let q = DVector::from_vec(result.joint_positions.clone());
        let (p, _) = arm.forward_kinematics(&q);
        assert!((x_des - p).norm() < 1e-4);
    }

    #[test]
    fn unreachable_target_stays_finite() {
        // Distance > l1 + l2: no solution exists, but the damped steps must
        // never produce NaN and the caller must see converged = false.
        let arm = unit_arm();
        let x_des = Vector3::new(5.0, 5.0, 0.0);

        let solver = DlsIkSolver::with_defaults();
        let result = solver.solve_position(&arm, &x_des, &[0.0, 0.0]).unwrap();

        assert!(!result.converged);
        assert!(result.joint_positions.iter().all(|v| v.is_finite()));
        assert!(result.error_norm.is_finite());
        assert!(result.error_norm > 1.0);
    }

    #[test]
    fn pose_roundtrip_two_link() {
        let arm = unit_arm();
        let q_target = DVector::from_vec(vec![0.3, 0.5]);
        let (x_des, r_des) = arm.forward_kinematics(&q_target);

        let solver = DlsIkSolver::new(IkConfig {
            max_iterations: 30,
            ..IkConfig::default()
        });
        let result = solver
            .solve_pose(&arm, &x_des, &r_des, &[0.1, 0.2])
            .unwrap();

        let q = DVector::from_vec(result.joint_positions.clone());
        let (p, r) = arm.forward_kinematics(&q);
        assert!((x_des - p).norm() < 1e-3);
        assert!(axis_angle_error(&r_des, &r).norm() < 1e-3);
    }

    #[test]
    fn single_iteration_far_target_returns_final_iterate() {
        // The tolerance can never be beaten in one step from far away:
        // the result must be the final iterate, flagged as not converged.
        let arm = unit_arm();
        let solver = DlsIkSolver::new(IkConfig {
            max_iterations: 1,
            ..IkConfig::default()
        });
        let result = solver
            .solve_position(&arm, &Vector3::new(0.0, 1.9, 0.0), &[0.0, 0.0])
            .unwrap();

        assert!(!result.converged);
        assert_eq!(result.iterations, 1);
        assert!(result.joint_positions.iter().all(|v| v.is_finite()));
        // One step was still taken.
        assert!(result.joint_positions.iter().any(|v| v.abs() > 0.0));
    }

    #[test]
    fn rejects_mismatched_dof() {
        let arm = unit_arm();
        let solver = DlsIkSolver::with_defaults();
        let err = solver
            .solve_position(&arm, &Vector3::zeros(), &[0.0, 0.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, KinematicsError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_zero_iteration_budget() {
        let arm = unit_arm();
        let solver = DlsIkSolver::new(IkConfig {
            max_iterations: 0,
            ..IkConfig::default()
        });
        let err = solver
            .solve_position(&arm, &Vector3::zeros(), &[0.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, KinematicsError::InvalidConfiguration(_)));
    }

    #[test]
    fn independent_solves_share_nothing() {
        // A failed (unreachable) solve must leave no trace in a later one.
        let arm = unit_arm();
        let solver = DlsIkSolver::with_defaults();

        let far = solver
            .solve_position(&arm, &Vector3::new(9.0, 0.0, 0.0), &[0.0, 0.0])
            .unwrap();
        assert!(!far.converged);

        let q_target = DVector::from_vec(vec![-0.4, 0.8]);
        let (x_des, _) = arm.forward_kinematics(&q_target);
        let near = solver.solve_position(&arm, &x_des, &[0.0, 0.0]).unwrap();

        let q = DVector::from_vec(near.joint_positions.clone());
        let (p, _) = arm.forward_kinematics(&q);
        assert_relative_eq!((x_des - p).norm(), 0.0, epsilon = 1e-4);
    }
}
