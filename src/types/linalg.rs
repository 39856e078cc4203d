//! Linear algebra type system for the joint-motion toolkit
//!
//! Provides compile-time dimension checking and clean type aliases
//! for the rotation algebra, Kalman differentiators and IK solver.

use nalgebra::{DMatrix, DVector, Matrix3, SMatrix, SVector, Vector3, Vector4};

// ===== Channel dimensions =====
pub const CHANNEL_STATE_DIM: usize = 3; // [position, velocity, acceleration]
pub const MAX_OBSERVED_STATES: usize = 2; // position + velocity

// ===== Task-space dimensions =====
pub const TASK_DIM_POSITION: usize = 3; // (x, y, z)
pub const TASK_DIM_POSE: usize = 6; // position + orientation

// ===== Per-channel Kalman filter types =====
pub type ChannelVec = SVector<f64, CHANNEL_STATE_DIM>;
pub type ChannelMat = SMatrix<f64, CHANNEL_STATE_DIM, CHANNEL_STATE_DIM>;

// ===== Rotation algebra types =====
/// 3×3 rotation matrix (orthonormal, det = +1).
pub type RotationMatrix = Matrix3<f64>;
/// ZYX Euler angles [roll, pitch, yaw]; roll rotates about z, yaw about x.
pub type Rpy = Vector3<f64>;
/// Quaternion [w, x, y, z], scalar first.
pub type Quat = Vector4<f64>;

// ===== DOF-sized quantities =====
pub type JointVec = DVector<f64>;
pub type Jacobian = DMatrix<f64>;
