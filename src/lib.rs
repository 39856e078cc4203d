//! Joint-space motion toolkit for robot control experiments
//!
//! Three cooperating pieces, invoked once per control-loop tick:
//!
//! - [`rotation`] — stateless conversions between rotation matrix, ZYX
//!   Euler angles, quaternion and axis-angle, Euler-rate/angular-velocity
//!   mappings, orientation error terms and the damped pseudo-inverse.
//! - [`filters`] — per-channel constant-acceleration Kalman
//!   differentiators and the N-channel bank that turns noisy position and
//!   velocity measurements into smoothed position/velocity/acceleration
//!   estimates.
//! - [`ik`] — a damped least-squares inverse-kinematics solver driven by
//!   an injected forward-kinematics/Jacobian oracle.
//!
//! Everything is synchronous and single-robot; degenerate numerical
//! configurations surface as [`KinematicsError`] instead of NaN.

pub mod error;
pub mod filters;
pub mod ik;
pub mod rotation;
pub mod types;

pub use error::KinematicsError;
pub use filters::{DifferentiatorBank, DifferentiatorConfig, KalmanDifferentiator};
pub use ik::{DlsIkSolver, IkConfig, IkResult, KinematicOracle, PlanarTwoLink};
