//! Inverse kinematics over an injected kinematic oracle.
//!
//! ```text
//! KinematicOracle (FK + Jacobian) ──► DlsIkSolver ──► IkResult
//! ```
//!
//! The oracle is a capability the caller hands in; the solver queries it
//! with an explicit configuration every iteration and holds no kinematic
//! state of its own.

pub mod oracle;
pub mod solver;

pub use oracle::{KinematicOracle, PlanarTwoLink};
pub use solver::{DlsIkSolver, IkConfig, IkResult};
