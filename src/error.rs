use thiserror::Error;

/// Top-level error type for the joint-motion toolkit.
///
/// Every failure is local and synchronous: it is returned to the immediate
/// caller and never retried or substituted with a default internally.
#[derive(Debug, Error)]
pub enum KinematicsError {
    /// A matrix inversion required by the computation hit a non-invertible
    /// (or numerically degenerate) matrix, e.g. the Kalman innovation
    /// covariance, the Euler-rate map at pitch = ±π/2, or Euler-angle
    /// extraction at gimbal lock.
    #[error("singular matrix in {context}")]
    SingularMatrix { context: &'static str },

    /// Construction-time or call-time parameter violation: non-positive
    /// sampling period, zero measurement-noise scale, mismatched vector
    /// lengths, zero iteration budget.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
