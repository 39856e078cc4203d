//! Single-channel constant-acceleration Kalman differentiator
//!
//! State vector (3D): [position, velocity, acceleration]. The filter
//! observes position (and by default velocity) and infers the unobserved
//! acceleration through the constant-acceleration transition model, turning
//! a noisy measurement stream into smoothed kinematic derivatives.

use nalgebra::{DMatrix, DVector, Matrix3};
use serde::{Deserialize, Serialize};

use crate::error::KinematicsError;
use crate::types::{ChannelEstimate, ChannelMat, ChannelVec, MAX_OBSERVED_STATES};

/// Noise scales and observation shape for one channel.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DifferentiatorConfig {
    /// Number of observed states: 1 (position only) or 2 (position + velocity).
    pub n_obs: usize,
    /// Process-noise scale (model uncertainty / motion noise).
    pub sigma_r: f64,
    /// Measurement-noise scale. Must be positive.
    pub sigma_q: f64,
}

impl Default for DifferentiatorConfig {
    fn default() -> Self {
        Self {
            n_obs: 2,
            sigma_r: 1e-3,
            sigma_q: 1.0,
        }
    }
}

/// Constant-acceleration Kalman filter for one scalar degree of freedom.
#[derive(Debug)]
pub struct KalmanDifferentiator {
    /// Transition model F (constant-acceleration kinematics).
    f: ChannelMat,
    /// Process covariance R = sigma_r·I₃.
    r: ChannelMat,
    /// Measurement covariance Q = sigma_q·I_{n_obs}.
    q: DMatrix<f64>,
    /// Observed-state count; H is implicitly the first `n_obs` rows of I₃.
    n_obs: usize,
    x_est: ChannelVec,
    p_est: ChannelMat,
}

impl KalmanDifferentiator {
    /// Create a channel from an initial [pos, vel, acc] estimate, a sampling
    /// period and noise configuration. Estimate-error covariance starts at
    /// zero.
    pub fn new(
        initial: ChannelVec,
        dt: f64,
        config: DifferentiatorConfig,
    ) -> Result<Self, KinematicsError> {
        if dt <= 0.0 {
            return Err(KinematicsError::InvalidConfiguration(format!(
                "sampling period must be positive, got {dt}"
            )));
        }
        if config.sigma_q <= 0.0 {
            return Err(KinematicsError::InvalidConfiguration(format!(
                "measurement-noise scale must be positive, got {}",
                config.sigma_q
            )));
        }
        if config.sigma_r < 0.0 {
            return Err(KinematicsError::InvalidConfiguration(format!(
                "process-noise scale must be non-negative, got {}",
                config.sigma_r
            )));
        }
        if config.n_obs == 0 || config.n_obs > MAX_OBSERVED_STATES {
            return Err(KinematicsError::InvalidConfiguration(format!(
                "observed-state count must be 1 or 2, got {}",
                config.n_obs
            )));
        }

        #[rustfmt::skip]
        let f = Matrix3::new(
            1.0,  dt, 0.5 * dt * dt,
            0.0, 1.0, dt,
            0.0, 0.0, 1.0,
        );

        Ok(Self {
            f,
            r: Matrix3::identity() * config.sigma_r,
            q: DMatrix::identity(config.n_obs, config.n_obs) * config.sigma_q,
            n_obs: config.n_obs,
            x_est: initial,
            p_est: Matrix3::zeros(),
        })
    }

    /// One predict/correct tick.
    ///
    /// The velocity measurement is ignored when the channel was configured
    /// with `n_obs = 1`. Returns the corrected (position, velocity,
    /// acceleration) estimate.
    pub fn update(
        &mut self,
        position: f64,
        velocity: f64,
    ) -> Result<(f64, f64, f64), KinematicsError> {
        let n = self.n_obs;

        // Predict
        let x_hat = self.f * self.x_est;
        let p_hat = self.f * self.p_est * self.f.transpose() + self.r;

        // Innovation covariance S = H·P̂·Hᵀ + Q. With H selecting the first
        // n states, H·P̂·Hᵀ is the top-left n×n block of P̂.
        let mut s = DMatrix::zeros(n, n);
        s.copy_from(&p_hat.view((0, 0), (n, n)));
        s += &self.q;
        let s_inv = s.try_inverse().ok_or(KinematicsError::SingularMatrix {
            context: "kalman innovation covariance",
        })?;

        // Gain K = P̂·Hᵀ·S⁻¹; P̂·Hᵀ is the first n columns of P̂.
        let k = p_hat.columns(0, n) * s_inv;

        // Correct
        let mut z = DVector::zeros(n);
        z[0] = position;
        if n == MAX_OBSERVED_STATES {
            z[1] = velocity;
        }
        let innovation = z - x_hat.rows(0, n);
        self.x_est = x_hat + &k * innovation;

        let mut kh = Matrix3::zeros();
        kh.view_mut((0, 0), (3, n)).copy_from(&k);
        self.p_est = (Matrix3::identity() - kh) * p_hat;

        Ok((self.x_est[0], self.x_est[1], self.x_est[2]))
    }

    /// Current estimate without advancing the filter.
    pub fn estimate(&self) -> ChannelEstimate {
        ChannelEstimate {
            position: self.x_est[0],
            velocity: self.x_est[1],
            acceleration: self.x_est[2],
        }
    }

    /// Trace of the estimate-error covariance, as a scalar uncertainty
    /// indicator.
    pub fn covariance_trace(&self) -> f64 {
        self.p_est.trace()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn default_channel() -> KalmanDifferentiator {
        KalmanDifferentiator::new(ChannelVec::zeros(), 0.01, DifferentiatorConfig::default())
            .unwrap()
    }

    #[test]
    fn rejects_invalid_construction() {
        let bad_dt = KalmanDifferentiator::new(
            ChannelVec::zeros(),
            0.0,
            DifferentiatorConfig::default(),
        );
        assert!(matches!(
            bad_dt.unwrap_err(),
            KinematicsError::InvalidConfiguration(_)
        ));

        let bad_q = KalmanDifferentiator::new(
            ChannelVec::zeros(),
            0.01,
            DifferentiatorConfig {
                sigma_q: 0.0,
                ..DifferentiatorConfig::default()
            },
        );
        assert!(matches!(
            bad_q.unwrap_err(),
            KinematicsError::InvalidConfiguration(_)
        ));

        let bad_obs = KalmanDifferentiator::new(
            ChannelVec::zeros(),
            0.01,
            DifferentiatorConfig {
                n_obs: 3,
                ..DifferentiatorConfig::default()
            },
        );
        assert!(matches!(
            bad_obs.unwrap_err(),
            KinematicsError::InvalidConfiguration(_)
        ));
    }

    #[test]
    fn converges_on_constant_acceleration_trajectory() {
        let dt = 0.01;
        let accel = 0.3;
        let mut filter = default_channel();

        let mut estimate = (0.0, 0.0, 0.0);
        for step in 1..=2000 {
            let t = step as f64 * dt;
            let pos = 0.5 * accel * t * t;
            let vel = accel * t;
            estimate = filter.update(pos, vel).unwrap();
        }

        let t_end = 2000.0 * dt;
        assert_relative_eq!(estimate.0, 0.5 * accel * t_end * t_end, epsilon = 1e-2);
        assert_relative_eq!(estimate.1, accel * t_end, epsilon = 1e-2);
        assert_relative_eq!(estimate.2, accel, epsilon = 5e-2);
    }

    #[test]
    fn covariance_stays_bounded_under_noise() {
        let dt = 0.01;
        let mut filter = default_channel();

        let mut traces = Vec::new();
        for step in 1..=1000 {
            let t = step as f64 * dt;
            // Deterministic bounded "noise" so the test is reproducible.
            let noise = 0.01 * (37.0 * t).sin();
            filter.update(t + noise, 1.0 + noise).unwrap();
            traces.push(filter.covariance_trace());
        }

        // Steady state: the trace settles rather than growing without bound.
        let late = &traces[900..];
        let max_late = late.iter().cloned().fold(f64::MIN, f64::max);
        let min_late = late.iter().cloned().fold(f64::MAX, f64::min);
        assert!(max_late.is_finite());
        assert!(max_late - min_late < 1e-6);
        assert!(max_late < 1.0);
    }

    #[test]
    fn position_only_observation_still_tracks() {
        let dt = 0.01;
        let mut filter = KalmanDifferentiator::new(
            ChannelVec::zeros(),
            dt,
            DifferentiatorConfig {
                n_obs: 1,
                ..DifferentiatorConfig::default()
            },
        )
        .unwrap();

        let mut estimate = (0.0, 0.0, 0.0);
        for step in 1..=3000 {
            let t = step as f64 * dt;
            // Velocity argument must be ignored: pass garbage.
            estimate = filter.update(2.0 * t, f64::MAX).unwrap();
        }

        assert!(estimate.0.is_finite() && estimate.1.is_finite() && estimate.2.is_finite());
        assert_relative_eq!(estimate.1, 2.0, epsilon = 0.1);

        // Read-only snapshot agrees with the last update's return value.
        let snap = filter.estimate();
        assert_relative_eq!(snap.position, estimate.0);
        assert_relative_eq!(snap.velocity, estimate.1);
        assert_relative_eq!(snap.acceleration, estimate.2);
    }
}
