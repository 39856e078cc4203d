//! Differentiator bank: one Kalman channel per degree of freedom
//!
//! The bank owns N independent [`KalmanDifferentiator`] channels sharing a
//! sampling period. Channels never interact: one tick issues exactly one
//! update per channel, so per-channel work could be spread across threads
//! with no locking if a caller ever needed it.

use crate::error::KinematicsError;
use crate::filters::differentiator::{DifferentiatorConfig, KalmanDifferentiator};
use crate::types::{BankEstimate, ChannelVec, JointVec};

#[derive(Debug)]
pub struct DifferentiatorBank {
    channels: Vec<KalmanDifferentiator>,
    q: JointVec,
    dq: JointVec,
    ddq: JointVec,
}

impl DifferentiatorBank {
    /// Build a bank with one channel per entry of the initial vectors.
    ///
    /// The channel count is fixed by `q0.len()` and immutable afterwards;
    /// all three initial vectors must agree in length.
    pub fn new(
        dt: f64,
        q0: &JointVec,
        dq0: &JointVec,
        ddq0: &JointVec,
        config: DifferentiatorConfig,
    ) -> Result<Self, KinematicsError> {
        let n_dof = q0.len();
        if dq0.len() != n_dof || ddq0.len() != n_dof {
            return Err(KinematicsError::InvalidConfiguration(format!(
                "initial vectors disagree in length: {} / {} / {}",
                n_dof,
                dq0.len(),
                ddq0.len()
            )));
        }
        if n_dof == 0 {
            return Err(KinematicsError::InvalidConfiguration(
                "bank needs at least one channel".into(),
            ));
        }

        let mut channels = Vec::with_capacity(n_dof);
        for i in 0..n_dof {
            let initial = ChannelVec::new(q0[i], dq0[i], ddq0[i]);
            channels.push(KalmanDifferentiator::new(initial, dt, config)?);
        }

        Ok(Self {
            channels,
            q: q0.clone(),
            dq: dq0.clone(),
            ddq: ddq0.clone(),
        })
    }

    /// Bank with default noise configuration.
    pub fn with_defaults(
        dt: f64,
        q0: &JointVec,
        dq0: &JointVec,
        ddq0: &JointVec,
    ) -> Result<Self, KinematicsError> {
        Self::new(dt, q0, dq0, ddq0, DifferentiatorConfig::default())
    }

    pub fn n_dof(&self) -> usize {
        self.channels.len()
    }

    /// One tick: feed every channel its measurement pair, in channel order.
    ///
    /// Returns the filtered (positions, velocities, accelerations) vectors.
    /// Length mismatches are rejected before any channel is touched, so a
    /// failed call leaves no partial update behind.
    pub fn update(
        &mut self,
        q_meas: &JointVec,
        dq_meas: &JointVec,
    ) -> Result<(JointVec, JointVec, JointVec), KinematicsError> {
        let n_dof = self.channels.len();
        if q_meas.len() != n_dof || dq_meas.len() != n_dof {
            return Err(KinematicsError::InvalidConfiguration(format!(
                "measurement length {} / {} does not match bank size {}",
                q_meas.len(),
                dq_meas.len(),
                n_dof
            )));
        }

        for (i, channel) in self.channels.iter_mut().enumerate() {
            let (pos, vel, acc) = channel.update(q_meas[i], dq_meas[i])?;
            self.q[i] = pos;
            self.dq[i] = vel;
            self.ddq[i] = acc;
        }

        Ok((self.q.clone(), self.dq.clone(), self.ddq.clone()))
    }

    /// Serializable snapshot of the current per-channel estimates.
    pub fn estimate(&self) -> BankEstimate {
        BankEstimate {
            positions: self.q.as_slice().to_vec(),
            velocities: self.dq.as_slice().to_vec(),
            accelerations: self.ddq.as_slice().to_vec(),
        }
    }
}
