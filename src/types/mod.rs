pub mod linalg;

pub use linalg::*;

use serde::{Deserialize, Serialize};

/// Filtered estimate of a single scalar channel.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ChannelEstimate {
    pub position: f64,
    pub velocity: f64,
    pub acceleration: f64,
}

/// Snapshot of every channel in a differentiator bank, in channel order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BankEstimate {
    pub positions: Vec<f64>,
    pub velocities: Vec<f64>,
    pub accelerations: Vec<f64>,
}
