pub mod bank;
pub mod differentiator;

pub use bank::DifferentiatorBank;
pub use differentiator::{DifferentiatorConfig, KalmanDifferentiator};
