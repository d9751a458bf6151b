#![no_std]
pub mod clamp;
pub mod modulation;
pub mod park;

pub use clamp::{circle_limit, ClampCalibration, ClampStrategy, QdVoltage};
pub use modulation::{Modulator, PwmConfig, PwmResult};
pub use park::{reverse_park, AlphaBetaVoltage};
