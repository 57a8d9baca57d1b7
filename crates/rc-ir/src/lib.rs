//! Core value types for the ratioclock engine.
//!
//! Ratios, chain protocol levels, edit commands and the persisted state
//! shared by the engine, the controller and the CLI.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod chain;
mod edit;
mod mode;
mod ratio;
pub mod state;

pub use chain::{ChainSignal, CHAIN_TOLERANCE};
pub use edit::Edit;
pub use mode::{OutputMode, TempoCvMode};
pub use ratio::{gcd, lcm, Ratio, MASTER_DIVIDE, MAX_DIVIDE, MAX_MULTIPLY};
pub use state::{ClockState, STATE_VERSION};

/// Most ratio channels an engine can drive (the master is extra).
pub const MAX_RATIO_CHANNELS: usize = 9;

/// Ratio channels plus the master.
pub const MAX_CHANNELS: usize = MAX_RATIO_CHANNELS + 1;

/// Gate high level and phasor full scale, in volts.
pub const FULL_SCALE_VOLTS: f32 = 10.0;
