//! Per-sample clock engine for ratioclock.
//!
//! Derives a set of sub-clocks, each an integer multiply/divide of a shared
//! master tick, from either an external trigger stream or an internal tempo.
//! All state is fixed-size; `Engine::process` never allocates.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod alignment;
mod chain;
mod channel;
mod edit_queue;
mod engine;
mod io;
pub mod rotation;
pub mod swing;
pub mod timebase;
mod trigger;

pub use alignment::AlignmentScheduler;
pub use chain::{ChainEncoder, CHAIN_PULSE_SECONDS};
pub use channel::{ChannelOutput, ChannelPhase, DEFAULT_PULSE_WIDTH};
pub use edit_queue::{EditQueue, EDIT_QUEUE_CAPACITY};
pub use engine::{Engine, EngineConfig, BPM_PER_VOLT, CONTROL_INTERVAL};
pub use io::{Inputs, Outputs, Params, SWING_PERCENT_PER_VOLT};
pub use rotation::{quantize_rotation, RotationMap};
pub use swing::{SwingModulator, MAX_SWING};
pub use timebase::{MasterTimebase, MIN_BPM, MIN_SAMPLES_PER_TICK};
pub use trigger::{SchmittTrigger, TRIGGER_HIGH, TRIGGER_LOW};
