//! Audio monitoring backends for ratioclock.
//!
//! Lets the clock be heard: the controller converts engine outputs into
//! stereo monitor frames and streams them to the default device.

mod cpal_backend;
mod traits;

pub use cpal_backend::CpalOutput;
pub use traits::{AudioError, AudioOutput, MonitorFrame};
