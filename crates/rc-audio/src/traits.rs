//! Monitor output trait, frame and error types.

use thiserror::Error;

/// One stereo sample sent to the monitor device, in [-1, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MonitorFrame {
    pub left: f32,
    pub right: f32,
}

impl MonitorFrame {
    /// Scale two control voltages (±10V full scale) into monitor range.
    pub fn from_volts(left: f32, right: f32, gain: f32) -> Self {
        Self {
            left: (left / 10.0 * gain).clamp(-1.0, 1.0),
            right: (right / 10.0 * gain).clamp(-1.0, 1.0),
        }
    }
}

/// Error type for audio operations.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("device init error: {0}")]
    DeviceInit(String),
    #[error("stream create error: {0}")]
    StreamCreate(String),
    #[error("playback error: {0}")]
    Playback(String),
}

/// Trait for monitor output backends.
pub trait AudioOutput {
    /// Device sample rate; the engine must run at this rate.
    fn sample_rate(&self) -> u32;

    fn start(&mut self) -> Result<(), AudioError>;

    fn stop(&mut self) -> Result<(), AudioError>;
}
