//! Per-sample control values and outputs.

use rc_ir::{ChainSignal, MAX_RATIO_CHANNELS};

use crate::channel::{ChannelOutput, DEFAULT_PULSE_WIDTH};

/// Swing percent added per volt of swing CV.
pub const SWING_PERCENT_PER_VOLT: f32 = 10.0;

/// Knob and CV values. Everything is clamped by the engine on use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Params {
    /// Internal tempo in BPM
    pub bpm: f32,
    /// Tempo CV in volts, interpreted per `TempoCvMode`
    pub tempo_cv: f32,
    /// Rotation knob, in slots
    pub rotation: f32,
    /// Rotation CV, one slot per volt
    pub rotation_cv: f32,
    /// Swing knob in percent
    pub swing: f32,
    /// Swing CV in volts
    pub swing_cv: f32,
    /// Gate width as a fraction of the period
    pub pulse_width: f32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            tempo_cv: 0.0,
            rotation: 0.0,
            rotation_cv: 0.0,
            swing: 0.0,
            swing_cv: 0.0,
            pulse_width: DEFAULT_PULSE_WIDTH,
        }
    }
}

impl Params {
    pub fn with_bpm(bpm: f32) -> Self {
        Self { bpm, ..Self::default() }
    }

    /// Swing in percent, knob plus CV.
    pub fn swing_percent(&self) -> f32 {
        self.swing + self.swing_cv * SWING_PERCENT_PER_VOLT
    }

    /// Rotation in slots, knob plus CV.
    pub fn rotation_amount(&self) -> f32 {
        self.rotation + self.rotation_cv
    }

    /// Pulse width clamped to [0, 1]; non-finite values fall back to the default.
    pub fn clamped_pulse_width(&self) -> f32 {
        if self.pulse_width.is_finite() {
            self.pulse_width.clamp(0.0, 1.0)
        } else {
            DEFAULT_PULSE_WIDTH
        }
    }
}

/// Jack voltages for one sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Inputs {
    /// External clock/chain input. `None` when unpatched, which selects the
    /// internal tempo.
    pub clock: Option<f32>,
    /// Reset trigger
    pub reset: f32,
    /// Run toggle trigger
    pub run: f32,
}

impl Inputs {
    /// Unpatched clock, idle triggers.
    pub const INTERNAL: Inputs = Inputs {
        clock: None,
        reset: 0.0,
        run: 0.0,
    };

    pub fn external(clock: f32) -> Self {
        Self {
            clock: Some(clock),
            ..Self::default()
        }
    }
}

/// Everything the engine produces for one sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Outputs {
    pub master: ChannelOutput,
    /// Physical ratio outputs, after rotation. Entries past the channel
    /// count stay silent.
    pub channels: [ChannelOutput; MAX_RATIO_CHANNELS],
    /// Encoded chain voltage
    pub chain: f32,
    /// A master tick happened on this sample
    pub tick: bool,
    /// What was decoded from a clock edge on this sample, if any
    pub received: ChainSignal,
}
