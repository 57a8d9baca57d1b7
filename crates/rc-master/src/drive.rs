//! Clock sources for offline rendering.

use rc_engine::Inputs;

/// Where the master tick comes from during a render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClockDrive {
    /// Clock input unpatched; the tempo parameter drives the master.
    Internal,
    /// A synthetic 5V trigger train at `bpm` on the clock input.
    External { bpm: f32 },
}

/// Trigger train with fractional-sample spacing.
#[derive(Clone, Debug)]
pub struct PulseTrain {
    interval: f64,
    /// Samples until the next pulse starts
    countdown: f64,
    pulse_samples: u32,
    high_remaining: u32,
}

impl PulseTrain {
    pub fn new(sample_rate: u32, bpm: f32) -> Self {
        let bpm = if bpm.is_finite() && bpm > 0.0 { bpm as f64 } else { 120.0 };
        Self {
            interval: sample_rate as f64 * 60.0 / bpm,
            countdown: 0.0,
            pulse_samples: (sample_rate / 1000).max(1),
            high_remaining: 0,
        }
    }

    /// Voltage for the next sample.
    pub fn next_voltage(&mut self) -> f32 {
        if self.countdown <= 0.0 {
            self.countdown += self.interval;
            self.high_remaining = self.pulse_samples;
        }
        self.countdown -= 1.0;
        if self.high_remaining > 0 {
            self.high_remaining -= 1;
            5.0
        } else {
            0.0
        }
    }
}

/// Per-sample inputs for a drive.
pub(crate) struct DriveInputs {
    train: Option<PulseTrain>,
}

impl DriveInputs {
    pub(crate) fn new(drive: ClockDrive, sample_rate: u32) -> Self {
        let train = match drive {
            ClockDrive::Internal => None,
            ClockDrive::External { bpm } => Some(PulseTrain::new(sample_rate, bpm)),
        };
        Self { train }
    }

    pub(crate) fn next_inputs(&mut self) -> Inputs {
        match &mut self.train {
            Some(train) => Inputs::external(train.next_voltage()),
            None => Inputs::INTERNAL,
        }
    }
}
