//! Chain output encoding.
//!
//! Decoding lives with the voltage table in `rc_ir::ChainSignal`; this side
//! turns engine events into short pulses at the reserved levels.

use rc_ir::ChainSignal;

/// Length of a chain pulse in seconds.
pub const CHAIN_PULSE_SECONDS: f32 = 0.001;

fn priority(signal: ChainSignal) -> u8 {
    match signal {
        ChainSignal::None => 0,
        ChainSignal::Pulse => 1,
        ChainSignal::On | ChainSignal::Off => 2,
        ChainSignal::Reset => 3,
    }
}

/// Emits chain events as pulses of fixed length.
///
/// While a pulse is on the wire, a lower-priority event is dropped and an
/// equal or higher one replaces it. Reset outranks On/Off, which outrank
/// ordinary ticks.
#[derive(Clone, Copy, Debug)]
pub struct ChainEncoder {
    current: ChainSignal,
    remaining: u32,
    pulse_samples: u32,
}

impl ChainEncoder {
    pub fn new(sample_rate: f32) -> Self {
        let pulse = libm::roundf(sample_rate * CHAIN_PULSE_SECONDS);
        Self {
            current: ChainSignal::None,
            remaining: 0,
            pulse_samples: if pulse >= 1.0 { pulse as u32 } else { 1 },
        }
    }

    /// Queue a signal to start on the next output sample.
    pub fn emit(&mut self, signal: ChainSignal) {
        if signal == ChainSignal::None {
            return;
        }
        if self.remaining == 0 || priority(signal) >= priority(self.current) {
            self.current = signal;
            self.remaining = self.pulse_samples;
        }
    }

    /// Voltage for this sample.
    #[inline]
    pub fn next_voltage(&mut self) -> f32 {
        if self.remaining == 0 {
            return 0.0;
        }
        let voltage = self.current.voltage();
        self.remaining -= 1;
        if self.remaining == 0 {
            self.current = ChainSignal::None;
        }
        voltage
    }

    pub fn pulse_samples(&self) -> u32 {
        self.pulse_samples
    }

    /// Signal currently on the wire.
    pub fn current(&self) -> ChainSignal {
        self.current
    }
}
