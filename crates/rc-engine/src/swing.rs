//! Swing: a sinusoidal warp of channel time over a two-tick window.
//!
//! The multiplier `1 + s * cos(2π φ)` integrates to 1 over a full window,
//! so the average tempo over every pair of master ticks is unchanged.

use core::f64::consts::TAU;

/// Largest swing magnitude, in percent. Keeps the multiplier positive.
pub const MAX_SWING: f64 = 99.0;

/// Time dilation applied to channel timers (never to the master).
#[derive(Clone, Copy, Debug, Default)]
pub struct SwingModulator {
    /// Swing amount in percent, within ±[`MAX_SWING`]
    amount: f64,
    /// Samples since the start of the current two-tick window
    window_samples: u32,
}

impl SwingModulator {
    pub const fn new() -> Self {
        Self {
            amount: 0.0,
            window_samples: 0,
        }
    }

    /// Set the swing amount in percent. Out-of-range values are clamped,
    /// non-finite ones read as no swing.
    pub fn set_amount(&mut self, percent: f64) {
        self.amount = if percent.is_finite() {
            percent.clamp(-MAX_SWING, MAX_SWING)
        } else {
            0.0
        };
    }

    #[inline]
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Restart the window on every second master tick.
    pub fn on_master_tick(&mut self, tick_index: u64) {
        if tick_index % 2 == 0 {
            self.window_samples = 0;
        }
    }

    pub fn reset(&mut self) {
        self.window_samples = 0;
    }

    /// Position within the two-tick window, in [0, 1).
    pub fn phase(&self, samples_per_tick: u32) -> f64 {
        let window = 2.0 * samples_per_tick.max(1) as f64;
        (self.window_samples as f64 / window).min(1.0 - f64::EPSILON)
    }

    /// Multiplier for the current sample. Always strictly positive.
    pub fn factor(&self, samples_per_tick: u32) -> f64 {
        if self.amount == 0.0 {
            return 1.0;
        }
        let phase = self.phase(samples_per_tick);
        1.0 + (self.amount / 100.0) * libm::cos(TAU * phase)
    }

    /// Multiplier for the current sample, then step the window forward.
    #[inline]
    pub fn next_factor(&mut self, samples_per_tick: u32) -> f64 {
        let factor = self.factor(samples_per_tick);
        self.window_samples = self.window_samples.saturating_add(1);
        factor
    }
}
