//! Master tick period estimation.
//!
//! The master runs either from an internal tempo or from the spacing of
//! external clock edges. Either way the period is an integer number of
//! samples, committed only at a master tick boundary.

use rc_ir::MAX_MULTIPLY;

/// Slowest tempo accepted, in BPM.
pub const MIN_BPM: f64 = 1.0;

/// Shortest period any channel may have, in samples.
pub const MIN_CHANNEL_PERIOD_SAMPLES: u32 = 2;

/// Shortest master period, so that a channel at the highest multiply
/// still spans [`MIN_CHANNEL_PERIOD_SAMPLES`].
pub const MIN_SAMPLES_PER_TICK: u32 = MIN_CHANNEL_PERIOD_SAMPLES * MAX_MULTIPLY as u32;

/// Tempo assumed before anything has been measured.
pub const DEFAULT_BPM: f64 = 120.0;

/// Estimates and counts the master tick.
#[derive(Clone, Debug)]
pub struct MasterTimebase {
    sample_rate: f64,
    /// Committed master period in samples
    samples_per_tick: u32,
    /// Sub-sample remainder carried between internal ticks
    fractional_error: f64,
    /// Samples since the last master tick
    sample_counter: u32,
    /// Set once the arming pulse (or first internal sample) has been seen
    first_pulse_received: bool,
    /// Master ticks emitted since the last reset
    ticks: u64,
}

impl MasterTimebase {
    /// Create a timebase for the given sample rate, in the first-pulse state.
    pub fn new(sample_rate: f32) -> Self {
        let sample_rate = if sample_rate.is_finite() && sample_rate >= 1.0 {
            sample_rate as f64
        } else {
            1.0
        };
        let mut timebase = Self {
            sample_rate,
            samples_per_tick: MIN_SAMPLES_PER_TICK,
            fractional_error: 0.0,
            sample_counter: 0,
            first_pulse_received: false,
            ticks: 0,
        };
        let initial = libm::floor(timebase.exact_samples_per_tick(DEFAULT_BPM)) as u32;
        timebase.samples_per_tick = initial.max(MIN_SAMPLES_PER_TICK);
        timebase
    }

    /// Return to the first-pulse state. The last period estimate is kept.
    pub fn reset(&mut self) {
        self.fractional_error = 0.0;
        self.sample_counter = 0;
        self.first_pulse_received = false;
        self.ticks = 0;
    }

    /// Highest tempo that keeps every channel period above the floor.
    pub fn max_bpm(&self) -> f64 {
        self.sample_rate * 60.0 / MIN_SAMPLES_PER_TICK as f64
    }

    /// Clamp a tempo into the safe range. NaN becomes [`MIN_BPM`]; infinities
    /// saturate to the nearer bound.
    pub fn clamp_bpm(&self, bpm: f64) -> f64 {
        if bpm.is_nan() {
            return MIN_BPM;
        }
        bpm.clamp(MIN_BPM, self.max_bpm())
    }

    /// Fractional samples per tick for a tempo.
    pub fn exact_samples_per_tick(&self, bpm: f64) -> f64 {
        self.sample_rate * 60.0 / self.clamp_bpm(bpm)
    }

    /// Advance one sample against an internal tempo.
    ///
    /// The first sample after a reset is itself a master tick. Returns the
    /// zero-based index of the tick emitted on this sample, if any.
    pub fn step_internal(&mut self, bpm: f64) -> Option<u64> {
        if !self.first_pulse_received {
            self.first_pulse_received = true;
            self.sample_counter = 0;
            self.commit_internal(bpm);
            return Some(self.emit_tick());
        }

        self.sample_counter = self.sample_counter.saturating_add(1);
        if self.sample_counter >= self.samples_per_tick {
            self.sample_counter = 0;
            self.commit_internal(bpm);
            return Some(self.emit_tick());
        }
        None
    }

    /// Advance one sample while following an external clock.
    ///
    /// `edge` is true when a rising clock edge arrived on this sample. The
    /// first edge after a reset only arms the counter; the interval is
    /// measured from the second edge onward.
    pub fn step_external(&mut self, edge: bool) -> Option<u64> {
        if self.first_pulse_received {
            self.sample_counter = self.sample_counter.saturating_add(1);
        }
        if !edge {
            return None;
        }
        if !self.first_pulse_received {
            self.first_pulse_received = true;
            self.sample_counter = 0;
            return None;
        }
        self.samples_per_tick = self.sample_counter.max(MIN_SAMPLES_PER_TICK);
        self.sample_counter = 0;
        Some(self.emit_tick())
    }

    /// Pick the next tick length, carrying the truncated remainder so the
    /// long-run average matches the exact period.
    fn commit_internal(&mut self, bpm: f64) {
        let exact = self.exact_samples_per_tick(bpm);
        let whole = libm::floor(exact);
        self.fractional_error += exact - whole;

        let mut length = whole;
        if self.fractional_error >= 1.0 {
            length += 1.0;
            self.fractional_error -= 1.0;
        } else if self.fractional_error <= -1.0 {
            length -= 1.0;
            self.fractional_error += 1.0;
        }
        self.samples_per_tick = (length as u32).max(MIN_SAMPLES_PER_TICK);
    }

    fn emit_tick(&mut self) -> u64 {
        let index = self.ticks;
        self.ticks += 1;
        index
    }

    /// Committed master period in samples.
    #[inline]
    pub fn samples_per_tick(&self) -> u32 {
        self.samples_per_tick
    }

    /// Committed master period in seconds.
    #[inline]
    pub fn tick_seconds(&self) -> f64 {
        self.samples_per_tick as f64 / self.sample_rate
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Master ticks emitted since the last reset.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// True once a master tick has been emitted, i.e. a valid period exists.
    #[inline]
    pub fn has_ticked(&self) -> bool {
        self.ticks > 0
    }

    pub fn first_pulse_received(&self) -> bool {
        self.first_pulse_received
    }

    /// Position within the current master tick, in [0, 1).
    pub fn phase(&self) -> f64 {
        let phase = self.sample_counter as f64 / self.samples_per_tick as f64;
        phase.min(1.0 - f64::EPSILON)
    }
}
