//! Per-channel timer and phase.

use rc_ir::{OutputMode, Ratio, FULL_SCALE_VOLTS};

/// Default fraction of the period a gate stays high.
pub const DEFAULT_PULSE_WIDTH: f32 = 0.5;

/// Largest phase value ever reported.
const PHASE_CEILING: f64 = 1.0 - f64::EPSILON;

/// Voltages produced by one channel for one sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChannelOutput {
    /// Gate (0/10V) or phasor ramp (0-10V)
    pub voltage: f32,
    /// Complementary gate, or the phasor shifted by half a period
    pub inverted: f32,
    /// Light level in [0, 1]
    pub brightness: f32,
}

impl ChannelOutput {
    pub const SILENT: ChannelOutput = ChannelOutput {
        voltage: 0.0,
        inverted: 0.0,
        brightness: 0.0,
    };

    pub fn is_high(&self) -> bool {
        self.voltage > 0.0
    }
}

/// Timer state for one channel.
///
/// The timer only moves forward through [`ChannelPhase::advance`]; edits
/// change the ratio and schedule a resync but never touch the timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChannelPhase {
    ratio: Ratio,
    /// Seconds since this channel's last reset or rollover
    timer: f64,
    /// `timer / period`, in [0, 1)
    phase: f64,
    /// Reset at the next master tick instead of the next alignment boundary
    resync_requested: bool,
    /// Rollovers since the last reset
    cycles: u32,
}

impl ChannelPhase {
    pub fn new(ratio: Ratio) -> Self {
        Self {
            ratio,
            ..Self::default()
        }
    }

    #[inline]
    pub fn ratio(&self) -> Ratio {
        self.ratio
    }

    /// Replace the ratio and schedule a resync.
    pub fn set_ratio(&mut self, ratio: Ratio) {
        self.ratio = ratio;
        self.resync_requested = true;
    }

    pub fn request_resync(&mut self) {
        self.resync_requested = true;
    }

    #[inline]
    pub fn resync_requested(&self) -> bool {
        self.resync_requested
    }

    /// Zero the timer and drop any pending resync.
    pub fn reset(&mut self) {
        self.timer = 0.0;
        self.phase = 0.0;
        self.cycles = 0;
        self.resync_requested = false;
    }

    #[inline]
    pub fn timer(&self) -> f64 {
        self.timer
    }

    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// This channel's period for a given master period, in seconds.
    pub fn period_seconds(&self, tick_seconds: f64) -> f64 {
        let tick_seconds = if tick_seconds > 0.0 && tick_seconds.is_finite() {
            tick_seconds
        } else {
            1.0
        };
        tick_seconds / self.ratio.timing_value()
    }

    /// Advance the timer by `dt` seconds against `period` seconds.
    ///
    /// Returns true if the timer rolled over on this sample.
    ///
    /// A simplified `m:d` channel completes `m` cycles between realignments.
    /// The last of them ends on the realigning master tick, so a rollover
    /// that would complete it early holds the timer at the end of the cycle
    /// instead.
    pub fn advance(&mut self, dt: f64, period: f64) -> bool {
        let period = if period > 0.0 && period.is_finite() { period } else { 1.0 };
        self.timer += dt;

        let mut wrapped = false;
        if self.timer >= period && !self.on_last_cycle() {
            self.timer -= period;
            self.cycles += 1;
            wrapped = true;
            // Period shrank under the timer (tempo jump); fold without looping.
            if self.timer >= period {
                self.timer = libm::fmod(self.timer, period);
            }
        }
        self.phase = (self.timer / period).clamp(0.0, PHASE_CEILING);
        wrapped
    }

    fn on_last_cycle(&self) -> bool {
        let cycles_per_alignment = self.ratio.simplified().multiply() as u32;
        cycles_per_alignment > 0 && self.cycles + 1 >= cycles_per_alignment
    }

    /// Set the phase directly. Used for the master, which is sample-counted.
    pub fn set_phase(&mut self, phase: f64) {
        self.phase = phase.clamp(0.0, PHASE_CEILING);
    }

    /// Render the channel's voltages.
    ///
    /// Stopped, muted and disabled channels are silent in every mode.
    pub fn output(&self, mode: OutputMode, pulse_width: f32, running: bool) -> ChannelOutput {
        if !running || self.ratio.is_muted() || self.ratio.is_disabled() {
            return ChannelOutput::SILENT;
        }
        let phase = self.phase as f32;
        match mode {
            OutputMode::Gate => {
                let high = phase < pulse_width;
                ChannelOutput {
                    voltage: if high { FULL_SCALE_VOLTS } else { 0.0 },
                    inverted: if high { 0.0 } else { FULL_SCALE_VOLTS },
                    brightness: if high { 1.0 } else { 0.0 },
                }
            }
            OutputMode::Phasor => {
                let shifted = (phase + 0.5) % 1.0;
                ChannelOutput {
                    voltage: phase * FULL_SCALE_VOLTS,
                    inverted: shifted * FULL_SCALE_VOLTS,
                    brightness: phase,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(m: u8, d: u8) -> Ratio {
        Ratio::new(m, d, true)
    }

    #[test]
    fn period_scales_with_ratio() {
        let ch = ChannelPhase::new(ratio(3, 2));
        let period = ch.period_seconds(0.5);
        assert!((period - 0.5 * 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn period_guards_bad_master() {
        let ch = ChannelPhase::new(ratio(1, 1));
        assert_eq!(ch.period_seconds(0.0), 1.0);
        assert_eq!(ch.period_seconds(f64::NAN), 1.0);
    }

    #[test]
    fn advance_wraps_and_normalizes() {
        let mut ch = ChannelPhase::new(ratio(4, 1));
        assert!(!ch.advance(0.25, 1.0));
        assert!((ch.phase() - 0.25).abs() < 1e-12);
        assert!(!ch.advance(0.5, 1.0));
        assert!(ch.advance(0.5, 1.0));
        assert!((ch.timer() - 0.25).abs() < 1e-12);
        assert!(ch.phase() < 1.0);
    }

    #[test]
    fn advance_folds_when_period_shrinks() {
        let mut ch = ChannelPhase::new(ratio(4, 1));
        ch.advance(0.9, 1.0);
        assert!(ch.advance(0.0, 0.2));
        assert!(ch.timer() < 0.2);
        assert!(ch.phase() < 1.0);
    }

    #[test]
    fn last_cycle_holds_until_reset() {
        let mut ch = ChannelPhase::new(ratio(6, 4));
        // 6:4 simplifies to 3:2: three cycles between realignments.
        assert!(ch.advance(1.0, 1.0));
        assert!(ch.advance(1.0, 1.0));
        assert!(!ch.advance(1.0, 1.0));
        assert!(!ch.advance(0.5, 1.0));
        assert!(ch.phase() < 1.0);
        assert_eq!(ch.output(OutputMode::Gate, 0.5, true).voltage, 0.0);

        ch.reset();
        assert_eq!(ch.output(OutputMode::Gate, 0.5, true).voltage, FULL_SCALE_VOLTS);
        assert!(ch.advance(1.0, 1.0));
    }

    #[test]
    fn unity_never_rolls_over_between_ticks() {
        let mut ch = ChannelPhase::new(ratio(1, 1));
        assert!(!ch.advance(1.001, 1.0));
        assert_eq!(ch.output(OutputMode::Gate, 0.5, true).voltage, 0.0);
    }

    #[test]
    fn muted_channel_is_never_held() {
        let mut ch = ChannelPhase::new(ratio(0, 3));
        for _ in 0..5 {
            assert!(ch.advance(1.0, 1.0));
        }
    }

    #[test]
    fn set_ratio_schedules_resync_without_touching_timer() {
        let mut ch = ChannelPhase::new(ratio(1, 1));
        ch.advance(0.3, 1.0);
        ch.set_ratio(ratio(2, 1));
        assert!(ch.resync_requested());
        assert!((ch.timer() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut ch = ChannelPhase::new(ratio(1, 1));
        ch.advance(0.3, 1.0);
        ch.request_resync();
        ch.reset();
        ch.reset();
        assert_eq!(ch.timer(), 0.0);
        assert!(!ch.resync_requested());
    }

    #[test]
    fn gate_follows_pulse_width() {
        let mut ch = ChannelPhase::new(ratio(1, 1));
        ch.set_phase(0.2);
        assert_eq!(ch.output(OutputMode::Gate, 0.5, true).voltage, FULL_SCALE_VOLTS);
        assert_eq!(ch.output(OutputMode::Gate, 0.5, true).inverted, 0.0);
        ch.set_phase(0.7);
        assert_eq!(ch.output(OutputMode::Gate, 0.5, true).voltage, 0.0);
        assert_eq!(ch.output(OutputMode::Gate, 0.8, true).voltage, FULL_SCALE_VOLTS);
    }

    #[test]
    fn muted_disabled_and_stopped_are_silent() {
        let mut muted = ChannelPhase::new(ratio(0, 1));
        muted.set_phase(0.1);
        assert_eq!(muted.output(OutputMode::Gate, 0.5, true), ChannelOutput::SILENT);

        let mut disabled = ChannelPhase::new(ratio(1, 0));
        disabled.set_phase(0.1);
        assert_eq!(disabled.output(OutputMode::Phasor, 0.5, true), ChannelOutput::SILENT);

        let mut ch = ChannelPhase::new(ratio(1, 1));
        ch.set_phase(0.1);
        assert_eq!(ch.output(OutputMode::Gate, 0.5, false), ChannelOutput::SILENT);
    }

    #[test]
    fn phasor_and_inverted_companion() {
        let mut ch = ChannelPhase::new(ratio(1, 1));
        ch.set_phase(0.25);
        let out = ch.output(OutputMode::Phasor, 0.5, true);
        assert!((out.voltage - 2.5).abs() < 1e-5);
        assert!((out.inverted - 7.5).abs() < 1e-5);

        ch.set_phase(0.75);
        let out = ch.output(OutputMode::Phasor, 0.5, true);
        assert!((out.inverted - 2.5).abs() < 1e-5);
    }
}
