//! Persisted clock configuration.
//!
//! Only steady-state configuration is stored. Timers and phases are
//! rebuilt from scratch when a state is restored.

use alloc::vec::Vec;

use crate::mode::{OutputMode, TempoCvMode};
use crate::ratio::Ratio;

/// Current layout version of [`ClockState`].
pub const STATE_VERSION: u32 = 1;

/// Everything needed to reconstruct an engine's steady-state behavior.
///
/// `multiply[i]`/`divide[i]` describe ratio channel `i + 1`. Missing entries
/// read as 1:1 and extra entries are ignored by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClockState {
    pub version: u32,
    pub multiply: Vec<u8>,
    pub divide: Vec<u8>,
    pub sequence_running: bool,
    pub phasor_mode: bool,
    /// Tempo CV is V/oct when set, a BPM offset otherwise.
    pub cv_volt_per_octave: bool,
}

impl Default for ClockState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            multiply: Vec::new(),
            divide: Vec::new(),
            sequence_running: false,
            phasor_mode: false,
            cv_volt_per_octave: false,
        }
    }
}

impl ClockState {
    /// A stopped state with `channels` ratio channels at 1:1.
    pub fn with_channels(channels: usize) -> Self {
        Self {
            multiply: alloc::vec![1; channels],
            divide: alloc::vec![1; channels],
            ..Self::default()
        }
    }

    /// Ratio stored for zero-based ratio slot `slot`, clamped on read.
    pub fn ratio(&self, slot: usize, allow_disable: bool) -> Ratio {
        let multiply = self.multiply.get(slot).copied().unwrap_or(1);
        let divide = self.divide.get(slot).copied().unwrap_or(1);
        Ratio::new(multiply, divide, allow_disable)
    }

    /// Store a ratio for zero-based slot `slot`, growing the arrays with 1:1 as needed.
    pub fn set_ratio(&mut self, slot: usize, ratio: Ratio) {
        if self.multiply.len() <= slot {
            self.multiply.resize(slot + 1, 1);
        }
        if self.divide.len() <= slot {
            self.divide.resize(slot + 1, 1);
        }
        self.multiply[slot] = ratio.multiply();
        self.divide[slot] = ratio.divide();
    }

    pub fn output_mode(&self) -> OutputMode {
        if self.phasor_mode {
            OutputMode::Phasor
        } else {
            OutputMode::Gate
        }
    }

    pub fn tempo_cv_mode(&self) -> TempoCvMode {
        if self.cv_volt_per_octave {
            TempoCvMode::VoltPerOctave
        } else {
            TempoCvMode::BpmOffset
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_slots_read_as_unity() {
        let state = ClockState::default();
        assert_eq!(state.ratio(4, true), Ratio::UNITY);
    }

    #[test]
    fn stored_values_are_clamped_on_read() {
        let mut state = ClockState::with_channels(2);
        state.multiply[0] = 250;
        state.divide[1] = 0;
        assert_eq!(state.ratio(0, true).multiply(), crate::MAX_MULTIPLY);
        assert!(state.ratio(1, true).is_disabled());
        assert_eq!(state.ratio(1, false).divide(), 1);
    }

    #[test]
    fn set_ratio_grows_arrays() {
        let mut state = ClockState::default();
        state.set_ratio(2, Ratio::new(3, 2, false));
        assert_eq!(state.multiply, alloc::vec![1, 1, 3]);
        assert_eq!(state.divide, alloc::vec![1, 1, 2]);
    }

    #[test]
    fn flags_map_to_modes() {
        let state = ClockState {
            phasor_mode: true,
            cv_volt_per_octave: true,
            ..ClockState::default()
        };
        assert_eq!(state.output_mode(), OutputMode::Phasor);
        assert_eq!(state.tempo_cv_mode(), TempoCvMode::VoltPerOctave);
    }
}
