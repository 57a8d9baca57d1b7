//! Schmitt-style edge detection for trigger inputs.

/// Rising-edge threshold in volts.
pub const TRIGGER_HIGH: f32 = 1.0;

/// Re-arm threshold in volts.
pub const TRIGGER_LOW: f32 = 0.9;

/// Edge detector with hysteresis.
///
/// Fires once when the input crosses [`TRIGGER_HIGH`] and stays quiet until
/// the input has fallen back below [`TRIGGER_LOW`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SchmittTrigger {
    high: bool,
}

impl SchmittTrigger {
    pub const fn new() -> Self {
        Self { high: false }
    }

    /// Feed one sample. Returns true on a rising edge.
    #[inline]
    pub fn process(&mut self, voltage: f32) -> bool {
        if self.high {
            if voltage <= TRIGGER_LOW {
                self.high = false;
            }
            false
        } else if voltage >= TRIGGER_HIGH {
            self.high = true;
            true
        } else {
            false
        }
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    pub fn reset(&mut self) {
        self.high = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_pulse() {
        let mut t = SchmittTrigger::new();
        assert!(t.process(5.0));
        assert!(!t.process(5.0));
        assert!(!t.process(5.0));
        assert!(!t.process(0.0));
        assert!(t.process(5.0));
    }

    #[test]
    fn hysteresis_band_suppresses_chatter() {
        let mut t = SchmittTrigger::new();
        assert!(t.process(1.0));
        // Dips that stay above the low threshold do not re-arm.
        assert!(!t.process(0.95));
        assert!(!t.process(1.05));
        assert!(!t.process(0.5));
        assert!(t.process(1.05));
    }

    #[test]
    fn below_high_threshold_never_fires() {
        let mut t = SchmittTrigger::new();
        for _ in 0..10 {
            assert!(!t.process(0.95));
            assert!(!t.process(0.0));
        }
    }
}
