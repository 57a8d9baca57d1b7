//! Reserved voltages carried on the chain jack.
//!
//! One instance's chain output can drive another's clock input. Ordinary
//! ticks are 5V pulses; three higher levels carry transport commands.

/// A decoded or to-be-encoded chain event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChainSignal {
    /// Idle line (0V)
    #[default]
    None,
    /// Ordinary clock tick (5V)
    Pulse,
    /// Reset happened upstream (10.42V)
    Reset,
    /// Transport turned on upstream (10.69V)
    On,
    /// Transport turned off upstream (10.86V)
    Off,
}

/// Match window around each reserved level, in volts.
pub const CHAIN_TOLERANCE: f32 = 0.1;

/// Reserved command levels, lowest first. Decoding walks them in this
/// order, so on overlap the lowest level wins.
const COMMANDS: [ChainSignal; 3] = [ChainSignal::Reset, ChainSignal::On, ChainSignal::Off];

impl ChainSignal {
    /// Output level for this signal.
    pub const fn voltage(self) -> f32 {
        match self {
            ChainSignal::None => 0.0,
            ChainSignal::Pulse => 5.0,
            ChainSignal::Reset => 10.42,
            ChainSignal::On => 10.69,
            ChainSignal::Off => 10.86,
        }
    }

    /// Classify the voltage present on a rising edge.
    ///
    /// A voltage that matches no reserved level is an ordinary clock edge.
    pub fn decode(voltage: f32) -> Self {
        COMMANDS
            .iter()
            .copied()
            .find(|cmd| (voltage - cmd.voltage()).abs() <= CHAIN_TOLERANCE)
            .unwrap_or(ChainSignal::Pulse)
    }

    /// True for Reset/On/Off, which must never count as a clock edge.
    pub const fn is_command(self) -> bool {
        matches!(self, ChainSignal::Reset | ChainSignal::On | ChainSignal::Off)
    }
}
