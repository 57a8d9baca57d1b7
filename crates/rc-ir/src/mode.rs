//! Output and control interpretation modes.

/// What a channel output carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// 10V while phase is below the pulse width, 0V otherwise
    #[default]
    Gate,
    /// The phase itself as a 0-10V ramp
    Phasor,
}

/// How the tempo CV input modifies the tempo knob.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TempoCvMode {
    /// Each volt doubles the tempo
    VoltPerOctave,
    /// Each volt adds a fixed number of BPM
    #[default]
    BpmOffset,
}
