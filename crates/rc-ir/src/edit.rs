//! Edit commands scheduled by a user interface against a running engine.
//!
//! Channel indices address ratio channels starting at 1; 0 is the master.

use crate::mode::{OutputMode, TempoCvMode};

/// An intent to change engine configuration.
///
/// Edits never touch timers or phases directly; those are derived by the
/// engine. A ratio edit marks the channel for resync at the next master tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edit {
    /// Nudge a channel's multiply by one.
    StepMultiply { channel: u8, up: bool },
    /// Nudge a channel's divide by one.
    StepDivide { channel: u8, up: bool },
    /// Replace a channel's ratio outright (clamped on entry).
    SetRatio { channel: u8, multiply: u8, divide: u8 },
    /// Realign one channel at the next master tick.
    Resync { channel: u8 },
    /// Realign every channel at the next master tick.
    ResyncAll,
    SetOutputMode(OutputMode),
    SetTempoCvMode(TempoCvMode),
    SetRunning(bool),
    ToggleRun,
    Reset,
}

