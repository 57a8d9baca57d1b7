//! The clock engine.
//!
//! Owns every piece of timing state and advances it one sample at a time.
//! Within a sample the master tick is resolved first (timebase, alignment,
//! swing window, rotation commit), then outputs are rendered, then channel
//! timers advance. A reset scheduled on a tick is therefore visible on that
//! same sample.

use alloc::vec::Vec;
use rc_ir::{
    ChainSignal, ClockState, Edit, OutputMode, Ratio, TempoCvMode, MAX_CHANNELS,
    MAX_RATIO_CHANNELS, STATE_VERSION,
};

use crate::alignment::AlignmentScheduler;
use crate::chain::ChainEncoder;
use crate::channel::ChannelPhase;
use crate::edit_queue::EditQueue;
use crate::io::{Inputs, Outputs, Params};
use crate::rotation::{quantize_rotation, RotationMap};
use crate::swing::SwingModulator;
use crate::timebase::MasterTimebase;
use crate::trigger::SchmittTrigger;

/// Queued edits are drained once every this many frames.
pub const CONTROL_INTERVAL: u32 = 32;

/// BPM added per volt of tempo CV in offset mode.
pub const BPM_PER_VOLT: f64 = 10.0;

/// Construction-time engine settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Number of ratio channels, excluding the master
    pub channel_count: usize,
    /// Whether a divide of 0 (channel off) is allowed
    pub allow_disable: bool,
}

impl EngineConfig {
    pub fn new(sample_rate: f32, channel_count: usize) -> Self {
        Self {
            sample_rate,
            channel_count,
            allow_disable: true,
        }
    }

    /// The same settings with `channel_count` limited to `1..=MAX_RATIO_CHANNELS`.
    pub fn clamped(self) -> Self {
        Self {
            channel_count: self.channel_count.clamp(1, MAX_RATIO_CHANNELS),
            ..self
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(48_000.0, 8)
    }
}

/// Rational multi-channel clock.
pub struct Engine {
    config: EngineConfig,
    timebase: MasterTimebase,
    clock_trigger: SchmittTrigger,
    reset_trigger: SchmittTrigger,
    run_trigger: SchmittTrigger,
    /// Clock input patched on the previous sample
    external: bool,
    /// Index 0 is the master, 1..=channel_count the ratio channels
    channels: [ChannelPhase; MAX_CHANNELS],
    alignment: AlignmentScheduler,
    swing: SwingModulator,
    /// Committed at master ticks only
    rotation: RotationMap,
    chain: ChainEncoder,
    edits: EditQueue,
    control_counter: u32,
    running: bool,
    output_mode: OutputMode,
    tempo_cv_mode: TempoCvMode,
}

impl Engine {
    /// Create a stopped engine with every ratio channel at 1:1.
    pub fn new(config: EngineConfig) -> Self {
        let config = config.clamped();
        Self {
            config,
            timebase: MasterTimebase::new(config.sample_rate),
            clock_trigger: SchmittTrigger::new(),
            reset_trigger: SchmittTrigger::new(),
            run_trigger: SchmittTrigger::new(),
            external: false,
            channels: [ChannelPhase::new(Ratio::UNITY); MAX_CHANNELS],
            alignment: AlignmentScheduler::new(),
            swing: SwingModulator::new(),
            rotation: RotationMap::identity(config.channel_count),
            chain: ChainEncoder::new(config.sample_rate),
            edits: EditQueue::new(),
            control_counter: 0,
            running: false,
            output_mode: OutputMode::Gate,
            tempo_cv_mode: TempoCvMode::BpmOffset,
        }
    }

    /// Create an engine from a persisted state.
    pub fn from_state(config: EngineConfig, state: &ClockState) -> Self {
        let mut engine = Self::new(config);
        engine.restore(state);
        engine
    }

    // --- Per-sample processing ---

    /// Advance one sample.
    pub fn process(&mut self, params: &Params, inputs: &Inputs) -> Outputs {
        if self.control_counter == 0 {
            self.drain_edits();
        }
        self.control_counter = (self.control_counter + 1) % CONTROL_INTERVAL;

        if self.reset_trigger.process(inputs.reset) {
            self.reset();
        }
        if self.run_trigger.process(inputs.run) {
            self.set_running(!self.running);
        }

        let mut out = Outputs::default();
        if let Some(index) = self.resolve_master(params, inputs, &mut out.received) {
            self.on_master_tick(index, params);
            out.tick = true;
        }
        self.channels[0].set_phase(self.timebase.phase());

        self.render(params, &mut out);
        self.advance_channels(params);
        out
    }

    /// Render `frames` samples with the clock unpatched (allocates; offline use).
    pub fn render_frames(&mut self, params: &Params, frames: usize) -> Vec<Outputs> {
        (0..frames)
            .map(|_| self.process(params, &Inputs::INTERNAL))
            .collect()
    }

    /// Decode the clock input and step the timebase. Returns the index of a
    /// master tick emitted on this sample.
    fn resolve_master(
        &mut self,
        params: &Params,
        inputs: &Inputs,
        received: &mut ChainSignal,
    ) -> Option<u64> {
        let external = inputs.clock.is_some();
        if external != self.external {
            self.external = external;
            self.timebase.reset();
            self.clock_trigger.reset();
        }

        let mut edge = false;
        if let Some(voltage) = inputs.clock {
            if self.clock_trigger.process(voltage) {
                let signal = ChainSignal::decode(voltage);
                *received = signal;
                // Commands never count as clock edges, but the sample still
                // counts toward the interval being measured.
                match signal {
                    ChainSignal::Reset => self.reset(),
                    ChainSignal::On => self.set_running(true),
                    ChainSignal::Off => self.set_running(false),
                    ChainSignal::Pulse | ChainSignal::None => edge = true,
                }
            }
        }

        if !self.running {
            return None;
        }
        if external {
            self.timebase.step_external(edge)
        } else {
            self.timebase.step_internal(self.effective_bpm(params))
        }
    }

    fn on_master_tick(&mut self, index: u64, params: &Params) {
        let n = self.config.channel_count;
        self.alignment.on_master_tick(index, &mut self.channels[..=n]);
        self.swing.on_master_tick(index);
        self.commit_rotation(params);
        self.chain.emit(ChainSignal::Pulse);
    }

    /// Replace the rotation map in one step from the current control value.
    fn commit_rotation(&mut self, params: &Params) {
        let n = self.config.channel_count;
        let amount = quantize_rotation(params.rotation_amount(), n);
        let mut enabled = [false; MAX_RATIO_CHANNELS];
        for (output, flag) in enabled.iter_mut().enumerate().take(n) {
            *flag = !self.channels[output + 1].ratio().is_disabled();
        }
        self.rotation = RotationMap::identity(n).rotated_among(amount, &enabled[..n]);
    }

    fn render(&mut self, params: &Params, out: &mut Outputs) {
        let clocking = self.is_clocking();
        let pulse_width = params.clamped_pulse_width();

        out.master = self.channels[0].output(self.output_mode, pulse_width, clocking);
        for output in 0..self.config.channel_count {
            let slot = self.rotation.slot_for_output(output);
            out.channels[output] =
                self.channels[slot + 1].output(self.output_mode, pulse_width, clocking);
        }
        out.chain = self.chain.next_voltage();
    }

    fn advance_channels(&mut self, params: &Params) {
        self.swing.set_amount(params.swing_percent() as f64);
        if !self.is_clocking() {
            return;
        }

        let samples_per_tick = self.timebase.samples_per_tick();
        let dt = self.swing.next_factor(samples_per_tick) / self.timebase.sample_rate();
        let tick_seconds = self.timebase.tick_seconds();

        let n = self.config.channel_count;
        for channel in self.channels[1..=n].iter_mut() {
            if channel.ratio().is_disabled() {
                continue;
            }
            let period = channel.period_seconds(tick_seconds);
            channel.advance(dt, period);
        }
    }

    /// Tempo after CV, clamped to the safe range.
    pub fn effective_bpm(&self, params: &Params) -> f64 {
        let bpm = params.bpm as f64;
        let cv = params.tempo_cv as f64;
        let bpm = match self.tempo_cv_mode {
            TempoCvMode::VoltPerOctave => bpm * libm::exp2(cv),
            TempoCvMode::BpmOffset => bpm + cv * BPM_PER_VOLT,
        };
        self.timebase.clamp_bpm(bpm)
    }

    // --- Transport ---

    /// Zero every timer and return the master to its first-pulse state.
    pub fn reset(&mut self) {
        self.timebase.reset();
        for channel in self.channels.iter_mut() {
            channel.reset();
        }
        self.swing.reset();
        self.alignment = AlignmentScheduler::new();
        self.chain.emit(ChainSignal::Reset);
    }

    /// Start or stop the transport. A change restarts timing from scratch.
    pub fn set_running(&mut self, running: bool) {
        if running == self.running {
            return;
        }
        self.running = running;
        self.timebase.reset();
        for channel in self.channels.iter_mut() {
            channel.reset();
        }
        self.swing.reset();
        self.chain.emit(if running { ChainSignal::On } else { ChainSignal::Off });
    }

    // --- Edits ---

    /// Apply an edit now. Must not be called from inside `process`.
    pub fn apply_edit(&mut self, edit: Edit) {
        let allow_disable = self.config.allow_disable;
        match edit {
            Edit::StepMultiply { channel, up } => {
                self.edit_ratio(channel, |r| r.step_multiply(up));
            }
            Edit::StepDivide { channel, up } => {
                self.edit_ratio(channel, |r| r.step_divide(up, allow_disable));
            }
            Edit::SetRatio {
                channel,
                multiply,
                divide,
            } => {
                self.edit_ratio(channel, |_| Ratio::new(multiply, divide, allow_disable));
            }
            Edit::Resync { channel } => {
                if let Some(ch) = self.ratio_channel_mut(channel) {
                    ch.request_resync();
                }
            }
            Edit::ResyncAll => {
                let n = self.config.channel_count;
                for channel in self.channels[1..=n].iter_mut() {
                    channel.request_resync();
                }
            }
            Edit::SetOutputMode(mode) => self.output_mode = mode,
            Edit::SetTempoCvMode(mode) => self.tempo_cv_mode = mode,
            Edit::SetRunning(running) => self.set_running(running),
            Edit::ToggleRun => self.set_running(!self.running),
            Edit::Reset => self.reset(),
        }
    }

    /// Queue an edit for the next control-rate poll. Hands the edit back
    /// when the queue is full.
    pub fn push_edit(&mut self, edit: Edit) -> Result<(), Edit> {
        self.edits.push(edit)
    }

    fn drain_edits(&mut self) {
        while let Some(edit) = self.edits.pop() {
            self.apply_edit(edit);
        }
    }

    fn edit_ratio(&mut self, channel: u8, f: impl FnOnce(Ratio) -> Ratio) {
        if let Some(ch) = self.ratio_channel_mut(channel) {
            let next = f(ch.ratio());
            ch.set_ratio(next);
        }
    }

    /// Ratio channel by index (1-based). The master and out-of-range indices
    /// are not editable.
    fn ratio_channel_mut(&mut self, channel: u8) -> Option<&mut ChannelPhase> {
        let index = channel as usize;
        if index == 0 || index > self.config.channel_count {
            return None;
        }
        Some(&mut self.channels[index])
    }

    fn channel(&self, channel: usize) -> Option<&ChannelPhase> {
        if channel > self.config.channel_count {
            return None;
        }
        self.channels.get(channel)
    }

    // --- Persistence ---

    /// Capture the steady-state configuration.
    pub fn snapshot(&self) -> ClockState {
        let n = self.config.channel_count;
        let ratios = &self.channels[1..=n];
        ClockState {
            version: STATE_VERSION,
            multiply: ratios.iter().map(|c| c.ratio().multiply()).collect(),
            divide: ratios.iter().map(|c| c.ratio().divide()).collect(),
            sequence_running: self.running,
            phasor_mode: self.output_mode == OutputMode::Phasor,
            cv_volt_per_octave: self.tempo_cv_mode == TempoCvMode::VoltPerOctave,
        }
    }

    /// Rebuild configuration from a state. Timers restart from idle.
    pub fn restore(&mut self, state: &ClockState) {
        let allow_disable = self.config.allow_disable;
        self.channels = [ChannelPhase::new(Ratio::UNITY); MAX_CHANNELS];
        for slot in 0..self.config.channel_count {
            self.channels[slot + 1] = ChannelPhase::new(state.ratio(slot, allow_disable));
        }
        self.output_mode = state.output_mode();
        self.tempo_cv_mode = state.tempo_cv_mode();
        self.running = state.sequence_running;

        self.timebase.reset();
        self.clock_trigger.reset();
        self.swing.reset();
        self.alignment = AlignmentScheduler::new();
        self.rotation = RotationMap::identity(self.config.channel_count);
        self.edits.clear();
        self.control_counter = 0;
    }

    // --- Read access ---

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn channel_count(&self) -> usize {
        self.config.channel_count
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Running with a valid master period.
    pub fn is_clocking(&self) -> bool {
        self.running && self.timebase.has_ticked()
    }

    /// Following an external clock on the last sample.
    pub fn is_external(&self) -> bool {
        self.external
    }

    /// Master ticks since the last reset or transport change.
    pub fn master_ticks(&self) -> u64 {
        self.timebase.ticks()
    }

    pub fn samples_per_tick(&self) -> u32 {
        self.timebase.samples_per_tick()
    }

    pub fn timebase(&self) -> &MasterTimebase {
        &self.timebase
    }

    /// Ratio of a channel (0 is the master).
    pub fn ratio(&self, channel: usize) -> Option<Ratio> {
        self.channel(channel).map(|c| c.ratio())
    }

    /// Phase of a logical channel (0 is the master).
    pub fn phase(&self, channel: usize) -> Option<f64> {
        self.channel(channel).map(|c| c.phase())
    }

    pub fn timer(&self, channel: usize) -> Option<f64> {
        self.channel(channel).map(|c| c.timer())
    }

    pub fn resync_pending(&self, channel: usize) -> bool {
        self.channel(channel).is_some_and(|c| c.resync_requested())
    }

    /// Committed slot-to-output mapping.
    pub fn rotation(&self) -> &RotationMap {
        &self.rotation
    }

    /// Channels realigned on the most recent master tick, as a bitmask.
    pub fn realigned(&self) -> u16 {
        self.alignment.realigned()
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn tempo_cv_mode(&self) -> TempoCvMode {
        self.tempo_cv_mode
    }

    pub fn swing_amount(&self) -> f64 {
        self.swing.amount()
    }

    pub fn pending_edits(&self) -> usize {
        self.edits.len()
    }
}
