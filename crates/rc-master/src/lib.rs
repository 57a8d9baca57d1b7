//! Headless controller for ratioclock.
//!
//! Owns a persisted clock state and provides offline rendering and
//! real-time monitored playback that both the CLI and tests share.

mod drive;
mod error;
mod persist;
mod wav;

use rc_audio::{AudioOutput, CpalOutput, MonitorFrame};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

// Re-export common types so callers don't need rc-engine directly.
pub use drive::{ClockDrive, PulseTrain};
pub use error::ControllerError;
pub use persist::{load_state, save_state, state_from_json, state_to_json};
pub use rc_engine::{Engine, EngineConfig, Inputs, Outputs, Params};
pub use rc_ir::{ClockState, Edit, Ratio};
pub use wav::{write_wav, write_wav_file};

/// Edits in flight to the playback thread.
const EDIT_RING_CAPACITY: usize = 64;

/// Monitor gain applied to the 10V-scaled outputs.
const MONITOR_GAIN: f32 = 0.5;

/// Headless clock controller: owns a state and manages playback.
pub struct Controller {
    config: EngineConfig,
    state: ClockState,
    playback: Option<PlaybackHandle>,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    master_ticks: Arc<AtomicU64>,
    finished: Arc<AtomicBool>,
    edits: HeapProd<Edit>,
    thread: Option<JoinHandle<()>>,
}

impl Controller {
    /// Create a controller for `config`, with the channel count limited to
    /// what the engine supports.
    pub fn new(config: EngineConfig) -> Self {
        let config = config.clamped();
        let state = ClockState::with_channels(config.channel_count);
        Self {
            config,
            state,
            playback: None,
        }
    }

    // --- State management ---

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &ClockState {
        &self.state
    }

    pub fn set_state(&mut self, state: ClockState) {
        self.state = state;
    }

    pub fn load_state(&mut self, path: &Path) -> Result<(), ControllerError> {
        self.state = persist::load_state(path)?;
        Ok(())
    }

    pub fn save_state(&self, path: &Path) -> Result<(), ControllerError> {
        persist::save_state(path, &self.state)
    }

    /// A fresh engine reconstructed from the current state.
    pub fn engine(&self) -> Engine {
        Engine::from_state(self.config, &self.state)
    }

    /// Apply an edit to the stored state, and forward it to the playback
    /// thread when one is running.
    pub fn edit(&mut self, edit: Edit) {
        let mut engine = self.engine();
        engine.apply_edit(edit);
        self.state = engine.snapshot();

        if let Some(pb) = self.playback.as_mut() {
            if pb.edits.try_push(edit).is_err() {
                tracing::warn!(?edit, "playback edit queue full, dropping edit");
            }
        }
    }

    // --- Offline rendering ---

    /// Render `frames` samples with the transport started.
    pub fn render_frames(
        &self,
        params: &Params,
        drive: ClockDrive,
        frames: usize,
    ) -> Vec<Outputs> {
        let sample_rate = self.config.sample_rate as u32;
        let mut engine = self.engine();
        engine.set_running(true);

        let mut inputs = drive::DriveInputs::new(drive, sample_rate);
        let mut outputs = Vec::with_capacity(frames);
        for _ in 0..frames {
            outputs.push(engine.process(params, &inputs.next_inputs()));
        }
        tracing::debug!(
            frames,
            master_ticks = engine.master_ticks(),
            "rendered offline"
        );
        outputs
    }

    /// Render `seconds` of every output into a multi-channel WAV file.
    pub fn render_to_wav(
        &self,
        path: &Path,
        params: &Params,
        drive: ClockDrive,
        seconds: f32,
    ) -> Result<usize, ControllerError> {
        let sample_rate = self.config.sample_rate as u32;
        let frames = (self.config.sample_rate * seconds.max(0.0)) as usize;
        tracing::info!(path = %path.display(), frames, sample_rate, "rendering");

        let outputs = self.render_frames(params, drive, frames);
        wav::write_wav_file(path, &outputs, self.config.channel_count, sample_rate)?;
        Ok(frames)
    }

    // --- Real-time playback ---

    /// Start monitored playback on a worker thread, with the transport
    /// running. The stored state is left as it is.
    pub fn play(&mut self, params: Params) -> Result<(), ControllerError> {
        self.stop();

        let (output, consumer) = CpalOutput::new()?;
        let engine = self.playback_engine(output.sample_rate() as f32);
        let sample_rate = engine.config().sample_rate;

        let stop_signal = Arc::new(AtomicBool::new(false));
        let master_ticks = Arc::new(AtomicU64::new(0));
        let finished = Arc::new(AtomicBool::new(false));
        let (edit_tx, edit_rx) = HeapRb::<Edit>::new(EDIT_RING_CAPACITY).split();

        let worker = Worker {
            output,
            consumer: Some(consumer),
            engine,
            params,
            edits: edit_rx,
            stop_signal: stop_signal.clone(),
            master_ticks: master_ticks.clone(),
            finished: finished.clone(),
        };
        let thread = std::thread::spawn(move || worker.run());
        tracing::info!(sample_rate, "playback started");

        self.playback = Some(PlaybackHandle {
            stop_signal,
            master_ticks,
            finished,
            edits: edit_tx,
            thread: Some(thread),
        });
        Ok(())
    }

    /// Engine for the playback thread at the device rate.
    fn playback_engine(&self, sample_rate: f32) -> Engine {
        let config = EngineConfig {
            sample_rate,
            ..self.config
        };
        let mut engine = Engine::from_state(config, &self.state);
        engine.set_running(true);
        engine
    }

    pub fn stop(&mut self) {
        if let Some(mut pb) = self.playback.take() {
            pb.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = pb.thread.take() {
                let _ = handle.join();
            }
            tracing::info!("playback stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::Relaxed))
    }

    /// Master ticks counted by the playback thread.
    pub fn master_ticks(&self) -> Option<u64> {
        let pb = self.playback.as_ref()?;
        Some(pb.master_ticks.load(Ordering::Relaxed))
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker {
    output: CpalOutput,
    consumer: Option<HeapCons<MonitorFrame>>,
    engine: Engine,
    params: Params,
    edits: HeapCons<Edit>,
    stop_signal: Arc<AtomicBool>,
    master_ticks: Arc<AtomicU64>,
    finished: Arc<AtomicBool>,
}

impl Worker {
    fn run(mut self) {
        if let Err(e) = self.start_stream() {
            tracing::warn!("monitor stream failed: {}", e);
            self.finished.store(true, Ordering::Relaxed);
            return;
        }

        let report_interval = (self.output.sample_rate() / 100).max(1) as u64;
        let mut frame_count: u64 = 0;

        while !self.stop_signal.load(Ordering::Relaxed) {
            while let Some(edit) = self.edits.try_pop() {
                if self.engine.push_edit(edit).is_err() {
                    self.engine.apply_edit(edit);
                }
            }

            let out = self.process();
            self.output
                .write_spin(MonitorFrame::from_volts(out.master.voltage, out.chain, MONITOR_GAIN));

            frame_count += 1;
            if frame_count % report_interval == 0 {
                self.master_ticks
                    .store(self.engine.master_ticks(), Ordering::Relaxed);
            }
        }

        let _ = self.output.stop();
        self.finished.store(true, Ordering::Relaxed);
    }

    fn start_stream(&mut self) -> Result<(), ControllerError> {
        if let Some(consumer) = self.consumer.take() {
            self.output.build_stream(consumer)?;
        }
        self.output.start()?;
        Ok(())
    }

    #[cfg(feature = "alloc_check")]
    fn process(&mut self) -> Outputs {
        let engine = &mut self.engine;
        let params = &self.params;
        assert_no_alloc::assert_no_alloc(|| engine.process(params, &Inputs::INTERNAL))
    }

    #[cfg(not(feature = "alloc_check"))]
    fn process(&mut self) -> Outputs {
        self.engine.process(&self.params, &Inputs::INTERNAL)
    }
}
