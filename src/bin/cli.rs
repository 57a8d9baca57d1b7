//! ratioclock CLI: state files, offline rendering and monitored playback.
//!
//! Usage:
//!   rc-cli init clock.json --channels 8
//!   rc-cli info clock.json
//!   rc-cli render clock.json out.wav --seconds 8 --bpm 133 --swing 20
//!   rc-cli play clock.json --bpm 90

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rc_ir::{ClockState, Edit};
use rc_master::{ClockDrive, Controller, EngineConfig, Params};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "alloc_check")]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

#[derive(Parser)]
#[command(name = "rc-cli", version, about = "Rational multi-channel clock")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a fresh state file with every channel at 1:1
    Init {
        path: PathBuf,
        #[arg(long, default_value_t = 8)]
        channels: usize,
        /// Ratios as m:d, one per channel, e.g. 3:2 1:4
        #[arg(long, num_args = 1..)]
        ratio: Vec<String>,
        #[arg(long)]
        force: bool,
    },
    /// Print a state file
    Info { path: PathBuf },
    /// Render every output of a state file to a multi-channel WAV
    Render {
        state: PathBuf,
        output: PathBuf,
        #[arg(long, default_value_t = 8.0)]
        seconds: f32,
        #[arg(long, default_value_t = 48_000)]
        sample_rate: u32,
        /// Follow a synthetic trigger train at this BPM instead of the
        /// internal tempo
        #[arg(long)]
        external: Option<f32>,
        #[command(flatten)]
        controls: Controls,
    },
    /// Monitor the master and chain outputs on the default audio device
    Play {
        state: PathBuf,
        /// Stop after this many seconds instead of running until interrupted
        #[arg(long)]
        seconds: Option<f32>,
        #[command(flatten)]
        controls: Controls,
    },
}

#[derive(Args)]
struct Controls {
    #[arg(long, default_value_t = 120.0)]
    bpm: f32,
    /// Swing in percent, -99..99
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    swing: f32,
    /// Rotation in output slots
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    rotate: i32,
    /// Gate width as a fraction of the period
    #[arg(long, default_value_t = 0.5)]
    pulse_width: f32,
}

impl Controls {
    fn params(&self) -> Params {
        Params {
            bpm: self.bpm,
            swing: self.swing,
            rotation: self.rotate as f32,
            pulse_width: self.pulse_width,
            ..Params::default()
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Init {
            path,
            channels,
            ratio,
            force,
        } => init(path, channels, &ratio, force),
        Command::Info { path } => info(path),
        Command::Render {
            state,
            output,
            seconds,
            sample_rate,
            external,
            controls,
        } => {
            let drive = match external {
                Some(bpm) => ClockDrive::External { bpm },
                None => ClockDrive::Internal,
            };
            render(state, output, seconds, sample_rate, drive, &controls)
        }
        Command::Play {
            state,
            seconds,
            controls,
        } => play(state, seconds, &controls),
    }
}

fn parse_ratio(text: &str) -> Result<(u8, u8)> {
    let (m, d) = text
        .split_once(':')
        .with_context(|| format!("ratio {:?} is not of the form m:d", text))?;
    let m = m.trim().parse().with_context(|| format!("bad multiply in {:?}", text))?;
    let d = d.trim().parse().with_context(|| format!("bad divide in {:?}", text))?;
    Ok((m, d))
}

fn init(path: PathBuf, channels: usize, ratios: &[String], force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if ratios.len() > channels {
        bail!("{} ratios given for {} channels", ratios.len(), channels);
    }

    let mut ctrl = Controller::new(EngineConfig::new(48_000.0, channels));
    for (i, text) in ratios.iter().enumerate() {
        let (multiply, divide) = parse_ratio(text)?;
        ctrl.edit(Edit::SetRatio {
            channel: (i + 1) as u8,
            multiply,
            divide,
        });
    }
    ctrl.save_state(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn load(path: &Path) -> Result<ClockState> {
    rc_master::load_state(path).with_context(|| format!("loading {}", path.display()))
}

fn info(path: PathBuf) -> Result<()> {
    let state = load(&path)?;
    println!("Version:  {}", state.version);
    println!("Running:  {}", state.sequence_running);
    println!("Outputs:  {:?}", state.output_mode());
    println!("Tempo CV: {:?}", state.tempo_cv_mode());
    println!();
    for slot in 0..state.multiply.len().max(state.divide.len()) {
        let ratio = state.ratio(slot, true);
        match ratio.alignment_period() {
            0 => println!("  out {:>2}  {:>5}", slot + 1, ratio.to_string()),
            period => println!(
                "  out {:>2}  {:>5}  realigns every {} ticks",
                slot + 1,
                ratio.to_string(),
                period
            ),
        }
    }
    Ok(())
}

fn controller_for(state: ClockState, sample_rate: f32) -> Controller {
    let channels = state.multiply.len().max(state.divide.len());
    let mut ctrl = Controller::new(EngineConfig::new(sample_rate, channels));
    ctrl.set_state(state);
    ctrl
}

fn render(
    state: PathBuf,
    output: PathBuf,
    seconds: f32,
    sample_rate: u32,
    drive: ClockDrive,
    controls: &Controls,
) -> Result<()> {
    let ctrl = controller_for(load(&state)?, sample_rate as f32);
    tracing::debug!(?drive, seconds, "render settings");
    println!("Rendering {} at {} Hz...", output.display(), sample_rate);

    let frames = ctrl
        .render_to_wav(&output, &controls.params(), drive, seconds)
        .with_context(|| format!("rendering {}", output.display()))?;
    println!("Rendered {} frames", frames);
    Ok(())
}

fn play(state: PathBuf, seconds: Option<f32>, controls: &Controls) -> Result<()> {
    let mut ctrl = controller_for(load(&state)?, 48_000.0);
    ctrl.play(controls.params()).context("starting playback")?;
    println!("Playing... (Ctrl-C to quit)");
    println!();

    let deadline = seconds
        .filter(|s| s.is_finite())
        .map(|s| Instant::now() + Duration::from_secs_f32(s.max(0.0)));
    while ctrl.is_playing() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            ctrl.stop();
            break;
        }
        if let Some(ticks) = ctrl.master_ticks() {
            print!("\rMaster ticks: {:>8}", ticks);
            let _ = std::io::stdout().flush();
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    println!("\rDone.                 ");
    Ok(())
}
