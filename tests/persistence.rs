//! State files and offline rendering through the controller.

use rc_master::{
    ClockDrive, ClockState, Controller, ControllerError, Edit, EngineConfig, Params, Ratio,
};
use rc_ir::{OutputMode, TempoCvMode};
use std::fs;

fn controller(channels: usize) -> Controller {
    Controller::new(EngineConfig::new(48_000.0, channels))
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("clock.json");

    let mut ctrl = controller(4);
    ctrl.edit(Edit::SetRatio { channel: 1, multiply: 3, divide: 2 });
    ctrl.edit(Edit::SetRatio { channel: 4, multiply: 1, divide: 0 });
    ctrl.edit(Edit::SetOutputMode(OutputMode::Phasor));
    ctrl.edit(Edit::SetTempoCvMode(TempoCvMode::VoltPerOctave));
    ctrl.edit(Edit::SetRunning(true));
    ctrl.save_state(&path).unwrap();

    let mut loaded = controller(4);
    loaded.load_state(&path).unwrap();
    assert_eq!(loaded.state(), ctrl.state());

    let engine = loaded.engine();
    assert_eq!(engine.ratio(1), Some(Ratio::new(3, 2, true)));
    assert!(engine.ratio(4).unwrap().is_disabled());
    assert_eq!(engine.output_mode(), OutputMode::Phasor);
    assert_eq!(engine.tempo_cv_mode(), TempoCvMode::VoltPerOctave);
    assert!(engine.is_running());
}

#[test]
fn short_state_defaults_missing_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.json");
    fs::write(&path, r#"{ "version": 1, "multiply": [2], "divide": [3] }"#).unwrap();

    let mut ctrl = controller(3);
    ctrl.load_state(&path).unwrap();
    let engine = ctrl.engine();
    assert_eq!(engine.ratio(1), Some(Ratio::new(2, 3, true)));
    assert_eq!(engine.ratio(2), Some(Ratio::UNITY));
    assert_eq!(engine.ratio(3), Some(Ratio::UNITY));
    assert!(!engine.is_running());
}

#[test]
fn newer_state_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.json");
    fs::write(&path, r#"{ "version": 99 }"#).unwrap();

    let mut ctrl = controller(2);
    let err = ctrl.load_state(&path).unwrap_err();
    assert!(matches!(err, ControllerError::UnsupportedVersion { found: 99, .. }));
    assert_eq!(ctrl.state(), &ClockState::with_channels(2));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctrl = controller(2);
    let err = ctrl.load_state(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ControllerError::Io(_)));
}

#[test]
fn render_to_wav_writes_every_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("render.wav");

    let mut ctrl = controller(3);
    ctrl.edit(Edit::SetRatio { channel: 2, multiply: 2, divide: 1 });
    let frames = ctrl
        .render_to_wav(&path, &Params::default(), ClockDrive::Internal, 1.0)
        .unwrap();
    assert_eq!(frames, 48_000);

    let mut reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 5);
    assert_eq!(spec.sample_rate, 48_000);
    assert_eq!(reader.duration(), 48_000);

    let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
    // First frame: master and every 1:1 or 2:1 output high, chain carrying On.
    assert_eq!(&samples[..4], &[1.0, 1.0, 1.0, 1.0]);
    assert!(samples[4] > 1.0);
    assert!(samples.iter().all(|s| (0.0..=1.1).contains(s)));
}

#[test]
fn oversized_state_renders_supported_channels() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("wide.json");
    let wav_path = dir.path().join("wide.wav");
    let ones = vec![1u8; 12];
    let json = format!(
        r#"{{ "version": 1, "multiply": {:?}, "divide": {:?} }}"#,
        ones, ones
    );
    fs::write(&state_path, json).unwrap();

    let state = rc_master::load_state(&state_path).unwrap();
    assert_eq!(state.multiply.len(), 12);
    let mut ctrl = controller(state.multiply.len());
    ctrl.set_state(state);
    ctrl.render_to_wav(&wav_path, &Params::default(), ClockDrive::Internal, 0.1)
        .unwrap();

    let reader = hound::WavReader::open(&wav_path).unwrap();
    assert_eq!(reader.spec().channels as usize, rc_ir::MAX_RATIO_CHANNELS + 2);
    assert_eq!(reader.duration(), 4_800);
}
