//! JSON persistence of [`ClockState`].

use std::fs;
use std::path::Path;

use rc_ir::{ClockState, STATE_VERSION};

use crate::error::ControllerError;

/// Parse a state, rejecting layouts newer than this build understands.
pub fn state_from_json(json: &str) -> Result<ClockState, ControllerError> {
    let state: ClockState = serde_json::from_str(json)?;
    if state.version > STATE_VERSION {
        return Err(ControllerError::UnsupportedVersion {
            found: state.version,
            supported: STATE_VERSION,
        });
    }
    Ok(state)
}

pub fn state_to_json(state: &ClockState) -> Result<String, ControllerError> {
    Ok(serde_json::to_string_pretty(state)?)
}

pub fn load_state(path: &Path) -> Result<ClockState, ControllerError> {
    let json = fs::read_to_string(path)?;
    let state = state_from_json(&json)?;
    tracing::info!(
        path = %path.display(),
        channels = state.multiply.len(),
        "loaded clock state"
    );
    Ok(state)
}

/// Write a state, creating parent directories as needed.
pub fn save_state(path: &Path, state: &ClockState) -> Result<(), ControllerError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, state_to_json(state)?)?;
    tracing::info!(path = %path.display(), "saved clock state");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let state = state_from_json(r#"{ "multiply": [3, 2], "divide": [2] }"#).unwrap();
        assert_eq!(state.version, STATE_VERSION);
        assert_eq!(state.multiply, vec![3, 2]);
        assert!(!state.sequence_running);
        assert_eq!(state.ratio(1, true).divide(), 1);
    }

    #[test]
    fn newer_version_is_rejected() {
        let json = format!(r#"{{ "version": {} }}"#, STATE_VERSION + 1);
        assert!(matches!(
            state_from_json(&json),
            Err(ControllerError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(state_from_json("{"), Err(ControllerError::Json(_))));
    }

    #[test]
    fn json_field_names() {
        let json = state_to_json(&ClockState::with_channels(2)).unwrap();
        for field in [
            "version",
            "multiply",
            "divide",
            "sequence_running",
            "phasor_mode",
            "cv_volt_per_octave",
        ] {
            assert!(json.contains(field), "missing {}", field);
        }
    }
}
