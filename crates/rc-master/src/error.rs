//! Controller error type.

use rc_audio::AudioError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid state file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),
    #[error("state version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}
