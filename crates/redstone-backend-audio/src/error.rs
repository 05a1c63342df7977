//! Error types for the audio backend.

use redstone_spec::{BackendError, ErrorKind};
use thiserror::Error;

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Errors that can occur while decoding or analyzing audio.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The container or codec is not supported.
    #[error("unsupported audio format: {message}")]
    UnsupportedFormat {
        /// Error message.
        message: String,
    },

    /// Decoding produced no samples.
    #[error("audio contains no samples")]
    EmptyAudio,

    /// The packet stream is corrupt.
    #[error("decode error: {message}")]
    Decode {
        /// Error message.
        message: String,
    },

    /// Every frame was silent or unvoiced.
    #[error("no melody detected in audio")]
    NoMelodyDetected,

    /// An analysis parameter is invalid.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },

    /// Sample-rate conversion failed.
    #[error("resample error: {message}")]
    Resample {
        /// Error message.
        message: String,
    },

    /// WAV encoding failed.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

impl AudioError {
    /// Creates an unsupported-format error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl BackendError for AudioError {
    fn code(&self) -> &'static str {
        match self {
            AudioError::UnsupportedFormat { .. } => "AUDIO_001",
            AudioError::EmptyAudio => "AUDIO_002",
            AudioError::Decode { .. } => "AUDIO_003",
            AudioError::NoMelodyDetected => "AUDIO_004",
            AudioError::InvalidParameter { .. } => "AUDIO_005",
            AudioError::Resample { .. } => "AUDIO_006",
            AudioError::Wav(_) => "AUDIO_007",
        }
    }

    fn category(&self) -> &'static str {
        "audio"
    }

    fn kind(&self) -> ErrorKind {
        match self {
            AudioError::UnsupportedFormat { .. }
            | AudioError::EmptyAudio
            | AudioError::Decode { .. } => ErrorKind::Decode,
            AudioError::NoMelodyDetected => ErrorKind::Analysis,
            AudioError::InvalidParameter { .. } => ErrorKind::Parameter,
            AudioError::Resample { .. } | AudioError::Wav(_) => ErrorKind::Internal,
        }
    }
}
