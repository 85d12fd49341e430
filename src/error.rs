//! Error types for the audio-to-MIDI engine

use std::fmt;

/// Custom error type for transcription and MIDI processing
#[derive(Debug, Clone)]
pub enum PolyError {
    /// Invalid audio format (e.g., unsupported bit depth)
    InvalidAudioFormat(String),
    /// Unsupported sample rate
    UnsupportedSampleRate(u32),
    /// Configuration validation failed
    InvalidConfig(String),
    /// Audio file I/O error
    AudioFileError(String),
    /// Structurally malformed MIDI data
    InvalidMidiData(String),
    /// Operation not defined for the given sequence
    UnsupportedOperation(String),
    /// MIDI export error
    MidiExportError(String),
    /// Analysis export error
    AnalysisExportError(String),
    /// Input validation error
    InputValidationError(String),
    /// Underlying stream I/O error
    IoError(String),
}

impl fmt::Display for PolyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolyError::InvalidAudioFormat(msg) => {
                write!(f, "Invalid audio format - {}", msg)
            }
            PolyError::UnsupportedSampleRate(sr) => {
                write!(f, "Unsupported sample rate {} Hz", sr)
            }
            PolyError::InvalidConfig(msg) => {
                write!(f, "Configuration validation failed - {}", msg)
            }
            PolyError::AudioFileError(msg) => {
                write!(f, "Audio file I/O error - {}", msg)
            }
            PolyError::InvalidMidiData(msg) => {
                write!(f, "Invalid MIDI data - {}", msg)
            }
            PolyError::UnsupportedOperation(msg) => {
                write!(f, "Unsupported operation - {}", msg)
            }
            PolyError::MidiExportError(msg) => {
                write!(f, "MIDI export error - {}", msg)
            }
            PolyError::AnalysisExportError(msg) => {
                write!(f, "Analysis export error - {}", msg)
            }
            PolyError::InputValidationError(msg) => {
                write!(f, "Input validation error - {}", msg)
            }
            PolyError::IoError(msg) => {
                write!(f, "I/O error - {}", msg)
            }
        }
    }
}

impl std::error::Error for PolyError {}

// From implementations for common error types
impl From<std::io::Error> for PolyError {
    fn from(err: std::io::Error) -> Self {
        PolyError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for PolyError {
    fn from(err: serde_json::Error) -> Self {
        PolyError::AnalysisExportError(format!("JSON serialization error: {}", err))
    }
}

impl From<anyhow::Error> for PolyError {
    fn from(err: anyhow::Error) -> Self {
        PolyError::InvalidConfig(format!("{}", err))
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, PolyError>;
