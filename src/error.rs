//! Error types for the midisquare library

use std::io;

/// Library error type for midisquare operations
#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    /// Tick resolution is not a positive number, nothing can be decoded
    #[error("malformed tempo: ticks per beat must be positive, got {0}")]
    MalformedTempo(i32),

    /// Parsing error when adapting a MIDI container
    #[error("parsing error: {0}")]
    ParsingError(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Audio or playback thread error
    #[error("audio error: {0}")]
    AudioError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<io::Error> for MidiError {
    fn from(error: io::Error) -> Self {
        Self::IoError(error.to_string())
    }
}

impl From<midly::Error> for MidiError {
    fn from(error: midly::Error) -> Self {
        Self::ParsingError(error.to_string())
    }
}
