//! Error types for speech generation.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Coarse failure category, for callers that branch on cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingArtifact,
    OutputDir,
    Phonemize,
    Engine,
    Write,
    Unsupported,
}

/// Errors that can occur while turning text into a sound file.
#[derive(Debug, Error)]
pub enum TtsError {
    /// A bundled model, voice, or vocabulary file is not where it should be.
    #[error("Required artifact not found: {}", path.display())]
    MissingArtifact { path: PathBuf },

    /// The output directory could not be created.
    #[error("Failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Grapheme-to-phoneme conversion failed.
    #[error("Phonemization failed: {0}")]
    Phonemize(String),

    /// The inference engine failed to load or to synthesize.
    #[error("Engine error: {0}")]
    Engine(String),

    /// The sound file could not be written.
    #[error("Failed to write audio to {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    /// The output extension has no matching sound-file format.
    #[error("Unsupported output format '{extension}' (expected .wav)")]
    UnsupportedFormat { extension: String },

    /// The selected backend cannot handle the requested input.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl TtsError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TtsError::MissingArtifact { .. } => ErrorKind::MissingArtifact,
            TtsError::OutputDir { .. } => ErrorKind::OutputDir,
            TtsError::Phonemize(_) => ErrorKind::Phonemize,
            TtsError::Engine(_) => ErrorKind::Engine,
            TtsError::Write { .. } => ErrorKind::Write,
            TtsError::UnsupportedFormat { .. } | TtsError::Unsupported(_) => ErrorKind::Unsupported,
        }
    }
}

pub type TtsResult<T> = Result<T, TtsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = TtsError::MissingArtifact { path: PathBuf::from("models/model.onnx") };
        assert_eq!(err.kind(), ErrorKind::MissingArtifact);

        let err = TtsError::UnsupportedFormat { extension: "mp3".to_string() };
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(err.to_string().contains("mp3"));
    }

    #[test]
    fn test_output_dir_keeps_source() {
        let err = TtsError::OutputDir {
            path: PathBuf::from("/root/out"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.kind(), ErrorKind::OutputDir);
        assert!(std::error::Error::source(&err).is_some());
    }
}
