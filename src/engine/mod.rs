//! Speech synthesis engines.
//!
//! Both backends run Kokoro models and implement [`SpeechEngine`]:
//! - `onnx` - the model on ONNX Runtime, accepting phonemes or text
//! - `sherpa` - sherpa-onnx's Kokoro, accepting text only

mod onnx;
mod sherpa;
pub mod vocab;
pub mod voicepack;

pub use onnx::OnnxKokoro;
pub use sherpa::SherpaKokoro;

use crate::config::{Backend, SpeechConfig};
use crate::error::TtsResult;
use crate::paths::ArtifactPaths;

/// What the engine is asked to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineInput<'a> {
    /// Precomputed phoneme sequence (`is_phonemes` set).
    Phonemes(&'a str),
    /// Raw text; the engine phonemizes it for the given language tag.
    Text { text: &'a str, lang: &'a str },
}

/// Mono audio returned by an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 { 0.0 } else { self.samples.len() as f32 / self.sample_rate as f32 }
    }
}

/// A loaded text-to-speech engine.
///
/// Voice and speed are passed through unchecked; engines reject values they cannot handle.
pub trait SpeechEngine: Send {
    /// Synthesize `input` with the named voice at the given speed multiplier.
    fn create(&mut self, input: EngineInput<'_>, voice: &str, speed: f32) -> TtsResult<AudioBuffer>;

    /// Short backend name for logging.
    fn name(&self) -> &'static str;
}

/// Load the engine selected by `config`.
///
/// # Errors
/// Returns `MissingArtifact` if a model file is absent and `Engine` if loading fails.
pub fn open_engine(config: &SpeechConfig, paths: &ArtifactPaths) -> TtsResult<Box<dyn SpeechEngine>> {
    let engine: Box<dyn SpeechEngine> = match config.backend {
        Backend::Onnx => Box::new(OnnxKokoro::new(paths, config.effective_threads())?),
        Backend::Sherpa => Box::new(SherpaKokoro::new(paths, config)?),
    };
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        let audio = AudioBuffer { samples: vec![0.0; 12000], sample_rate: 24000 };
        assert_eq!(audio.duration_secs(), 0.5);
        assert_eq!(AudioBuffer { samples: vec![0.0; 10], sample_rate: 0 }.duration_secs(), 0.0);
    }
}
