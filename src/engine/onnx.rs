//! Kokoro run directly through ONNX Runtime.

use std::path::Path;
use std::time::Instant;

use ndarray::{Array1, Array2};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use tracing::{debug, info};

use super::vocab::{MAX_PHONEME_LENGTH, Vocab, split_phonemes};
use super::voicepack::{STYLE_DIM, VoicePack};
use super::{AudioBuffer, EngineInput, SpeechEngine};
use crate::error::{TtsError, TtsResult};
use crate::paths::ArtifactPaths;
use crate::phonemize::{Espeak, phonemize_clauses};

/// Kokoro output sample rate.
pub const SAMPLE_RATE: u32 = 24000;

/// Accepted speed range.
pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 2.0;

/// Silence threshold for edge trimming, relative to peak (-60 dB).
const TRIM_THRESHOLD: f32 = 0.001;

/// Kokoro engine on ONNX Runtime.
pub struct OnnxKokoro {
    session: Session,    // Loaded model
    vocab: Vocab,        // Phoneme to token id map
    voices: VoicePack,   // Voice style vectors
    token_input: String, // Name of the token input ("tokens" or "input_ids")
}

impl OnnxKokoro {
    /// Load the model, vocabulary, and voice data.
    ///
    /// Only the model and voices files are required; `tokens.txt` overrides the built-in
    /// vocabulary when present.
    ///
    /// # Errors
    /// Returns `MissingArtifact` if a file is absent and `Engine` if one is corrupt.
    pub fn new(paths: &ArtifactPaths, threads: usize) -> TtsResult<Self> {
        ArtifactPaths::require([paths.model.as_path(), paths.voices.as_path()])?;

        info!("Initializing Kokoro ONNX engine ({} threads)", threads);
        let start = Instant::now();

        let vocab = Vocab::load_or_builtin(&paths.tokens)?;
        let voices = VoicePack::open(&paths.voices)?;
        let session = load_session(&paths.model, threads)?;

        let token_input = if session.inputs.iter().any(|input| input.name == "input_ids") { "input_ids" } else { "tokens" }.to_string();

        info!("Kokoro model loaded in {:.2}s ({} phoneme symbols)", start.elapsed().as_secs_f32(), vocab.len());
        Ok(Self { session, vocab, voices, token_input })
    }

    /// Run the model on one batch of token ids.
    fn infer(&mut self, ids: &[i64], voice: &str, speed: f32) -> TtsResult<Vec<f32>> {
        let style = self.voices.style(voice, ids.len())?;

        let mut tokens = Vec::with_capacity(ids.len() + 2);
        tokens.push(0);
        tokens.extend_from_slice(ids);
        tokens.push(0);

        let seq_len = tokens.len();
        let tokens = Array2::from_shape_vec((1, seq_len), tokens).map_err(|e| TtsError::Engine(format!("Failed to create token tensor: {}", e)))?;
        let style = Array2::from_shape_vec((1, STYLE_DIM), style).map_err(|e| TtsError::Engine(format!("Failed to create style tensor: {}", e)))?;
        let speed = Array1::from_vec(vec![speed]);

        let tokens_tensor = Tensor::from_array(tokens).map_err(|e| TtsError::Engine(format!("Failed to create tensor: {}", e)))?;
        let style_tensor = Tensor::from_array(style).map_err(|e| TtsError::Engine(format!("Failed to create tensor: {}", e)))?;
        let speed_tensor = Tensor::from_array(speed).map_err(|e| TtsError::Engine(format!("Failed to create tensor: {}", e)))?;

        let token_input = self.token_input.clone();
        let outputs = self
            .session
            .run(ort::inputs![
                token_input.as_str() => tokens_tensor,
                "style" => style_tensor,
                "speed" => speed_tensor
            ])
            .map_err(|e| TtsError::Engine(format!("Inference failed: {}", e)))?;

        let (_, audio) = outputs[0].try_extract_tensor::<f32>().map_err(|e| TtsError::Engine(format!("Failed to extract output: {}", e)))?;
        Ok(audio.to_vec())
    }
}

impl SpeechEngine for OnnxKokoro {
    fn create(&mut self, input: EngineInput<'_>, voice: &str, speed: f32) -> TtsResult<AudioBuffer> {
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(TtsError::Engine(format!("Speed must be between {} and {}, got {}", MIN_SPEED, MAX_SPEED, speed)));
        }

        let phonemes = match input {
            EngineInput::Phonemes(phonemes) => phonemes.to_string(),
            EngineInput::Text { text, lang } => phonemize_clauses(&Espeak::new(lang), text)?,
        };

        let batches = split_phonemes(&phonemes, MAX_PHONEME_LENGTH);
        debug!("Synthesizing {} phoneme(s) in {} batch(es)", phonemes.chars().count(), batches.len());

        let start = Instant::now();
        let mut samples = Vec::new();
        for batch in &batches {
            let ids = self.vocab.encode(batch);
            if ids.is_empty() {
                continue;
            }
            samples.extend(self.infer(&ids, voice, speed)?);
        }

        if samples.is_empty() {
            return Err(TtsError::Engine("No phonemes left to synthesize after vocabulary filtering".to_string()));
        }

        let samples = trim_silence(&samples, TRIM_THRESHOLD).to_vec();
        info!("🎵 Generated speech ({} samples) in {:.2}s", samples.len(), start.elapsed().as_secs_f32());

        Ok(AudioBuffer { samples, sample_rate: SAMPLE_RATE })
    }

    fn name(&self) -> &'static str {
        "kokoro-onnx"
    }
}

/// Open an ONNX Runtime session for `model`.
pub(super) fn load_session(model: &Path, threads: usize) -> TtsResult<Session> {
    Session::builder()
        .map_err(|e| TtsError::Engine(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| TtsError::Engine(format!("Failed to set optimization level: {}", e)))?
        .with_intra_threads(threads.max(1))
        .map_err(|e| TtsError::Engine(format!("Failed to set threads: {}", e)))?
        .commit_from_file(model)
        .map_err(|e| TtsError::Engine(format!("Failed to load model {}: {}", model.display(), e)))
}

/// Drop leading and trailing samples quieter than `threshold` times the peak.
fn trim_silence(samples: &[f32], threshold: f32) -> &[f32] {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak == 0.0 {
        return samples;
    }

    let floor = peak * threshold;
    let first = samples.iter().position(|s| s.abs() > floor).unwrap_or(0);
    let last = samples.iter().rposition(|s| s.abs() > floor).map_or(samples.len(), |i| i + 1);
    &samples[first..last]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_silence_edges() {
        let samples = [0.0f32, 0.0001, 0.5, -0.2, 0.0, 0.3, 0.0, 0.0];
        assert_eq!(trim_silence(&samples, TRIM_THRESHOLD).to_vec(), vec![0.5f32, -0.2, 0.0, 0.3]);
    }

    #[test]
    fn test_trim_silence_all_zero() {
        let samples = [0.0f32; 4];
        assert_eq!(trim_silence(&samples, TRIM_THRESHOLD).len(), 4);
    }

    #[test]
    fn test_missing_model_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::with_defaults(dir.path()).unwrap();
        let err = OnnxKokoro::new(&paths, 1).err().unwrap();
        assert!(matches!(err, TtsError::MissingArtifact { ref path } if path == &paths.model));
    }

    #[test]
    fn test_tokens_file_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::with_defaults(dir.path()).unwrap();
        std::fs::create_dir_all(paths.model.parent().unwrap()).unwrap();
        std::fs::write(&paths.model, b"not an onnx model").unwrap();
        std::fs::write(&paths.voices, vec![0u8; 510 * 256 * 4]).unwrap();

        // Gets past the artifact check and fails on the model itself
        let err = OnnxKokoro::new(&paths, 1).err().unwrap();
        assert!(!paths.tokens.exists());
        assert!(matches!(err, TtsError::Engine(_)));
    }
}
