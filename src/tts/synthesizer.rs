//! Text-to-speech pipeline: phonemize, synthesize, write.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::audio::{self, AudioFormat};
use crate::config::{Backend, PhonemizeMode, SpeechConfig};
use crate::engine::{self, AudioBuffer, EngineInput, SpeechEngine};
use crate::error::{TtsError, TtsResult};
use crate::paths::{self, ArtifactPaths};
use crate::phonemize::{G2p, G2pConfig};

/// A written sound file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechOutput {
    pub path: PathBuf,       // Absolute path of the written file
    pub sample_rate: u32,    // Sample rate reported by the engine
    pub num_samples: usize,  // Samples written
    pub duration_secs: f32,  // Audio length
}

/// Outcome of one generation call.
pub type SpeechResult = TtsResult<SpeechOutput>;

/// Reusable text-to-speech synthesizer.
///
/// The engine and G2P front end are loaded once and reused for every call.
pub struct Synthesizer {
    engine: Box<dyn SpeechEngine>, // Loaded inference engine
    g2p: Option<G2p>,              // Local G2P (None when the engine phonemizes)
    config: SpeechConfig,          // Voice, speed, and language for every call
}

impl Synthesizer {
    /// Create a new synthesizer.
    ///
    /// # Arguments
    /// * `config` - Voice, speed, phonemization and backend settings
    /// * `paths` - Resolved artifact locations
    ///
    /// # Errors
    /// Returns `MissingArtifact` if a model file is absent, `Phonemize` if local G2P cannot be
    /// set up, `Unsupported` for local G2P on the sherpa backend, and `Engine` if the model fails to load.
    pub fn new(config: &SpeechConfig, paths: &ArtifactPaths) -> TtsResult<Self> {
        if config.backend == Backend::Sherpa && config.phonemize != PhonemizeMode::Engine {
            return Err(TtsError::Unsupported("the sherpa backend phonemizes text itself; use --phonemize engine".to_string()));
        }

        let g2p = match config.phonemize {
            PhonemizeMode::Local { british, trf } => Some(G2p::new(G2pConfig { british, trf }, paths.lexicon(british))?),
            PhonemizeMode::Engine => None,
        };

        let engine = engine::open_engine(config, paths)?;
        Ok(Self::from_parts(engine, g2p, config.clone()))
    }

    /// Assemble a synthesizer from an already-loaded engine and front end.
    pub(crate) fn from_parts(engine: Box<dyn SpeechEngine>, g2p: Option<G2p>, config: SpeechConfig) -> Self {
        info!("Synthesizer ready ({} engine, voice {})", engine.name(), config.voice);
        Self { engine, g2p, config }
    }

    /// Synthesize `text` into audio samples.
    ///
    /// # Errors
    /// Returns `Phonemize` or `Engine` errors from the front end or the model.
    pub fn synthesize(&mut self, text: &str) -> TtsResult<AudioBuffer> {
        let start = Instant::now();

        let audio = match &self.g2p {
            Some(g2p) => {
                let (phonemes, tokens) = g2p.phonemize(text)?;
                debug!("Phonemes ({} tokens): {}", tokens.len(), phonemes);
                self.engine.create(EngineInput::Phonemes(&phonemes), &self.config.voice, self.config.speed)?
            }
            None => self.engine.create(EngineInput::Text { text, lang: &self.config.lang }, &self.config.voice, self.config.speed)?,
        };

        debug!("Synthesis took {:.2}s", start.elapsed().as_secs_f32());
        Ok(audio)
    }

    /// Synthesize `text` and write it to `output`, replacing any existing file.
    ///
    /// Missing parent directories are created first.
    ///
    /// # Returns
    /// Details of the written file.
    ///
    /// # Errors
    /// Returns `OutputDir`, `Phonemize`, `Engine`, `Write`, or `Unsupported`.
    pub fn speak_to_file(&mut self, text: &str, output: &Path) -> SpeechResult {
        let output = prepare_output(output)?;
        self.speak_prepared(text, output)
    }

    /// Synthesize into an output path that already went through [`prepare_output`].
    fn speak_prepared(&mut self, text: &str, output: PathBuf) -> SpeechResult {
        let audio = self.synthesize(text)?;
        audio::write_audio(&output, &audio)?;

        info!("💾 Saved {:.2}s of audio to {}", audio.duration_secs(), output.display());
        Ok(SpeechOutput { path: output, sample_rate: audio.sample_rate, num_samples: audio.samples.len(), duration_secs: audio.duration_secs() })
    }
}

/// Make `output` absolute, check its format, and create its parent directories.
fn prepare_output(output: &Path) -> TtsResult<PathBuf> {
    let output = paths::absolute_output(output)?;
    AudioFormat::from_path(&output)?;
    paths::ensure_parent_dir(&output)?;
    Ok(output)
}

/// Generate speech for `text` into `output` with a freshly loaded engine.
///
/// Every failure is logged and returned; nothing panics.
pub fn generate_speech(text: &str, output: &Path, config: &SpeechConfig, paths: &ArtifactPaths) -> SpeechResult {
    let result = prepare_output(output).and_then(|output| Synthesizer::new(config, paths)?.speak_prepared(text, output));

    if let Err(ref e) = result {
        error!("Speech generation failed ({:?}): {}", e.kind(), e);
        debug!("{:?}", e);
    }
    result
}

/// Generate speech with default settings and the bundled artifacts.
///
/// # Returns
/// `true` on success, `false` on any failure (the cause is logged).
pub fn generate_tts(text: &str, output: &Path) -> bool {
    let paths = match ArtifactPaths::with_defaults(&paths::default_base_dir()) {
        Ok(paths) => paths,
        Err(e) => {
            error!("Speech generation failed ({:?}): {}", e.kind(), e);
            return false;
        }
    };
    generate_speech(text, output, &SpeechConfig::default(), &paths).is_ok()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::error::ErrorKind;
    use crate::phonemize::Lexicon;

    /// Engine that records what it was asked to speak and returns a quiet tone.
    struct Recording {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl SpeechEngine for Recording {
        fn create(&mut self, input: EngineInput<'_>, voice: &str, speed: f32) -> TtsResult<AudioBuffer> {
            let (call, len) = match input {
                EngineInput::Phonemes(phonemes) => (format!("phonemes:{}", phonemes), phonemes.len()),
                EngineInput::Text { text, lang } => (format!("text:{}:{}", lang, text), text.len()),
            };
            self.calls.lock().push(format!("{} ({} x{})", call, voice, speed));

            let samples = (0..len * 100).map(|i| (i as f32 * 0.1).sin() * 0.25).collect();
            Ok(AudioBuffer { samples, sample_rate: 22050 })
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn recording(g2p: Option<G2p>, config: SpeechConfig) -> (Synthesizer, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let synth = Synthesizer::from_parts(Box::new(Recording { calls: calls.clone() }), g2p, config);
        (synth, calls)
    }

    fn local_g2p() -> G2p {
        let lexicon = Lexicon::parse("hello h ə l ˈO\nworld w ˈɜ ɹ l d\nhi h ˈI\n");
        G2p::with_lexicon(G2pConfig::default(), lexicon, None)
    }

    #[test]
    fn test_speak_writes_file_at_engine_rate() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out").join("test.wav");
        let (mut synth, _) = recording(Some(local_g2p()), SpeechConfig::default());

        let written = synth.speak_to_file("Hello world", &output).unwrap();
        assert_eq!(written.path, output);
        assert_eq!(written.sample_rate, 22050);
        assert!(written.num_samples > 0);

        let audio = audio::read_wav(&output).unwrap();
        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.samples.len(), written.num_samples);
        assert!(audio.samples.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_second_call_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out").join("test.wav");
        let (mut synth, calls) = recording(Some(local_g2p()), SpeechConfig::default());

        let first = synth.speak_to_file("Hello world", &output).unwrap();
        let second = synth.speak_to_file("Hi", &output).unwrap();
        assert!(second.num_samples < first.num_samples);
        assert_eq!(audio::read_wav(&output).unwrap().samples.len(), second.num_samples);
        assert_eq!(calls.lock().len(), 2);
    }

    #[test]
    fn test_local_mode_sends_phonemes() {
        let dir = tempfile::tempdir().unwrap();
        let (mut synth, calls) = recording(Some(local_g2p()), SpeechConfig::default());

        synth.speak_to_file("Hello world", &dir.path().join("test.wav")).unwrap();
        assert_eq!(calls.lock().as_slice(), ["phonemes:həlˈO wˈɜɹld (af_heart x1)"]);
    }

    #[test]
    fn test_engine_mode_sends_text_and_lang() {
        let dir = tempfile::tempdir().unwrap();
        let config = SpeechConfig { phonemize: PhonemizeMode::Engine, voice: "bf_emma".to_string(), lang: "en-gb".to_string(), speed: 1.5, ..Default::default() };
        let (mut synth, calls) = recording(None, config);

        synth.speak_to_file("Hello world", &dir.path().join("test.wav")).unwrap();
        assert_eq!(calls.lock().as_slice(), ["text:en-gb:Hello world (bf_emma x1.5)"]);
    }

    #[test]
    fn test_phonemize_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("test.wav");
        let (mut synth, calls) = recording(Some(local_g2p()), SpeechConfig::default());

        let err = synth.speak_to_file("Hello stranger", &output).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Phonemize);
        assert!(calls.lock().is_empty());
        assert!(!output.exists());
    }

    #[test]
    fn test_prepared_output_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let output = prepare_output(&dir.path().join("a").join("test.wav")).unwrap();
        let (mut synth, _) = recording(Some(local_g2p()), SpeechConfig::default());

        let written = synth.speak_prepared("Hello", output.clone()).unwrap();
        assert_eq!(written.path, output);
        assert!(output.is_file());
    }

    #[test]
    fn test_prepare_output_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("deeper").join("speech.wav");

        let prepared = prepare_output(&output).unwrap();
        assert!(prepared.is_absolute());
        assert!(dir.path().join("nested").join("deeper").is_dir());
    }

    #[test]
    fn test_prepare_output_rejects_unknown_extension_before_creating_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("speech.mp3");

        let err = prepare_output(&output).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(!dir.path().join("nested").exists());
    }

    #[test]
    fn test_missing_model_reported_as_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::with_defaults(dir.path()).unwrap();
        let config = SpeechConfig { phonemize: PhonemizeMode::Engine, ..Default::default() };

        let err = generate_speech("Hello", &dir.path().join("out").join("hello.wav"), &config, &paths).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingArtifact);
        assert!(dir.path().join("out").is_dir());
    }

    #[test]
    fn test_missing_lexicon_reported_as_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::with_defaults(dir.path()).unwrap();

        let err = Synthesizer::new(&SpeechConfig::default(), &paths).err().unwrap();
        assert!(matches!(err, TtsError::MissingArtifact { ref path } if path == &paths.lexicon_us));
    }

    #[test]
    fn test_sherpa_requires_engine_phonemization() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::with_defaults(dir.path()).unwrap();
        let config = SpeechConfig { backend: Backend::Sherpa, ..Default::default() };

        let err = Synthesizer::new(&config, &paths).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_trf_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::with_defaults(dir.path()).unwrap();
        let config = SpeechConfig { phonemize: PhonemizeMode::Local { british: false, trf: true }, backend: Backend::Onnx, ..Default::default() };

        let err = Synthesizer::new(&config, &paths).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Phonemize);
    }
}
