//! Kokoro via sherpa-onnx.
//!
//! sherpa-onnx runs its own front end (lexicon files with espeak-ng, or espeak-ng alone for
//! languages without a lexicon), so this backend only accepts raw text.

use sherpa_rs::OnnxConfig;
use sherpa_rs::tts::{CommonTtsConfig, KokoroTts, KokoroTtsConfig};
use tracing::{debug, info};

use super::{AudioBuffer, EngineInput, SpeechEngine};
use crate::config::voices;
use crate::config::{Provider, SpeechConfig};
use crate::error::{TtsError, TtsResult};
use crate::paths::ArtifactPaths;

/// Kokoro engine on sherpa-onnx.
pub struct SherpaKokoro {
    tts: KokoroTts, // Kokoro TTS engine
    lang: String,   // Language tag the engine was built for
}

impl SherpaKokoro {
    /// Create a new sherpa-onnx Kokoro engine.
    ///
    /// The front end is fixed at construction: English and Mandarin use the bundled lexicons
    /// (chosen by voice prefix and language tag), everything else uses espeak-ng with the tag.
    ///
    /// # Errors
    /// Returns `MissingArtifact` if a required file is absent and `Engine` if the model
    /// cannot be loaded.
    pub fn new(paths: &ArtifactPaths, config: &SpeechConfig) -> TtsResult<Self> {
        ArtifactPaths::require([paths.model.as_path(), paths.voices.as_path(), paths.tokens.as_path(), paths.espeak_data.as_path()])?;

        // sherpa-onnx aborts the process on a model it cannot parse, so load it with ort first
        drop(super::onnx::load_session(&paths.model, 1)?);
        debug!("Model {} passed the ONNX Runtime load check", paths.model.display());

        let provider: Provider = config.effective_provider();
        let threads = config.effective_threads();
        let (lexicon, lang) = front_end(paths, &config.voice, &config.lang);

        info!("Initializing sherpa-onnx Kokoro engine with {} provider ({} threads)", provider, threads);
        if lexicon.is_empty() {
            info!("Front end: espeak-ng ({})", lang);
        } else {
            info!("Front end: lexicon {}", lexicon);
        }

        let tts_config = KokoroTtsConfig {
            model: paths.model.to_string_lossy().to_string(),
            voices: paths.voices.to_string_lossy().to_string(),
            tokens: paths.tokens.to_string_lossy().to_string(),
            data_dir: paths.espeak_data.to_string_lossy().to_string(),
            dict_dir: paths.dict_dir.to_string_lossy().to_string(),
            lexicon,
            lang: lang.clone(),
            length_scale: 1.0, // Speed is applied per call
            onnx_config: OnnxConfig {
                provider: provider.as_sherpa_provider().to_string(),
                num_threads: threads.try_into().unwrap_or(2),
                debug: config.debug,
            },
            common_config: CommonTtsConfig { max_num_sentences: 1, ..Default::default() }, // Kokoro only supports 1
        };

        let tts = KokoroTts::new(tts_config);
        Ok(Self { tts, lang })
    }
}

impl SpeechEngine for SherpaKokoro {
    fn create(&mut self, input: EngineInput<'_>, voice: &str, speed: f32) -> TtsResult<AudioBuffer> {
        let text = match input {
            EngineInput::Text { text, lang } => {
                if !lang.is_empty() && lang != self.lang && !self.lang.is_empty() {
                    debug!("Engine front end is '{}', ignoring per-call language '{}'", self.lang, lang);
                }
                text
            }
            EngineInput::Phonemes(_) => {
                return Err(TtsError::Unsupported("the sherpa backend does not accept phoneme input; use --phonemize engine or --backend onnx".to_string()));
            }
        };

        let speaker_id = voices::get_voice(voice).ok_or_else(|| TtsError::Engine(format!("Unknown voice '{}'", voice)))?.speaker_id;

        debug!("Synthesizing with speaker {}: \"{}\"", speaker_id, text);
        let audio = self.tts.create(text, speaker_id, speed).map_err(|e| TtsError::Engine(format!("TTS generation failed: {}", e)))?;

        info!("🎵 Generated speech ({} samples)", audio.samples.len());
        Ok(AudioBuffer { samples: audio.samples, sample_rate: audio.sample_rate })
    }

    fn name(&self) -> &'static str {
        "sherpa-kokoro"
    }
}

/// Choose lexicon files and language tag for the sherpa front end.
///
/// Returns `(lexicon, lang)`; exactly one of them is non-empty.
/// Reference: <https://github.com/k2-fsa/sherpa-onnx/blob/master/sherpa-onnx/csrc/offline-tts-kokoro-model-config.cc>
fn front_end(paths: &ArtifactPaths, voice: &str, lang: &str) -> (String, String) {
    let lang = lang.to_ascii_lowercase();
    let prefix = voice.get(..1).unwrap_or("a");

    if lang.starts_with("en") {
        let british = lang == "en-gb" || prefix == "b";
        return (paths.lexicon(british).to_string_lossy().to_string(), String::new());
    }

    if lang == "cmn" || lang.starts_with("zh") {
        // Chinese with English fallback
        let lexicon = format!("{},{}", paths.lexicon_us.to_string_lossy(), paths.lexicon_zh.to_string_lossy());
        return (lexicon, String::new());
    }

    (String::new(), lang)
}
