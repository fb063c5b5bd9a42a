//! Application configuration and CLI argument parsing.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::voices;

/// Hardware acceleration provider for ONNX models.
/// Auto-detected based on platform if not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// CPU inference (default fallback, always available)
    #[default]
    Cpu,
    /// NVIDIA CUDA acceleration (Linux only, requires CUDA toolkit)
    Cuda,
    /// Apple CoreML acceleration (macOS only, uses Neural Engine)
    #[value(name = "coreml")]
    CoreMl,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sherpa_provider())
    }
}

impl Provider {
    /// Convert to sherpa-rs provider string.
    pub fn as_sherpa_provider(&self) -> &'static str {
        match self {
            Provider::Cpu => "cpu",
            Provider::Cuda => "cuda",
            Provider::CoreMl => "coreml",
        }
    }
}

/// Inference engine used for synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Kokoro model run directly through ONNX Runtime (accepts phonemes)
    #[default]
    Onnx,
    /// Kokoro via sherpa-onnx (text only, does its own G2P)
    Sherpa,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Onnx => write!(f, "onnx"),
            Backend::Sherpa => write!(f, "sherpa"),
        }
    }
}

/// Where grapheme-to-phoneme conversion happens (CLI form).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PhonemizeStrategy {
    /// Phonemize locally with lexicon lookup and espeak-ng fallback
    #[default]
    Local,
    /// Hand raw text and a language tag to the engine
    Engine,
}

/// Where grapheme-to-phoneme conversion happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum PhonemizeMode {
    /// Local G2P; the engine receives a phoneme sequence.
    Local {
        british: bool, // GB lexicon and en-gb fallback
        trf: bool,     // Transformer-based disambiguation
    },
    /// The engine phonemizes raw text using the language tag.
    Engine,
}

impl Default for PhonemizeMode {
    fn default() -> Self {
        PhonemizeMode::Local { british: false, trf: false }
    }
}

/// Per-call synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    pub voice: String,             // Voice identifier (passed through to the engine)
    pub speed: f32,                // Speech rate multiplier (passed through to the engine)
    pub phonemize: PhonemizeMode,  // Local G2P or delegate to the engine
    pub lang: String,              // Language tag for engine-side G2P
    pub backend: Backend,          // Inference engine
    pub provider: Option<Provider>, // Acceleration provider (sherpa backend)
    pub threads: usize,            // Inference threads (0 = auto)
    pub debug: bool,               // Verbose engine logging
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            voice: "af_heart".to_string(),
            speed: 1.0,
            phonemize: PhonemizeMode::default(),
            lang: "en-us".to_string(),
            backend: Backend::default(),
            provider: None,
            threads: 0,
            debug: false,
        }
    }
}

impl SpeechConfig {
    /// Get the effective acceleration provider.
    pub fn effective_provider(&self) -> Provider {
        self.provider.unwrap_or_else(detect_provider)
    }

    /// Resolve the thread count, auto-detecting when 0.
    ///
    /// With CUDA the GPU handles parallelism, so a single CPU thread is used.
    /// On CPU, cores/3 leaves headroom for the rest of the system.
    pub fn effective_threads(&self) -> usize {
        if self.threads > 0 {
            return self.threads;
        }
        if self.backend == Backend::Sherpa && self.effective_provider() == Provider::Cuda {
            1
        } else {
            (num_cpus::get() / 3).max(1)
        }
    }
}

/// kokoro-speak command line configuration.
#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "kokoro-speak")]
#[command(author, version, about = "Synthesize text to a sound file with Kokoro", long_about = None)]
pub struct AppConfig {
    /// Text to synthesize
    pub text: Option<String>,

    /// Read the text to synthesize from a file instead
    #[arg(long, conflicts_with = "text")]
    pub text_file: Option<PathBuf>,

    /// Output sound file (format is taken from the extension)
    #[arg(long, short = 'o', default_value = "out/output.wav")]
    pub output: PathBuf,

    /// List all available voices and exit
    #[arg(long)]
    pub list_voices: bool,

    /// Show detailed information about a specific voice and exit
    #[arg(long)]
    pub voice_info: Option<String>,

    /// Voice name (e.g., af_heart, bf_emma)
    #[arg(long, default_value = "af_heart")]
    pub voice: String,

    /// Speech speed multiplier
    #[arg(long, default_value = "1.0")]
    pub speed: f32,

    /// Where phonemization happens: 'local' (lexicon + espeak-ng fallback) or 'engine'
    #[arg(long, value_enum, default_value = "local")]
    pub phonemize: PhonemizeStrategy,

    /// Language tag for engine-side phonemization (e.g., en-us, en-gb, es, fr-fr)
    #[arg(long, default_value = "en-us")]
    pub lang: String,

    /// Use British pronunciation for local phonemization
    #[arg(long)]
    pub british: bool,

    /// Use transformer-based disambiguation for local phonemization
    #[arg(long)]
    pub trf: bool,

    /// Inference backend
    #[arg(long, value_enum, default_value = "onnx")]
    pub backend: Backend,

    /// Hardware acceleration provider for the sherpa backend (auto-detected if not specified)
    #[arg(long, value_enum)]
    pub provider: Option<Provider>,

    /// Inference threads (0 = auto-detect based on CPU cores)
    #[arg(long, default_value = "0")]
    pub threads: usize,

    /// Directory holding models/ and voices/ (defaults to the executable's directory)
    #[arg(long, short = 'd', env = "KOKORO_DIR")]
    pub artifact_dir: Option<PathBuf>,

    /// Model file name under models/
    #[arg(long, default_value = "kokoro-v1.0.fp16-gpu.onnx")]
    pub model_file: String,

    /// Voice data file name under voices/
    #[arg(long, default_value = "voices-v1.0.bin")]
    pub voices_file: String,

    /// Play the generated audio after writing it
    #[arg(long)]
    pub play: bool,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl AppConfig {
    /// Parse configuration from command line arguments.
    pub fn from_args() -> Self {
        let config = Self::parse();

        // Handle voice listing commands
        if config.list_voices {
            voices::print_voices();
            std::process::exit(0);
        }

        if let Some(ref voice_name) = config.voice_info {
            match voices::print_voice_info(voice_name) {
                Ok(_) => std::process::exit(0),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }

        config
    }

    /// Build the per-call synthesis settings.
    pub fn speech_config(&self) -> SpeechConfig {
        let phonemize = match self.phonemize {
            PhonemizeStrategy::Local => PhonemizeMode::Local { british: self.british, trf: self.trf },
            PhonemizeStrategy::Engine => PhonemizeMode::Engine,
        };

        SpeechConfig {
            voice: self.voice.clone(),
            speed: self.speed,
            phonemize,
            lang: self.lang.clone(),
            backend: self.backend,
            provider: self.provider,
            threads: self.threads,
            debug: self.verbose,
        }
    }

    /// Get the text to synthesize, from the argument or the text file.
    pub fn input_text(&self) -> Result<String> {
        match (&self.text, &self.text_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => std::fs::read_to_string(path).with_context(|| format!("Failed to read text file {}", path.display())),
            (None, None) => anyhow::bail!("No input text given (pass TEXT or --text-file)"),
        }
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        let speech = self.speech_config();
        info!("Configuration:");
        info!("  Output: {}", self.output.display());
        info!("  Voice: {}", speech.voice);
        info!("  Speed: {}", speech.speed);
        match speech.phonemize {
            PhonemizeMode::Local { british, trf } => info!("  Phonemization: local (british={}, trf={})", british, trf),
            PhonemizeMode::Engine => info!("  Phonemization: engine (lang={})", speech.lang),
        }
        info!("  Backend: {}", speech.backend);
        if speech.backend == Backend::Sherpa {
            info!("  Provider: {}", speech.effective_provider());
        }
        info!("  Threads: {}", speech.effective_threads());
        if let Some(ref dir) = self.artifact_dir {
            info!("  Artifact directory: {}", dir.display());
        }
        info!("  Model file: {}", self.model_file);
        info!("  Voices file: {}", self.voices_file);
    }
}

/// Auto-detect the best hardware acceleration provider.
fn detect_provider() -> Provider {
    #[cfg(target_os = "macos")]
    {
        info!("Detected macOS, using CoreML provider");
        Provider::CoreMl
    }

    #[cfg(target_os = "linux")]
    {
        if has_nvidia_gpu() {
            info!("Detected NVIDIA GPU, using CUDA provider");
            Provider::Cuda
        } else {
            info!("No GPU detected, using CPU provider");
            Provider::Cpu
        }
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        info!("Using CPU provider");
        Provider::Cpu
    }
}

/// Check if an NVIDIA GPU is available (Linux only).
#[cfg(target_os = "linux")]
fn has_nvidia_gpu() -> bool {
    use std::path::Path;

    let nvidia_paths = [
        "/dev/nvidia0",
        "/dev/nvidiactl",
        "/dev/nvidia-uvm",
        // Jetson devices
        "/dev/nvhost-ctrl",
        "/dev/nvhost-ctrl-gpu",
        "/etc/nv_tegra_release",
    ];

    nvidia_paths.iter().any(|path| Path::new(path).exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_local_variant() {
        let config = AppConfig::parse_from(["kokoro-speak", "Hello world"]);
        let speech = config.speech_config();
        assert_eq!(speech.voice, "af_heart");
        assert_eq!(speech.speed, 1.0);
        assert_eq!(speech.phonemize, PhonemizeMode::Local { british: false, trf: false });
        assert_eq!(speech.backend, Backend::Onnx);
        assert_eq!(config.output, PathBuf::from("out/output.wav"));
        assert_eq!(config.input_text().unwrap(), "Hello world");
    }

    #[test]
    fn test_engine_mode_from_args() {
        let config = AppConfig::parse_from([
            "kokoro-speak",
            "Hola",
            "--phonemize",
            "engine",
            "--lang",
            "es",
            "--voice",
            "ef_dora",
            "--speed",
            "1.2",
        ]);
        let speech = config.speech_config();
        assert_eq!(speech.phonemize, PhonemizeMode::Engine);
        assert_eq!(speech.lang, "es");
        assert_eq!(speech.voice, "ef_dora");
        assert_eq!(speech.speed, 1.2);
    }

    #[test]
    fn test_british_flag_carried() {
        let config = AppConfig::parse_from(["kokoro-speak", "Hello", "--british"]);
        assert_eq!(config.speech_config().phonemize, PhonemizeMode::Local { british: true, trf: false });
    }

    #[test]
    fn test_missing_text_is_an_error() {
        let config = AppConfig::parse_from(["kokoro-speak"]);
        assert!(config.input_text().is_err());
    }

    #[test]
    fn test_explicit_threads_win() {
        let speech = SpeechConfig { threads: 3, ..Default::default() };
        assert_eq!(speech.effective_threads(), 3);
        assert!(SpeechConfig::default().effective_threads() >= 1);
    }
}
