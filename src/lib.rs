//! Kokoro text-to-speech to sound files.
//!
//! Text is phonemized (locally, or by the engine from a language tag), synthesized by a
//! Kokoro model and written to a WAV file.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use kokoro_speak::config::SpeechConfig;
//! use kokoro_speak::paths::ArtifactPaths;
//!
//! let paths = ArtifactPaths::with_defaults(Path::new("/opt/kokoro")).unwrap();
//! let output = kokoro_speak::generate_speech("Hello world", Path::new("out/hello.wav"), &SpeechConfig::default(), &paths).unwrap();
//! println!("{} samples at {} Hz", output.num_samples, output.sample_rate);
//! ```

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod paths;
pub mod phonemize;
pub mod tts;

pub use error::{ErrorKind, TtsError, TtsResult};
pub use tts::{SpeechOutput, SpeechResult, Synthesizer, generate_speech, generate_tts};
