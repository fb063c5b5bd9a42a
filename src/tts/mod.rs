//! Text-to-speech entry points.
//!
//! [`Synthesizer`] keeps a loaded engine for repeated calls; [`generate_speech`] and
//! [`generate_tts`] load one per call.

mod synthesizer;

pub use synthesizer::{SpeechOutput, SpeechResult, Synthesizer, generate_speech, generate_tts};
