//! Configuration module for kokoro-speak.
//!
//! Provides CLI argument parsing, per-call synthesis settings, and the voice table.

#[allow(clippy::module_inception)]
mod config;
pub mod voices;

pub use config::{AppConfig, Backend, PhonemizeMode, PhonemizeStrategy, Provider, SpeechConfig};
