//! Audio output: sound files and optional speaker playback.
//!
//! Playback goes through cpal, with rubato resampling to the device rate.

mod playback;
pub mod resampler;
pub mod util;
pub mod wav;

pub use playback::Player;
pub use wav::{AudioFormat, read_wav, write_audio};
