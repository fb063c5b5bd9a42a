//! Sample rate conversion for playback.
//!
//! Kokoro renders at 24 kHz while most output devices run at 44.1 or 48 kHz, so generated
//! audio is converted in one pass before it is queued for the device.

use anyhow::{Context, Result};
use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Fft, FixedSync, Resampler};

/// Input frames per FFT pass.
const CHUNK_SIZE: usize = 1024;

/// FFT sub-chunks per pass (higher = better quality but more CPU).
const SUB_CHUNKS: usize = 2;

/// Resample a mono buffer from `from_rate` to `to_rate`.
///
/// The final partial chunk is zero-padded and the result is cut back to the expected length.
///
/// # Arguments
/// * `samples` - Mono input samples
/// * `from_rate` - Input sample rate (e.g., 24000 for Kokoro)
/// * `to_rate` - Output sample rate (e.g., 48000 for the device)
///
/// # Example
/// ```no_run
/// use kokoro_speak::audio::resampler::resample;
///
/// let speech = vec![0.0; 24000]; // 1 second at 24kHz
/// let device_audio = resample(&speech, 24000, 48000).unwrap();
/// assert_eq!(device_audio.len(), 48000);
/// ```
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler = Fft::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, SUB_CHUNKS, 1, FixedSync::Input).context("Failed to create resampler")?;

    let output_frames_max = resampler.output_frames_max();
    let mut output_buffer = vec![0.0f32; output_frames_max];

    let expected_len = (samples.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    let mut output = Vec::with_capacity(expected_len + output_frames_max);

    let mut chunk = vec![0.0f32; CHUNK_SIZE];
    for block in samples.chunks(CHUNK_SIZE) {
        chunk[..block.len()].copy_from_slice(block);
        chunk[block.len()..].fill(0.0);

        let input_adapter = InterleavedSlice::new(&chunk, 1, CHUNK_SIZE).context("Failed to create input adapter")?;
        let mut output_adapter = InterleavedSlice::new_mut(&mut output_buffer, 1, output_frames_max).context("Failed to create output adapter")?;

        let (_, frames_written) = resampler.process_into_buffer(&input_adapter, &mut output_adapter, None).map_err(|e| anyhow::anyhow!("Resampling error: {}", e))?;
        output.extend_from_slice(&output_buffer[..frames_written]);
    }

    output.truncate(expected_len);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_is_copy() {
        let samples = vec![0.25f32; 100];
        assert_eq!(resample(&samples, 24000, 24000).unwrap(), samples);
    }

    #[test]
    fn test_upsample_speech_rate() {
        // 1 second at 24kHz to a 48kHz device
        let samples = vec![0.0; 24000];
        let result = resample(&samples, 24000, 48000).unwrap();
        assert!(result.len() > 47000 && result.len() <= 48000, "got {}", result.len());
    }

    #[test]
    fn test_upsample_to_cd_rate() {
        let samples = vec![0.0; 24000];
        let result = resample(&samples, 24000, 44100).unwrap();
        assert!(result.len() > 43000 && result.len() <= 44100, "got {}", result.len());
    }

    #[test]
    fn test_empty_input() {
        assert!(resample(&[], 24000, 48000).unwrap().is_empty());
    }
}
