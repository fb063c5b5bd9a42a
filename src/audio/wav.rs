//! Sound file output.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::engine::AudioBuffer;
use crate::error::{TtsError, TtsResult};

/// Sound-file container, chosen by the output path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// 16-bit PCM WAV
    Wav,
}

impl AudioFormat {
    /// Pick the format for `path`.
    ///
    /// # Errors
    /// Returns `UnsupportedFormat` for anything other than `.wav`.
    pub fn from_path(path: &Path) -> TtsResult<Self> {
        let extension = path.extension().map(|e| e.to_string_lossy().to_ascii_lowercase()).unwrap_or_default();
        match extension.as_str() {
            "wav" => Ok(AudioFormat::Wav),
            _ => Err(TtsError::UnsupportedFormat { extension }),
        }
    }
}

/// Write mono audio to `path`, replacing any existing file.
///
/// # Errors
/// Returns `Engine` for an empty buffer, `UnsupportedFormat` for an unknown extension,
/// and `Write` if the file cannot be written.
pub fn write_audio(path: &Path, audio: &AudioBuffer) -> TtsResult<()> {
    if audio.samples.is_empty() {
        return Err(TtsError::Engine("engine returned no samples".to_string()));
    }

    match AudioFormat::from_path(path)? {
        AudioFormat::Wav => write_wav(path, audio).map_err(|e| TtsError::Write { path: path.to_path_buf(), message: e.to_string() }),
    }
}

fn write_wav(path: &Path, audio: &AudioBuffer) -> hound::Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;

    for &sample in &audio.samples {
        let value = sample.clamp(-1.0, 1.0);
        writer.write_sample((value * i16::MAX as f32).round() as i16)?;
    }

    writer.finalize()?;
    debug!("Wrote {} samples at {} Hz to {}", audio.samples.len(), audio.sample_rate, path.display());
    Ok(())
}

/// Read a mono or multi-channel WAV file back as f32 samples (first channel only).
pub fn read_wav(path: &Path) -> anyhow::Result<AudioBuffer> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let max = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader.samples::<i32>().map(|s| s.map(|v| v as f32 / max)).collect::<Result<_, _>>()?
        }
    };

    let samples = interleaved.into_iter().step_by(channels).collect();
    Ok(AudioBuffer { samples, sample_rate: spec.sample_rate })
}
