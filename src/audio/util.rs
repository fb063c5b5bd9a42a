//! Output device helpers.

use anyhow::Result;
use cpal::traits::DeviceTrait;
use cpal::{Device, SampleFormat, SupportedStreamConfig, SupportedStreamConfigRange};

/// Get a human-readable device name, or "Unknown".
pub fn get_device_name(device: &Device) -> String {
    device.description().ok().map(|desc| desc.name().to_string()).unwrap_or_else(|| "Unknown".to_string())
}

/// Find the best output configuration for `target_sample_rate`.
///
/// Only mono or stereo F32 configurations are considered. The first one covering the
/// target rate wins; otherwise the first candidate is clamped to its nearest supported rate.
///
/// # Errors
/// Returns an error if the device offers no mono/stereo F32 configuration.
pub fn find_best_config(configs: impl Iterator<Item = SupportedStreamConfigRange>, target_sample_rate: u32) -> Result<SupportedStreamConfig> {
    let candidates: Vec<SupportedStreamConfigRange> = configs.filter(|c| c.channels() <= 2 && c.sample_format() == SampleFormat::F32).collect();

    if let Some(config) = candidates.iter().find(|c| (c.min_sample_rate()..=c.max_sample_rate()).contains(&target_sample_rate)) {
        return Ok(config.clone().with_sample_rate(target_sample_rate));
    }

    let Some(config) = candidates.first() else {
        anyhow::bail!("No F32 audio configuration found on the output device");
    };
    let rate = target_sample_rate.clamp(config.min_sample_rate(), config.max_sample_rate());
    Ok(config.clone().with_sample_rate(rate))
}

#[cfg(test)]
mod tests {
    use cpal::SupportedBufferSize;

    use super::*;

    fn range(channels: u16, min: u32, max: u32, format: SampleFormat) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(channels, min, max, SupportedBufferSize::Unknown, format)
    }

    #[test]
    fn test_prefers_range_covering_target() {
        let configs = vec![range(2, 44100, 44100, SampleFormat::F32), range(2, 8000, 96000, SampleFormat::F32)];
        let config = find_best_config(configs.into_iter(), 24000).unwrap();
        assert_eq!(config.sample_rate(), 24000);
    }

    #[test]
    fn test_clamps_when_no_range_matches() {
        let configs = vec![range(2, 44100, 48000, SampleFormat::F32)];
        let config = find_best_config(configs.into_iter(), 24000).unwrap();
        assert_eq!(config.sample_rate(), 44100);
    }

    #[test]
    fn test_skips_multichannel_and_integer_formats() {
        let configs = vec![range(6, 8000, 96000, SampleFormat::F32), range(2, 8000, 96000, SampleFormat::I16)];
        assert!(find_best_config(configs.into_iter(), 24000).is_err());
    }
}
