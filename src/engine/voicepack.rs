//! Voice style vectors for Kokoro models.
//!
//! Two on-disk formats are supported:
//! - **NPZ** (`voices-v1.0.bin` from kokoro-onnx): one `(510, 1, 256)` array per voice name
//! - **Raw** (`voices.bin` from sherpa-onnx): contiguous little-endian f32 `[voices, 510, 256]`,
//!   indexed by speaker id

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use ndarray::{Array3, s};
use ndarray_npy::NpzReader;
use tracing::debug;

use crate::config::voices;
use crate::error::{TtsError, TtsResult};

/// Style vector dimension.
pub const STYLE_DIM: usize = 256;

/// Style rows per voice (one per phoneme length).
pub const STYLE_ROWS: usize = 510;

/// On-disk voice data format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceFormat {
    Npz,
    Raw,
}

/// Detect the format from the leading bytes (NPZ files are ZIP archives starting with "PK").
pub fn detect_format(bytes: &[u8]) -> VoiceFormat {
    if bytes.starts_with(b"PK") { VoiceFormat::Npz } else { VoiceFormat::Raw }
}

/// Loaded voice data.
pub enum VoicePack {
    Npz {
        path: PathBuf,
        cache: HashMap<String, Array3<f32>>, // Voices loaded so far
    },
    Raw {
        data: Vec<f32>, // [voices, STYLE_ROWS, STYLE_DIM]
    },
}

impl VoicePack {
    /// Open a voice data file.
    ///
    /// # Errors
    /// Returns `MissingArtifact` if the file is absent and `Engine` if it is unreadable or malformed.
    pub fn open(path: &Path) -> TtsResult<Self> {
        if !path.exists() {
            return Err(TtsError::MissingArtifact { path: path.to_path_buf() });
        }

        let bytes = std::fs::read(path).map_err(|e| TtsError::Engine(format!("Failed to read voices file {}: {}", path.display(), e)))?;

        match detect_format(&bytes) {
            VoiceFormat::Npz => {
                // Fail early on a broken archive
                let file = File::open(path).map_err(|e| TtsError::Engine(format!("Failed to open voices file: {}", e)))?;
                let mut npz = NpzReader::new(file).map_err(|e| TtsError::Engine(format!("Invalid NPZ voices file {}: {}", path.display(), e)))?;
                let names = npz.names().map_err(|e| TtsError::Engine(format!("Invalid NPZ voices file: {}", e)))?;
                debug!("Voices file {} (npz, {} voices)", path.display(), names.len());
                Ok(VoicePack::Npz { path: path.to_path_buf(), cache: HashMap::new() })
            }
            VoiceFormat::Raw => Self::from_raw_bytes(&bytes),
        }
    }

    /// Build a raw voice pack from little-endian f32 bytes.
    pub fn from_raw_bytes(bytes: &[u8]) -> TtsResult<Self> {
        let voice_bytes = STYLE_ROWS * STYLE_DIM * 4;
        if bytes.is_empty() || bytes.len() % voice_bytes != 0 {
            return Err(TtsError::Engine(format!("Voices file is corrupt: {} bytes is not a multiple of {}", bytes.len(), voice_bytes)));
        }

        let data: Vec<f32> = bytes.chunks_exact(4).map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])).collect();
        debug!("Voices file (raw, {} voices)", data.len() / (STYLE_ROWS * STYLE_DIM));
        Ok(VoicePack::Raw { data })
    }

    /// Style vector for `voice` at a phoneme sequence of `token_len` symbols.
    ///
    /// # Errors
    /// Returns `Engine` if the voice is unknown.
    pub fn style(&mut self, voice: &str, token_len: usize) -> TtsResult<Vec<f32>> {
        let row = token_len.min(STYLE_ROWS - 1);

        match self {
            VoicePack::Raw { data } => {
                let speaker = voices::get_voice(voice).ok_or_else(|| TtsError::Engine(format!("Unknown voice '{}'", voice)))?.speaker_id as usize;
                let start = (speaker * STYLE_ROWS + row) * STYLE_DIM;
                data.get(start..start + STYLE_DIM)
                    .map(<[f32]>::to_vec)
                    .ok_or_else(|| TtsError::Engine(format!("Voice '{}' (speaker {}) is not in the voices file", voice, speaker)))
            }
            VoicePack::Npz { path, cache } => {
                if !cache.contains_key(voice) {
                    let array = load_npz_voice(path, voice)?;
                    cache.insert(voice.to_string(), array);
                }
                let array = &cache[voice];
                let row = row.min(array.shape()[0].saturating_sub(1));
                let style: Vec<f32> = array.slice(s![row, 0, ..]).iter().copied().collect();
                if style.len() != STYLE_DIM {
                    return Err(TtsError::Engine(format!("Style dimension mismatch: expected {}, got {}", STYLE_DIM, style.len())));
                }
                Ok(style)
            }
        }
    }
}

/// Load one voice array, accepting archive entries with or without the `.npy` suffix.
fn load_npz_voice(path: &Path, voice: &str) -> TtsResult<Array3<f32>> {
    let file = File::open(path).map_err(|e| TtsError::Engine(format!("Failed to open voices file: {}", e)))?;
    let mut npz = NpzReader::new(file).map_err(|e| TtsError::Engine(format!("Invalid NPZ voices file: {}", e)))?;

    if let Ok(array) = npz.by_name(voice) {
        return Ok(array);
    }
    npz.by_name(&format!("{}.npy", voice)).map_err(|_| TtsError::Engine(format!("Voice '{}' not found in voices file", voice)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_pack(voices: usize) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(voices * STYLE_ROWS * STYLE_DIM * 4);
        for v in 0..voices {
            for row in 0..STYLE_ROWS {
                for _ in 0..STYLE_DIM {
                    bytes.extend_from_slice(&((v * 1000 + row) as f32).to_le_bytes());
                }
            }
        }
        bytes
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(b"PK\x03\x04"), VoiceFormat::Npz);
        assert_eq!(detect_format(&1.0f32.to_le_bytes()), VoiceFormat::Raw);
    }

    #[test]
    fn test_raw_style_selects_speaker_and_row() {
        // af_heart is speaker 3
        let mut pack = VoicePack::from_raw_bytes(&raw_pack(4)).unwrap();
        let style = pack.style("af_heart", 12).unwrap();
        assert_eq!(style.len(), STYLE_DIM);
        assert_eq!(style[0], 3012.0);

        // Rows clamp at the last entry
        let style = pack.style("af_alloy", 10_000).unwrap();
        assert_eq!(style[0], (STYLE_ROWS - 1) as f32);
    }

    #[test]
    fn test_raw_unknown_or_absent_voice() {
        let mut pack = VoicePack::from_raw_bytes(&raw_pack(1)).unwrap();
        assert!(matches!(pack.style("xx_nobody", 1), Err(TtsError::Engine(_))));
        // am_onyx is speaker 17, not present in a one-voice pack
        assert!(matches!(pack.style("am_onyx", 1), Err(TtsError::Engine(_))));
    }

    #[test]
    fn test_corrupt_raw_rejected() {
        assert!(matches!(VoicePack::from_raw_bytes(&[0u8; 10]), Err(TtsError::Engine(_))));
        assert!(matches!(VoicePack::from_raw_bytes(&[]), Err(TtsError::Engine(_))));
    }

    #[test]
    fn test_open_corrupt_npz() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voices.bin");
        std::fs::write(&path, b"PK\x03\x04 definitely not a zip archive").unwrap();
        assert!(matches!(VoicePack::open(&path), Err(TtsError::Engine(_))));
    }

    #[test]
    fn test_open_missing() {
        assert!(matches!(VoicePack::open(Path::new("/nonexistent/voices.bin")), Err(TtsError::MissingArtifact { .. })));
    }
}
