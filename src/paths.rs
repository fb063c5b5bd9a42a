//! Artifact and output path resolution.
//!
//! Model artifacts live next to the installed executable:
//!
//! ```text
//! <base>/models/<model file>
//! <base>/models/tokens.txt
//! <base>/models/lexicon-us-en.txt
//! <base>/models/lexicon-gb-en.txt
//! <base>/models/lexicon-zh.txt
//! <base>/models/espeak-ng-data/
//! <base>/voices/<voice data file>
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{TtsError, TtsResult};

/// Default model file name.
pub const DEFAULT_MODEL_FILE: &str = "kokoro-v1.0.fp16-gpu.onnx";

/// Default voice data file name.
pub const DEFAULT_VOICES_FILE: &str = "voices-v1.0.bin";

/// Resolved absolute locations of the bundled artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,       // ONNX model weights
    pub voices: PathBuf,      // Voice style data (NPZ or raw f32)
    pub tokens: PathBuf,      // Phoneme vocabulary
    pub lexicon_us: PathBuf,  // American English lexicon
    pub lexicon_gb: PathBuf,  // British English lexicon
    pub lexicon_zh: PathBuf,  // Mandarin lexicon (sherpa backend)
    pub espeak_data: PathBuf, // espeak-ng data directory (sherpa backend)
    pub dict_dir: PathBuf,    // Chinese segmentation dictionaries (sherpa backend)
}

impl ArtifactPaths {
    /// Resolve artifact paths under `base_dir`.
    ///
    /// A relative `base_dir` is interpreted against the current directory.
    pub fn resolve(base_dir: &Path, model_file: &str, voices_file: &str) -> TtsResult<Self> {
        let base = std::path::absolute(base_dir).map_err(|_| TtsError::MissingArtifact { path: base_dir.to_path_buf() })?;
        let models = base.join("models");

        let paths = Self {
            model: models.join(model_file),
            voices: base.join("voices").join(voices_file),
            tokens: models.join("tokens.txt"),
            lexicon_us: models.join("lexicon-us-en.txt"),
            lexicon_gb: models.join("lexicon-gb-en.txt"),
            lexicon_zh: models.join("lexicon-zh.txt"),
            espeak_data: models.join("espeak-ng-data"),
            dict_dir: models.join("dict"),
        };

        debug!("Model path: {}", paths.model.display());
        debug!("Voices path: {}", paths.voices.display());
        Ok(paths)
    }

    /// Resolve artifact paths using the default file names.
    pub fn with_defaults(base_dir: &Path) -> TtsResult<Self> {
        Self::resolve(base_dir, DEFAULT_MODEL_FILE, DEFAULT_VOICES_FILE)
    }

    /// Pick the lexicon for the requested accent.
    pub fn lexicon(&self, british: bool) -> &Path {
        if british { &self.lexicon_gb } else { &self.lexicon_us }
    }

    /// Fail with `MissingArtifact` on the first path that does not exist.
    pub fn require<'a>(paths: impl IntoIterator<Item = &'a Path>) -> TtsResult<()> {
        for path in paths {
            if !path.exists() {
                return Err(TtsError::MissingArtifact { path: path.to_path_buf() });
            }
        }
        Ok(())
    }
}

/// Default base directory: the directory holding the running executable.
///
/// Falls back to `~/.kokoro-speak`, then to the current directory.
pub fn default_base_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        return dir.to_path_buf();
    }

    if let Some(home_dir) = dirs::home_dir() {
        home_dir.join(".kokoro-speak")
    } else {
        PathBuf::from(".")
    }
}

/// Make an output path absolute against the current directory.
pub fn absolute_output(path: &Path) -> TtsResult<PathBuf> {
    std::path::absolute(path).map_err(|e| TtsError::OutputDir { path: path.to_path_buf(), source: e })
}

/// Create the parent directory of `output` (and any missing ancestors).
pub fn ensure_parent_dir(output: &Path) -> TtsResult<()> {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| TtsError::OutputDir { path: parent.to_path_buf(), source: e })
        }
        _ => Ok(()),
    }
}
