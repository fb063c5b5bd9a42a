//! Pronunciation lexicon in the Kokoro/sherpa-onnx text format.
//!
//! Each line holds a word followed by its phoneme symbols, separated by whitespace:
//!
//! ```text
//! hello h ə l ˈO
//! world w ˈɜ ɹ l d
//! ```

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{TtsError, TtsResult};

/// Word to phoneme-string lookup table.
#[derive(Debug, Default, Clone)]
pub struct Lexicon {
    entries: HashMap<String, String>,
}

impl Lexicon {
    /// Load a lexicon file.
    ///
    /// # Errors
    /// Returns `MissingArtifact` if the file does not exist, `Phonemize` if it cannot be read.
    pub fn load(path: &Path) -> TtsResult<Self> {
        if !path.exists() {
            return Err(TtsError::MissingArtifact { path: path.to_path_buf() });
        }

        let content = std::fs::read_to_string(path).map_err(|e| TtsError::Phonemize(format!("Failed to read lexicon {}: {}", path.display(), e)))?;
        let lexicon = Self::parse(&content);
        debug!("Loaded lexicon {} ({} entries)", path.display(), lexicon.len());
        Ok(lexicon)
    }

    /// Parse lexicon text. Blank lines, comments, and words without phonemes are skipped.
    /// When a word appears twice the first entry wins.
    pub fn parse(content: &str) -> Self {
        let mut entries = HashMap::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };
            let phonemes: String = parts.collect();
            if phonemes.is_empty() {
                continue;
            }

            entries.entry(word.to_string()).or_insert(phonemes);
        }

        Self { entries }
    }

    /// Look up a word as written, then lowercased.
    pub fn get(&self, word: &str) -> Option<&str> {
        self.entries.get(word).or_else(|| self.entries.get(&word.to_lowercase())).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
