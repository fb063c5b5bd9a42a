//! espeak-ng phonemizer.
//!
//! Calls the `espeak-ng` system command to convert text to IPA phonemes.
//! Requires espeak-ng to be installed on the system.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{TtsError, TtsResult};

/// Fallback engine for words the lexicon does not know.
pub trait Fallback: Send + Sync {
    /// Convert a word (or a run of text) to IPA phonemes.
    fn phonemize(&self, text: &str) -> TtsResult<String>;

    /// Human-readable name of this fallback.
    fn name(&self) -> &'static str;
}

/// espeak-ng phonemizer for a single espeak voice (e.g., "en-us", "en-gb", "es").
///
/// Requires espeak-ng to be installed:
/// - macOS: `brew install espeak-ng`
/// - Linux: `apt-get install espeak-ng`
#[derive(Debug, Clone)]
pub struct Espeak {
    voice: String,
    program: PathBuf,
}

impl Espeak {
    pub fn new(voice: impl Into<String>) -> Self {
        Self { voice: voice.into(), program: PathBuf::from("espeak-ng") }
    }

    /// Use a specific espeak-ng executable instead of the one on `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// American or British English.
    pub fn for_accent(british: bool) -> Self {
        Self::new(if british { "en-gb" } else { "en-us" })
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }
}

impl Fallback for Espeak {
    fn phonemize(&self, text: &str) -> TtsResult<String> {
        // Text goes through stdin so input like "-5 degrees" is never parsed as a flag
        let mut child = Command::new(&self.program)
            .args(["--ipa", "-q", "-v", &self.voice, "--stdin"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                TtsError::Phonemize(format!(
                    "Failed to run espeak-ng. Is it installed? Error: {}. Install with: brew install espeak-ng (macOS) or apt-get install espeak-ng (Linux)",
                    e
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).map_err(|e| TtsError::Phonemize(format!("Failed to send text to espeak-ng: {}", e)))?;
        }

        let output = child.wait_with_output().map_err(|e| TtsError::Phonemize(format!("espeak-ng did not finish: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TtsError::Phonemize(format!("espeak-ng failed: {}", stderr.trim())));
        }

        let phonemes = normalize_output(&String::from_utf8_lossy(&output.stdout));
        debug!("espeak-ng ({}): \"{}\" -> \"{}\"", self.voice, text, phonemes);
        Ok(phonemes)
    }

    fn name(&self) -> &'static str {
        "EspeakNG"
    }
}

/// Collapse espeak's line-per-clause output into one space-separated string.
fn normalize_output(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output(" həlˈoʊ\n wˈɜːld \n"), "həlˈoʊ wˈɜːld");
        assert_eq!(normalize_output("\n"), "");
    }

    #[test]
    fn test_accent_voice() {
        assert_eq!(Espeak::for_accent(true).voice(), "en-gb");
        assert_eq!(Espeak::for_accent(false).voice(), "en-us");
    }

    /// Writes a stand-in espeak-ng that fails if the text shows up in argv and echoes stdin otherwise.
    #[cfg(unix)]
    fn echo_espeak(dir: &std::path::Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("espeak-ng");
        std::fs::write(
            &path,
            "#!/bin/sh\nfor arg in \"$@\"; do\n  case \"$arg\" in *degrees*) echo \"text passed as argument\" >&2; exit 2;; esac\ndone\ncat\n",
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_leading_dash_text_is_not_a_flag() {
        let dir = tempfile::tempdir().unwrap();
        let espeak = Espeak::new("en-us").with_program(echo_espeak(dir.path()));

        assert_eq!(espeak.phonemize("-5 degrees outside").unwrap(), "-5 degrees outside");
        assert_eq!(espeak.phonemize("--help degrees").unwrap(), "--help degrees");
    }

    #[test]
    fn test_missing_program_is_phonemize_error() {
        let espeak = Espeak::new("en-us").with_program("/nonexistent/espeak-ng");
        let err = espeak.phonemize("hello").unwrap_err();
        assert!(matches!(err, TtsError::Phonemize(_)));
    }
}
