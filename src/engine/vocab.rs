//! Phoneme vocabulary and batching for Kokoro models.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{TtsError, TtsResult};

/// Longest phoneme sequence the model accepts in one pass (context is 512 with padding).
pub const MAX_PHONEME_LENGTH: usize = 510;

/// Kokoro v1.0 phoneme vocabulary (the `vocab` table of the model config).
const KOKORO_V1_VOCAB: &[(char, i64)] = &[
    (';', 1), (':', 2), (',', 3), ('.', 4), ('!', 5), ('?', 6), ('—', 9), ('…', 10), ('"', 11), ('(', 12), (')', 13), ('“', 14), ('”', 15), (' ', 16),
    ('\u{0303}', 17), ('ʣ', 18), ('ʥ', 19), ('ʦ', 20), ('ʨ', 21), ('ᵝ', 22), ('\u{AB67}', 23),
    ('A', 24), ('I', 25), ('O', 31), ('Q', 33), ('S', 35), ('T', 36), ('W', 39), ('Y', 41), ('ᵊ', 42),
    ('a', 43), ('b', 44), ('c', 45), ('d', 46), ('e', 47), ('f', 48), ('h', 50), ('i', 51), ('j', 52), ('k', 53), ('l', 54), ('m', 55), ('n', 56),
    ('o', 57), ('p', 58), ('q', 59), ('r', 60), ('s', 61), ('t', 62), ('u', 63), ('v', 64), ('w', 65), ('x', 66), ('y', 67), ('z', 68),
    ('ɑ', 69), ('ɐ', 70), ('ɒ', 71), ('æ', 72), ('β', 75), ('ɔ', 76), ('ɕ', 77), ('ç', 78), ('ɖ', 80), ('ð', 81), ('ʤ', 82), ('ə', 83), ('ɚ', 85),
    ('ɛ', 86), ('ɜ', 87), ('ɟ', 90), ('ɡ', 92), ('ɥ', 99), ('ɨ', 101), ('ɪ', 102), ('ʝ', 103), ('ɯ', 110), ('ɰ', 111), ('ŋ', 112), ('ɳ', 113),
    ('ɲ', 114), ('ɴ', 115), ('ø', 116), ('ɸ', 118), ('θ', 119), ('œ', 120), ('ɹ', 123), ('ɾ', 125), ('ɻ', 126), ('ʁ', 128), ('ɽ', 129), ('ʂ', 130),
    ('ʃ', 131), ('ʈ', 132), ('ʧ', 133), ('ʊ', 135), ('ʋ', 136), ('ʌ', 138), ('ɣ', 139), ('ɤ', 140), ('χ', 142), ('ʎ', 143), ('ʒ', 147), ('ʔ', 148),
    ('ˈ', 156), ('ˌ', 157), ('ː', 158), ('ʰ', 162), ('ʲ', 164), ('↓', 169), ('→', 171), ('↗', 172), ('↘', 173), ('ᵻ', 177),
];

/// Mapping from phoneme characters to model token ids.
#[derive(Debug, Clone, Default)]
pub struct Vocab {
    map: HashMap<char, i64>,
}

impl Vocab {
    /// The vocabulary built into Kokoro v1.0 models.
    pub fn kokoro_v1() -> Self {
        Self { map: KOKORO_V1_VOCAB.iter().copied().collect() }
    }

    /// Use `tokens.txt` when it exists, otherwise the built-in Kokoro v1.0 vocabulary.
    ///
    /// # Errors
    /// Returns `Engine` if an existing file cannot be read or has no entries.
    pub fn load_or_builtin(path: &Path) -> TtsResult<Self> {
        if path.exists() {
            debug!("Using vocabulary override {}", path.display());
            Self::load(path)
        } else {
            Ok(Self::kokoro_v1())
        }
    }

    /// Load `tokens.txt` (one `<symbol> <id>` pair per line).
    pub fn load(path: &Path) -> TtsResult<Self> {
        if !path.exists() {
            return Err(TtsError::MissingArtifact { path: path.to_path_buf() });
        }
        let content = std::fs::read_to_string(path).map_err(|e| TtsError::Engine(format!("Failed to read vocabulary {}: {}", path.display(), e)))?;
        let vocab = Self::parse(&content);
        if vocab.map.is_empty() {
            return Err(TtsError::Engine(format!("Vocabulary {} has no entries", path.display())));
        }
        Ok(vocab)
    }

    /// Parse vocabulary text. The space symbol appears as a line with an empty symbol field.
    pub fn parse(content: &str) -> Self {
        let mut map = HashMap::new();

        for line in content.lines() {
            let Some((symbol, id)) = line.rsplit_once(' ') else { continue };
            let Ok(id) = id.trim().parse::<i64>() else { continue };

            let mut chars = symbol.chars();
            let c = match (chars.next(), chars.next()) {
                (None, _) => ' ',
                (Some(c), None) => c,
                // Multi-char symbols cannot be addressed per character
                _ => continue,
            };
            map.insert(c, id);
        }

        Self { map }
    }

    /// Map phonemes to token ids, dropping characters the model does not know.
    pub fn encode(&self, phonemes: &str) -> Vec<i64> {
        phonemes.chars().filter_map(|c| self.map.get(&c).copied()).collect()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Split a phoneme string into batches of at most `max_len` characters.
///
/// Breaks after sentence or clause punctuation when possible, then at a space, then hard.
/// A `max_len` of 0 is treated as 1.
pub fn split_phonemes(phonemes: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let chars: Vec<char> = phonemes.chars().collect();
    let mut batches = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let remaining = chars.len() - start;
        if remaining <= max_len {
            push_trimmed(&mut batches, &chars[start..]);
            break;
        }

        let window = &chars[start..start + max_len];
        let cut = window
            .iter()
            .rposition(|c| matches!(c, '.' | '!' | '?' | ';' | ':' | ','))
            .or_else(|| window.iter().rposition(|c| *c == ' '))
            .map(|i| i + 1)
            .unwrap_or(max_len);

        push_trimmed(&mut batches, &chars[start..start + cut]);
        start += cut;
    }

    batches
}

fn push_trimmed(batches: &mut Vec<String>, chars: &[char]) {
    let batch: String = chars.iter().collect();
    let batch = batch.trim();
    if !batch.is_empty() {
        batches.push(batch.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKENS: &str = "$ 0\n; 1\n, 3\n. 4\n 16\nh 50\nl 54\nə 83\nˈ 156\nO 31\nab 99\n";

    #[test]
    fn test_parse_includes_space() {
        let vocab = Vocab::parse(TOKENS);
        assert_eq!(vocab.encode(" "), vec![16]);
        assert_eq!(vocab.encode("həlˈO."), vec![50, 83, 54, 156, 31, 4]);
        // Multi-character symbols are skipped
        assert_eq!(vocab.len(), 10);
    }

    #[test]
    fn test_encode_drops_unknown() {
        let vocab = Vocab::parse(TOKENS);
        assert_eq!(vocab.encode("h?l"), vec![50, 54]);
    }

    #[test]
    fn test_short_input_single_batch() {
        assert_eq!(split_phonemes("həlˈO wˈɜɹld.", 510), vec!["həlˈO wˈɜɹld.".to_string()]);
        assert!(split_phonemes("   ", 510).is_empty());
    }

    #[test]
    fn test_split_prefers_punctuation() {
        let batches = split_phonemes("aaa bbb, ccc ddd", 10);
        assert_eq!(batches, vec!["aaa bbb,".to_string(), "ccc ddd".to_string()]);
    }

    #[test]
    fn test_split_falls_back_to_space_then_hard() {
        assert_eq!(split_phonemes("aaaa bbbb cccc", 10), vec!["aaaa bbbb".to_string(), "cccc".to_string()]);
        assert_eq!(split_phonemes("abcdefghij", 4), vec!["abcd".to_string(), "efgh".to_string(), "ij".to_string()]);
    }

    #[test]
    fn test_zero_limit_still_terminates() {
        assert_eq!(split_phonemes("abc", 0), vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_builtin_vocab_matches_kokoro_ids() {
        let vocab = Vocab::kokoro_v1();
        assert_eq!(vocab.encode("həlˈO wˈɜɹld."), vec![50, 83, 54, 156, 31, 16, 65, 156, 87, 123, 54, 46, 4]);
        assert_eq!(vocab.encode("ʃʧʔ"), vec![131, 133, 148]);
        assert_eq!(vocab.len(), KOKORO_V1_VOCAB.len());
    }

    #[test]
    fn test_missing_override_uses_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let vocab = Vocab::load_or_builtin(&dir.path().join("tokens.txt")).unwrap();
        assert_eq!(vocab.len(), Vocab::kokoro_v1().len());

        let path = dir.path().join("custom.txt");
        std::fs::write(&path, TOKENS).unwrap();
        assert_eq!(Vocab::load_or_builtin(&path).unwrap().len(), 10);
    }

    #[test]
    fn test_batches_respect_limit() {
        let long = "tˈɛst ".repeat(200);
        let batches = split_phonemes(&long, MAX_PHONEME_LENGTH);
        assert!(batches.len() > 1);
        assert!(batches.iter().all(|b| b.chars().count() <= MAX_PHONEME_LENGTH));
    }
}
