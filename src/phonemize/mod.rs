//! Grapheme-to-phoneme conversion.
//!
//! Words are looked up in a pronunciation lexicon; anything the lexicon does not know
//! goes to a fallback engine (espeak-ng by default). Punctuation passes through so the
//! model still sees sentence boundaries.

mod espeak;
mod lexicon;
mod normalize;

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

pub use espeak::{Espeak, Fallback};
pub use lexicon::Lexicon;
pub use normalize::normalize_text;

use crate::error::{TtsError, TtsResult};

/// Marks the model knows and that pass through unchanged.
const PUNCTUATION: &str = r#".,!?;:…—"“”()"#;

/// Words (letters, digits, inner apostrophes and hyphens), punctuation marks, or any other symbol.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\p{L}\p{N}]+(?:['’\-][\p{L}\p{N}]+)*|[.,!?;:…—"“”()]|[^\s\p{L}\p{N}.,!?;:…—"“”()]+"#).expect("token regex is valid"));

/// Clause runs between punctuation marks. Decimal points and times ("3.5", "10:30") stay inside the run.
static CLAUSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:\d[.,:]\d|[^.,!?;:…—"“”()])+|[.,!?;:…—"“”()]"#).expect("clause regex is valid"));

/// G2P settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct G2pConfig {
    pub british: bool, // GB lexicon and en-gb fallback
    pub trf: bool,     // Transformer-based disambiguation
}

/// Where a token's phonemes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSource {
    Lexicon,
    Fallback,
    Punctuation,
}

/// Per-word G2P metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhonemeToken {
    pub text: String,
    pub phonemes: String,
    pub source: TokenSource,
}

/// Lexicon-first grapheme-to-phoneme converter with a pluggable fallback.
pub struct G2p {
    lexicon: Lexicon,
    fallback: Option<Box<dyn Fallback>>,
    british: bool,
}

impl G2p {
    /// Create a converter from a lexicon file with the espeak-ng fallback.
    ///
    /// # Errors
    /// Returns an error if transformer mode is requested or the lexicon cannot be loaded.
    pub fn new(config: G2pConfig, lexicon_path: &Path) -> TtsResult<Self> {
        Self::check_config(&config)?;
        let lexicon = Lexicon::load(lexicon_path)?;
        Ok(Self::with_lexicon(config, lexicon, Some(Box::new(Espeak::for_accent(config.british)))))
    }

    /// Create a converter from an already-loaded lexicon and an optional fallback.
    pub fn with_lexicon(config: G2pConfig, lexicon: Lexicon, fallback: Option<Box<dyn Fallback>>) -> Self {
        Self { lexicon, fallback, british: config.british }
    }

    fn check_config(config: &G2pConfig) -> TtsResult<()> {
        if config.trf {
            return Err(TtsError::Phonemize("transformer mode (trf) is not available; use trf=false".to_string()));
        }
        Ok(())
    }

    /// Whether this converter uses British pronunciation.
    pub fn is_british(&self) -> bool {
        self.british
    }

    /// Convert text to a phoneme sequence plus per-token metadata.
    ///
    /// # Errors
    /// Returns `Phonemize` if a word is unknown and there is no fallback, or the fallback fails.
    pub fn phonemize(&self, text: &str) -> TtsResult<(String, Vec<PhonemeToken>)> {
        let text = normalize_text(text);
        let mut tokens = Vec::new();

        for m in TOKEN_RE.find_iter(&text) {
            let word = m.as_str();

            if is_punctuation(word) {
                tokens.push(PhonemeToken { text: word.to_string(), phonemes: word.to_string(), source: TokenSource::Punctuation });
                continue;
            }

            let token = match self.lexicon.get(word) {
                Some(phonemes) => PhonemeToken { text: word.to_string(), phonemes: phonemes.to_string(), source: TokenSource::Lexicon },
                None => {
                    let fallback = self.fallback.as_ref().ok_or_else(|| TtsError::Phonemize(format!("'{}' is not in the lexicon and no fallback is configured", word)))?;
                    debug!("'{}' not in lexicon, using {}", word, fallback.name());
                    PhonemeToken { text: word.to_string(), phonemes: fallback.phonemize(word)?, source: TokenSource::Fallback }
                }
            };
            tokens.push(token);
        }

        Ok((join_tokens(&tokens), tokens))
    }
}

fn is_punctuation(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if PUNCTUATION.contains(c))
}

/// Phonemize text clause by clause with `fallback`, keeping the punctuation between clauses.
///
/// Phonemizers such as espeak-ng drop punctuation from their output, which would cost the
/// model its pauses and intonation.
pub fn phonemize_clauses(fallback: &dyn Fallback, text: &str) -> TtsResult<String> {
    let mut tokens = Vec::new();

    for m in CLAUSE_RE.find_iter(text) {
        let clause = m.as_str();
        if is_punctuation(clause) {
            tokens.push(PhonemeToken { text: clause.to_string(), phonemes: clause.to_string(), source: TokenSource::Punctuation });
            continue;
        }

        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }
        tokens.push(PhonemeToken { text: clause.to_string(), phonemes: fallback.phonemize(clause)?, source: TokenSource::Fallback });
    }

    Ok(join_tokens(&tokens))
}

/// Join token phonemes with spaces between words; punctuation attaches to its neighbour.
fn join_tokens(tokens: &[PhonemeToken]) -> String {
    let mut out = String::new();
    let mut glue_next = false;

    for token in tokens.iter().filter(|t| !t.phonemes.is_empty()) {
        let opening = matches!(token.phonemes.as_str(), "(" | "“");
        let attach = token.source == TokenSource::Punctuation && !opening;

        if !out.is_empty() && !attach && !glue_next {
            out.push(' ');
        }
        out.push_str(&token.phonemes);
        glue_next = opening;
    }

    out
}
