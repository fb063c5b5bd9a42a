//! English text normalization ahead of G2P.
//!
//! Symbols that carry meaning (`$`, `%`, `&`, ...) are spelled out so they survive
//! tokenization. Digits are left alone; the fallback reads them.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static THOUSANDS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d),(\d{3})").expect("thousands regex is valid"));

static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([$£€])(\d+)(?:\.(\d{1,2}))?").expect("currency regex is valid"));

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s?%").expect("percent regex is valid"));

static HASH_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\d)").expect("hash regex is valid"));

/// Symbols spoken as words once currency and percentages are handled.
const SYMBOL_WORDS: &[(char, &str)] = &[('&', "and"), ('@', "at"), ('+', "plus"), ('=', "equals"), ('/', "slash"), ('#', "hash"), ('%', "percent"), ('$', "dollar")];

/// Normalize English text for lexicon lookup.
pub fn normalize_text(text: &str) -> String {
    let mut text = text.replace(['‘', '’'], "'").replace("...", "…");

    // "1,000,000" needs two passes since matches cannot overlap
    while THOUSANDS_RE.is_match(&text) {
        text = THOUSANDS_RE.replace_all(&text, "$1$2").into_owned();
    }

    let text = CURRENCY_RE.replace_all(&text, |caps: &Captures| spell_currency(&caps[1], &caps[2], caps.get(3).map(|m| m.as_str())));
    let text = PERCENT_RE.replace_all(&text, "$1 percent");
    let text = HASH_NUMBER_RE.replace_all(&text, "number $1");

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match SYMBOL_WORDS.iter().find(|(symbol, _)| *symbol == c) {
            Some((_, word)) => {
                out.push(' ');
                out.push_str(word);
                out.push(' ');
            }
            None => out.push(c),
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn spell_currency(symbol: &str, units: &str, cents: Option<&str>) -> String {
    let (one, many) = match symbol {
        "£" => ("pound", "pounds"),
        "€" => ("euro", "euros"),
        _ => ("dollar", "dollars"),
    };
    let mut spoken = format!("{} {}", units, if units == "1" { one } else { many });

    if let Some(cents) = cents {
        let cents = if cents.len() == 1 { format!("{}0", cents) } else { cents.to_string() };
        let value = cents.trim_start_matches('0');
        if !value.is_empty() {
            spoken.push_str(&format!(" and {} {}", value, if value == "1" { "cent" } else { "cents" }));
        }
    }
    spoken
}
