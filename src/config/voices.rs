//! Voice table for Kokoro v1.0.
//!
//! Voice names encode language and gender in their prefix (`af_` = American female,
//! `bm_` = British male, ...). A voice's speaker index inside the voice data file is its
//! position in [`VOICE_NAMES`].

/// Kokoro v1.0 voices in speaker-index order.
const VOICE_NAMES: [&str; 53] = [
    "af_alloy", "af_aoede", "af_bella", "af_heart", "af_jessica", "af_kore", "af_nicole", "af_nova", "af_river", "af_sarah", "af_sky",
    "am_adam", "am_echo", "am_eric", "am_fenrir", "am_liam", "am_michael", "am_onyx", "am_puck", "am_santa",
    "bf_alice", "bf_emma", "bf_isabella", "bf_lily", "bm_daniel", "bm_fable", "bm_george", "bm_lewis",
    "ef_dora", "em_alex",
    "ff_siwis",
    "hf_alpha", "hf_beta", "hm_omega", "hm_psi",
    "if_sara", "im_nicola",
    "jf_alpha", "jf_gongitsune", "jf_nezumi", "jf_tebukuro", "jm_kumo",
    "pf_dora", "pm_alex", "pm_santa",
    "zf_xiaobei", "zf_xiaoni", "zf_xiaoxiao", "zf_xiaoyi", "zm_yunjian", "zm_yunxi", "zm_yunxia", "zm_yunyang",
];

/// Voice language, keyed by the first letter of the voice name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    AmericanEnglish,
    BritishEnglish,
    Spanish,
    French,
    Hindi,
    Italian,
    Japanese,
    PortugueseBr,
    Mandarin,
}

impl Language {
    pub const ALL: [Language; 9] = [
        Language::AmericanEnglish,
        Language::BritishEnglish,
        Language::Spanish,
        Language::French,
        Language::Hindi,
        Language::Italian,
        Language::Japanese,
        Language::PortugueseBr,
        Language::Mandarin,
    ];

    fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'a' => Some(Language::AmericanEnglish),
            'b' => Some(Language::BritishEnglish),
            'e' => Some(Language::Spanish),
            'f' => Some(Language::French),
            'h' => Some(Language::Hindi),
            'i' => Some(Language::Italian),
            'j' => Some(Language::Japanese),
            'p' => Some(Language::PortugueseBr),
            'z' => Some(Language::Mandarin),
            _ => None,
        }
    }

    /// espeak-ng voice (also the engine-side language tag).
    pub fn espeak_code(self) -> &'static str {
        match self {
            Language::AmericanEnglish => "en-us",
            Language::BritishEnglish => "en-gb",
            Language::Spanish => "es",
            Language::French => "fr-fr",
            Language::Hindi => "hi",
            Language::Italian => "it",
            Language::Japanese => "ja",
            Language::PortugueseBr => "pt-br",
            Language::Mandarin => "cmn",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Language::AmericanEnglish => "American English",
            Language::BritishEnglish => "British English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::Hindi => "Hindi",
            Language::Italian => "Italian",
            Language::Japanese => "Japanese",
            Language::PortugueseBr => "Portuguese BR",
            Language::Mandarin => "Mandarin Chinese",
        }
    }
}

/// A Kokoro voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    pub name: &'static str,
    pub speaker_id: i32,    // Index inside the voice data file
    pub language: Language, // From the name prefix
}

impl Voice {
    pub fn espeak_code(&self) -> &'static str {
        self.language.espeak_code()
    }

    pub fn is_female(&self) -> bool {
        self.name.as_bytes().get(1) == Some(&b'f')
    }
}

fn voice_at(speaker_id: usize) -> Option<Voice> {
    let name = *VOICE_NAMES.get(speaker_id)?;
    let language = Language::from_prefix(name.chars().next()?)?;
    Some(Voice { name, speaker_id: speaker_id as i32, language })
}

/// Look up a voice by name.
pub fn get_voice(name: &str) -> Option<Voice> {
    VOICE_NAMES.binary_search(&name).ok().and_then(voice_at)
}

/// All voices in speaker-index order.
pub fn all_voices() -> impl Iterator<Item = Voice> {
    (0..VOICE_NAMES.len()).filter_map(voice_at)
}

/// Print all voices grouped by language.
pub fn print_voices() {
    println!("═══════════════════════════════════════════════════════════════════");
    println!("  Kokoro v1.0 - {} voices across {} languages", VOICE_NAMES.len(), Language::ALL.len());
    println!("═══════════════════════════════════════════════════════════════════");

    for language in Language::ALL {
        let voices: Vec<Voice> = all_voices().filter(|v| v.language == language).collect();

        println!("\n── {} ({} voices, --lang {}) ──", language.display_name(), voices.len(), language.espeak_code());
        println!("{:<15} {:<4} GENDER", "VOICE", "ID");
        println!("{}", "─".repeat(50));

        for voice in voices {
            println!("{:<15} {:<4} {}", voice.name, voice.speaker_id, if voice.is_female() { "female" } else { "male" });
        }
    }

    println!("\n{}\n", "─".repeat(70));
    println!("Default: af_heart (ID 3) - American English");
    println!();
    println!("Usage:");
    println!("  ./kokoro-speak \"Hello world\" --voice af_heart");
    println!("  ./kokoro-speak \"Good morning\" --voice bf_emma --british");
    println!("  ./kokoro-speak \"Hola\" --voice ef_dora --phonemize engine --lang es");
}

/// Print detailed information about a specific voice.
pub fn print_voice_info(name: &str) -> anyhow::Result<()> {
    let voice = get_voice(name).ok_or_else(|| anyhow::anyhow!("Voice '{}' not found. Run with --list-voices to see available voices", name))?;

    println!();
    println!("Voice: {}", voice.name);
    println!("{}", "─".repeat(40));
    println!("Speaker ID:    {}", voice.speaker_id);
    println!("Language:      {}", voice.language.display_name());
    println!("Gender:        {}", if voice.is_female() { "female" } else { "male" });
    println!("espeak code:   {}", voice.espeak_code());
    println!();
    println!("Usage:");
    println!("  ./kokoro-speak \"Hello\" --voice {} --phonemize engine --lang {}", voice.name, voice.espeak_code());
    println!();

    Ok(())
}
