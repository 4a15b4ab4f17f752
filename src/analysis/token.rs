//! Token model and the morphological tokenizer contract.
//!
//! Tokens are produced wholesale per analysis pass by an injected
//! [`Tokenizer`] implementation and owned by the document until the next
//! pass overwrites them. The feature record mirrors the nine-field IPAdic
//! layout: main category, three subcategories, inflection type, conjugation
//! form, base form, reading, pronunciation.

use std::fmt;

use crate::document::utf16_len;
use crate::encoding;

/// Modifier bit flags attached to each token.
///
/// The bit order matches the modifier legend advertised at session start.
pub mod modifiers {
    /// Token surface contains hiragana or katakana.
    pub const KANA: u32 = 1 << 0;
    /// Token surface contains CJK ideographs.
    pub const KANJI: u32 = 1 << 1;
    /// Token surface contains ASCII digits.
    pub const NUMERIC: u32 = 1 << 2;
    /// Proper noun (品詞細分類1 = 固有名詞).
    pub const PROPER: u32 = 1 << 3;
    /// Independent verb (動詞 + 自立).
    pub const INDEPENDENT_VERB: u32 = 1 << 4;
}

/// Structured part-of-speech feature record for one token.
///
/// Subcategory fields keep the dictionary's literal value (including `*`);
/// base form, reading and pronunciation are empty when the dictionary
/// reports `*`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PosFeature {
    pub main: String,
    pub sub1: String,
    pub sub2: String,
    pub sub3: String,
    pub inflection: String,
    pub conjugation: String,
    pub base_form: String,
    pub reading: String,
    pub pronunciation: String,
}

impl PosFeature {
    /// Parse a comma-separated feature string in the given system charset.
    pub fn parse(feature: &str, system_charset: &str) -> Self {
        let feature = encoding::system_to_utf8(feature, system_charset);
        let mut fields = feature.split(',');
        let mut next = || fields.next().unwrap_or("").to_string();
        let star_is_empty = |s: String| if s == "*" { String::new() } else { s };

        Self {
            main: next(),
            sub1: next(),
            sub2: next(),
            sub3: next(),
            inflection: next(),
            conjugation: next(),
            base_form: star_is_empty(next()),
            reading: star_is_empty(next()),
            pronunciation: star_is_empty(next()),
        }
    }

    pub fn is_particle(&self) -> bool {
        self.main == "助詞"
    }

    pub fn is_verb(&self) -> bool {
        self.main == "動詞"
    }

    pub fn is_noun(&self) -> bool {
        self.main == "名詞"
    }

    pub fn is_conjunction(&self) -> bool {
        self.main == "接続詞"
    }

    /// Grouping key for particle streak rules: main category plus the first
    /// subcategory ("助詞,格助詞", "助詞,接続助詞", ...).
    pub fn particle_key(&self) -> (&str, &str) {
        (&self.main, &self.sub1)
    }

    /// The adversative conjunctive particle が ("but").
    pub fn is_adversative_ga(&self) -> bool {
        self.main == "助詞" && self.sub1 == "接続助詞" && self.base_form == "が"
    }
}

impl fmt::Display for PosFeature {
    /// Render the record back into the nine-field dictionary form, with `*`
    /// standing in for empty lexical fields. Used for hover output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let star = |s: &str| if s.is_empty() { "*" } else { s }.to_string();
        write!(
            f,
            "{},{},{},{},{},{},{},{},{}",
            star(&self.main),
            star(&self.sub1),
            star(&self.sub2),
            star(&self.sub3),
            star(&self.inflection),
            star(&self.conjugation),
            star(&self.base_form),
            star(&self.reading),
            star(&self.pronunciation),
        )
    }
}

/// Coarse display category used by the semantic-token legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCategory {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Particle,
    Aux,
    Conjunction,
    Symbol,
    Interjection,
    Prefix,
    Suffix,
    Unknown,
}

impl DisplayCategory {
    /// Map a feature record's main category to its display category.
    pub fn from_feature(feature: &PosFeature) -> Self {
        match feature.main.as_str() {
            "名詞" => Self::Noun,
            "動詞" => Self::Verb,
            "形容詞" => Self::Adjective,
            "副詞" => Self::Adverb,
            "助詞" => Self::Particle,
            "助動詞" => Self::Aux,
            "接続詞" => Self::Conjunction,
            "記号" => Self::Symbol,
            "感動詞" => Self::Interjection,
            "接頭詞" => Self::Prefix,
            main if main.starts_with("接尾") => Self::Suffix,
            _ => Self::Unknown,
        }
    }

    /// Legend name for this category.
    pub fn name(self) -> &'static str {
        match self {
            Self::Noun => "noun",
            Self::Verb => "verb",
            Self::Adjective => "adjective",
            Self::Adverb => "adverb",
            Self::Particle => "particle",
            Self::Aux => "aux",
            Self::Conjunction => "conjunction",
            Self::Symbol => "symbol",
            Self::Interjection => "interj",
            Self::Prefix => "prefix",
            Self::Suffix => "suffix",
            Self::Unknown => "unknown",
        }
    }
}

/// One morphological token, positioned in UTF-16 columns on a single line.
#[derive(Debug, Clone)]
pub struct Token {
    pub line: u32,
    pub start_char: u32,
    pub end_char: u32,
    pub surface: String,
    pub feature: PosFeature,
    pub category: DisplayCategory,
    pub modifiers: u32,
}

impl Token {
    /// Build a token from a surface form and raw dictionary feature string.
    ///
    /// Derives the end column from the surface's UTF-16 length and fills in
    /// the display category and modifier bitmask.
    pub fn from_feature_str(
        line: u32,
        start_char: u32,
        surface: &str,
        feature: &str,
        system_charset: &str,
    ) -> Self {
        let feature = PosFeature::parse(feature, system_charset);
        let category = DisplayCategory::from_feature(&feature);
        let modifiers = compute_modifiers(surface, &feature);
        Self {
            line,
            start_char,
            end_char: start_char + utf16_len(surface),
            surface: surface.to_string(),
            feature,
            category,
            modifiers,
        }
    }
}

/// Compute the modifier bitmask for a token surface and feature record.
pub fn compute_modifiers(surface: &str, feature: &PosFeature) -> u32 {
    let mut mods = 0;

    for c in surface.chars() {
        match c {
            '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' => mods |= modifiers::KANA,
            '\u{4E00}'..='\u{9FFF}' => mods |= modifiers::KANJI,
            '0'..='9' => mods |= modifiers::NUMERIC,
            _ => {}
        }
    }

    if feature.sub1 == "固有名詞" {
        mods |= modifiers::PROPER;
    }
    if feature.main == "動詞" && feature.sub1 == "自立" {
        mods |= modifiers::INDEPENDENT_VERB;
    }

    mods
}

/// Dependency chunk reported by the external dependency parser.
#[derive(Debug, Clone)]
pub struct DependencyChunk {
    pub chunk_id: i32,
    pub head_id: i32,
    pub score: f64,
    pub text: String,
}

/// Contract for the external morphological analysis backend.
///
/// Implementations own the native analyzer handles; the pipeline only ever
/// sees this interface so it can run against a test double. An unavailable
/// backend degrades to empty results rather than failing a request.
pub trait Tokenizer: Send + Sync {
    /// Tokenize analyzable text into positioned tokens.
    fn tokenize(&self, text: &str) -> Vec<Token>;

    /// Run dependency parsing over analyzable text.
    fn parse_dependencies(&self, _text: &str) -> Vec<DependencyChunk> {
        Vec::new()
    }
}

/// Tokenizer stand-in used when no morphological backend is wired in.
#[derive(Debug, Default)]
pub struct NullTokenizer;

impl Tokenizer for NullTokenizer {
    fn tokenize(&self, _text: &str) -> Vec<Token> {
        Vec::new()
    }
}
