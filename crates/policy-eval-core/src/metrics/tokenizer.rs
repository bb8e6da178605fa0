use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Ordered word tokens for one text.
pub type TokenSequence = Vec<String>;

static WORD_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word regex is valid"));

/// Splits text into normalized word tokens.
pub trait Tokenizer: Send + Sync {
    /// Tokenize `text`. Must be pure: identical input yields an identical sequence.
    fn tokenize(&self, text: &str) -> TokenSequence;
}

/// Lower-cases, then keeps maximal runs of word characters (Unicode letters, digits, `_`).
#[derive(Debug, Default, Clone, Copy)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> TokenSequence {
        let lowered = text.to_lowercase();
        WORD_RUN
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// Lower-cases, then splits on UAX #29 word boundaries.
///
/// Ideographic scripts without inter-word spacing come out as one token per character
/// instead of a single run covering the whole sentence.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeWordTokenizer;

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> TokenSequence {
        text.to_lowercase()
            .unicode_words()
            .map(str::to_string)
            .collect()
    }
}

/// Selectable tokenization strategy, as used in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    #[default]
    Word,
    Unicode,
}

impl TokenizerKind {
    pub fn tokenizer(self) -> &'static dyn Tokenizer {
        match self {
            Self::Word => &WordTokenizer,
            Self::Unicode => &UnicodeWordTokenizer,
        }
    }
}

impl std::str::FromStr for TokenizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" => Ok(Self::Word),
            "unicode" => Ok(Self::Unicode),
            other => Err(format!(
                "unknown tokenizer `{other}` (expected `word` or `unicode`)"
            )),
        }
    }
}

/// Tokenize with the default [`WordTokenizer`].
pub fn tokenize(text: &str) -> TokenSequence {
    WordTokenizer.tokenize(text)
}
