use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

pub mod bleu;
pub mod lcs;
pub mod ngram;
pub mod rouge;
pub mod tokenizer;

use bleu::{bleu_tokens, DEFAULT_MAX_N};
use rouge::rouge_l_tokens;
use tokenizer::{TokenSequence, Tokenizer, TokenizerKind};

const DEFAULT_DECIMALS: u32 = 4;
const MAX_SUPPORTED_N: usize = 8;
const MAX_SUPPORTED_DECIMALS: u32 = 10;

/// Similarity scores for one candidate against its reference set, each within `0.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBundle {
    pub bleu: f64,
    pub rouge_l_f: f64,
    pub rouge_l_p: f64,
    pub rouge_l_r: f64,
}

impl ScoreBundle {
    /// Bundle with every field rounded to `decimals` places.
    pub fn rounded(self, decimals: u32) -> Self {
        Self {
            bleu: round_to(self.bleu, decimals),
            rouge_l_f: round_to(self.rouge_l_f, decimals),
            rouge_l_p: round_to(self.rouge_l_p, decimals),
            rouge_l_r: round_to(self.rouge_l_r, decimals),
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Round to `decimals` places. Exact halves go to the even neighbour, so `1/32` becomes
/// `0.0312` at four places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round_ties_even() / scale
}

/// Tunables for the scoring engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Highest n-gram order used by BLEU.
    pub max_n: usize,
    /// Tokenization strategy applied to candidate and references alike.
    pub tokenizer: TokenizerKind,
    /// Decimal places kept in reported scores.
    pub decimals: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_n: DEFAULT_MAX_N,
            tokenizer: TokenizerKind::default(),
            decimals: DEFAULT_DECIMALS,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        if self.max_n == 0 || self.max_n > MAX_SUPPORTED_N {
            return Err(ScoringConfigError::InvalidMaxN { max_n: self.max_n });
        }
        if self.decimals > MAX_SUPPORTED_DECIMALS {
            return Err(ScoringConfigError::InvalidDecimals {
                decimals: self.decimals,
            });
        }
        Ok(())
    }
}

/// Errors emitted while validating a scoring configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringConfigError {
    #[error("max_n must be within 1..=8 (got {max_n})")]
    InvalidMaxN { max_n: usize },
    #[error("decimals must be at most 10 (got {decimals})")]
    InvalidDecimals { decimals: u32 },
}

/// Scores candidate texts against reference texts. Stateless apart from its configuration,
/// so one instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: ScoringConfig,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScoringConfig) -> Result<Self, ScoringConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    fn tokenizer(&self) -> &'static dyn Tokenizer {
        self.config.tokenizer.tokenizer()
    }

    /// Score `candidate` against `references`. Empty candidates or reference sets yield the
    /// all-zero bundle; this never fails.
    #[instrument(
        name = "evaluate_policy",
        skip_all,
        fields(candidate_len = candidate.len(), references = references.len())
    )]
    pub fn evaluate<S: AsRef<str>>(&self, candidate: &str, references: &[S]) -> ScoreBundle {
        if references.is_empty() {
            return ScoreBundle::default();
        }

        let tokenizer = self.tokenizer();
        let candidate_tokens = tokenizer.tokenize(candidate);
        let reference_tokens: Vec<TokenSequence> = references
            .iter()
            .map(|reference| tokenizer.tokenize(reference.as_ref()))
            .collect();

        let bleu = bleu_tokens(&candidate_tokens, &reference_tokens, self.config.max_n);
        let rouge = rouge_l_tokens(&candidate_tokens, &reference_tokens);
        let bundle = ScoreBundle {
            bleu,
            rouge_l_f: rouge.f_score,
            rouge_l_p: rouge.precision,
            rouge_l_r: rouge.recall,
        }
        .rounded(self.config.decimals);
        debug!(
            candidate_tokens = candidate_tokens.len(),
            bleu = bundle.bleu,
            rouge_l_f = bundle.rouge_l_f,
            "scored candidate"
        );
        bundle
    }
}

/// Score with the default configuration (4-gram BLEU, word tokenizer, 4 decimals).
pub fn evaluate<S: AsRef<str>>(candidate: &str, references: &[S]) -> ScoreBundle {
    Evaluator::new().evaluate(candidate, references)
}
