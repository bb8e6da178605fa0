use serde::{Deserialize, Serialize};

use super::lcs::lcs_length;
use super::tokenizer::tokenize;

/// ROUGE-L precision, recall and F-measure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RougeL {
    pub f_score: f64,
    pub precision: f64,
    pub recall: f64,
}

impl RougeL {
    fn from_lcs(lcs: usize, candidate_len: usize, reference_len: usize) -> Self {
        let precision = lcs as f64 / candidate_len as f64;
        let recall = if reference_len > 0 {
            lcs as f64 / reference_len as f64
        } else {
            0.0
        };
        let f_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            f_score,
            precision,
            recall,
        }
    }

    /// `(f_score, precision, recall)`.
    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.f_score, self.precision, self.recall)
    }
}

/// ROUGE-L over pre-tokenized sequences.
///
/// Uses the reference with the longest LCS; on ties the first such reference wins, and its
/// length is the recall denominator.
pub fn rouge_l_tokens(candidate: &[String], references: &[Vec<String>]) -> RougeL {
    if candidate.is_empty() || references.is_empty() {
        return RougeL::default();
    }

    let mut best_lcs = 0;
    let mut best_reference_len = 0;
    for reference in references {
        let lcs = lcs_length(candidate, reference.as_slice());
        if lcs > best_lcs {
            best_lcs = lcs;
            best_reference_len = reference.len();
        }
    }

    if best_lcs == 0 {
        return RougeL::default();
    }
    RougeL::from_lcs(best_lcs, candidate.len(), best_reference_len)
}

/// Raw (unrounded) ROUGE-L of `candidate` against `references` using the word tokenizer.
pub fn rouge_l<S: AsRef<str>>(candidate: &str, references: &[S]) -> RougeL {
    if candidate.is_empty() || references.is_empty() {
        return RougeL::default();
    }
    let candidate_tokens = tokenize(candidate);
    let reference_tokens: Vec<Vec<String>> =
        references.iter().map(|r| tokenize(r.as_ref())).collect();
    rouge_l_tokens(&candidate_tokens, &reference_tokens)
}
