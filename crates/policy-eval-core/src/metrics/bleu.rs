use tracing::trace;

use super::ngram::ngram_precisions;
use super::tokenizer::tokenize;

/// Default maximum n-gram order.
pub const DEFAULT_MAX_N: usize = 4;

/// Length of the reference closest to `candidate_len`; distance ties resolve to the shorter one.
///
/// Returns `None` when `reference_lengths` is empty.
pub fn closest_reference_length(candidate_len: usize, reference_lengths: &[usize]) -> Option<usize> {
    reference_lengths
        .iter()
        .copied()
        .min_by_key(|&len| (len.abs_diff(candidate_len), len))
}

/// Brevity penalty: `1.0` for candidates longer than the closest reference, otherwise the
/// ratio `candidate_len / closest_len` (`0.0` when the closest reference is empty).
pub fn brevity_penalty(candidate_len: usize, reference_lengths: &[usize]) -> f64 {
    let closest = closest_reference_length(candidate_len, reference_lengths).unwrap_or(0);
    if candidate_len > closest {
        1.0
    } else if closest == 0 {
        0.0
    } else {
        candidate_len as f64 / closest as f64
    }
}

/// BLEU over pre-tokenized sequences. Unsmoothed: any zero precision collapses the score to `0.0`.
pub fn bleu_tokens(candidate: &[String], references: &[Vec<String>], max_n: usize) -> f64 {
    if candidate.is_empty() || references.is_empty() || max_n == 0 {
        return 0.0;
    }

    let precisions = ngram_precisions(candidate, references, max_n);
    trace!(?precisions, "n-gram precisions");
    if precisions.iter().any(|&p| p == 0.0) {
        return 0.0;
    }

    let geometric_mean = precisions.iter().product::<f64>().powf(1.0 / max_n as f64);
    let reference_lengths: Vec<usize> = references.iter().map(Vec::len).collect();
    geometric_mean * brevity_penalty(candidate.len(), &reference_lengths)
}

/// Raw (unrounded) BLEU of `candidate` against `references` using the word tokenizer.
pub fn bleu<S: AsRef<str>>(candidate: &str, references: &[S], max_n: usize) -> f64 {
    if candidate.is_empty() || references.is_empty() {
        return 0.0;
    }
    let candidate_tokens = tokenize(candidate);
    let reference_tokens: Vec<Vec<String>> =
        references.iter().map(|r| tokenize(r.as_ref())).collect();
    bleu_tokens(&candidate_tokens, &reference_tokens, max_n)
}
