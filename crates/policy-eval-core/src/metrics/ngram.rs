use std::collections::HashMap;

/// Occurrence counts of every n-gram of one order within a token sequence.
///
/// Keys borrow slices of the source tokens, so building a map never copies token text.
pub type NgramCounts<'a> = HashMap<&'a [String], usize>;

/// Count every contiguous window of `n` tokens. Empty when `n == 0` or `tokens.len() < n`.
pub fn ngram_counts(tokens: &[String], n: usize) -> NgramCounts<'_> {
    let mut counts = HashMap::new();
    if n == 0 || tokens.len() < n {
        return counts;
    }
    for window in tokens.windows(n) {
        *counts.entry(window).or_insert(0) += 1;
    }
    counts
}

/// Clipped n-gram precision of `candidate` against `references` for orders `1..=max_n`.
///
/// Each candidate n-gram count is capped at its highest count in any single reference.
/// An order for which the candidate has no n-grams yields `0.0`.
pub fn ngram_precisions(candidate: &[String], references: &[Vec<String>], max_n: usize) -> Vec<f64> {
    (1..=max_n)
        .map(|n| order_precision(candidate, references, n))
        .collect()
}

fn order_precision(candidate: &[String], references: &[Vec<String>], n: usize) -> f64 {
    let candidate_counts = ngram_counts(candidate, n);
    let total: usize = candidate_counts.values().sum();
    if total == 0 {
        return 0.0;
    }

    let reference_counts: Vec<NgramCounts<'_>> = references
        .iter()
        .map(|reference| ngram_counts(reference, n))
        .collect();

    let clipped: usize = candidate_counts
        .iter()
        .map(|(ngram, &count)| {
            let max_reference = reference_counts
                .iter()
                .map(|counts| counts.get(ngram).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);
            count.min(max_reference)
        })
        .sum();

    clipped as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::tokenizer::tokenize;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn counts_overlapping_windows() {
        let tokens = tokenize("a b a b");
        let bigrams = ngram_counts(&tokens, 2);
        assert_eq!(bigrams.len(), 2);
        let ab = [String::from("a"), String::from("b")];
        assert_eq!(bigrams.get(&ab[..]), Some(&2));
    }

    #[test]
    fn short_sequence_has_no_ngrams() {
        let tokens = tokenize("one two");
        assert!(ngram_counts(&tokens, 3).is_empty());
        assert!(ngram_counts(&tokens, 0).is_empty());
    }

    #[test]
    fn clips_repeated_candidate_tokens() {
        let candidate = tokenize("a a a");
        let references = vec![tokenize("a a")];
        let precisions = ngram_precisions(&candidate, &references, 1);
        assert!(approx(precisions[0], 2.0 / 3.0));
    }

    #[test]
    fn clipping_uses_single_best_reference_not_sum() {
        let candidate = tokenize("a a a");
        let references = vec![tokenize("a b"), tokenize("a c")];
        let precisions = ngram_precisions(&candidate, &references, 1);
        assert!(approx(precisions[0], 1.0 / 3.0));
    }

    #[test]
    fn orders_beyond_candidate_length_are_zero() {
        let candidate = tokenize("policy review");
        let references = vec![tokenize("policy review cadence")];
        let precisions = ngram_precisions(&candidate, &references, 4);
        assert_eq!(precisions.len(), 4);
        assert!(approx(precisions[0], 1.0));
        assert!(approx(precisions[1], 1.0));
        assert_eq!(precisions[2], 0.0);
        assert_eq!(precisions[3], 0.0);
    }

    #[test]
    fn no_references_means_no_matches() {
        let candidate = tokenize("anything at all");
        let precisions = ngram_precisions(&candidate, &[], 2);
        assert_eq!(precisions, vec![0.0, 0.0]);
    }
}
