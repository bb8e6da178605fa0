/// Dynamic-programming table stored row-major in one contiguous allocation.
struct LcsTable {
    cells: Vec<usize>,
    width: usize,
}

impl LcsTable {
    fn new(rows: usize, width: usize) -> Self {
        Self {
            cells: vec![0; rows * width],
            width,
        }
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> usize {
        self.cells[row * self.width + col]
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, value: usize) {
        self.cells[row * self.width + col] = value;
    }
}

/// Length of the longest common subsequence of two token sequences (exact token equality).
pub fn lcs_length<T: PartialEq>(seq1: &[T], seq2: &[T]) -> usize {
    if seq1.is_empty() || seq2.is_empty() {
        return 0;
    }

    let mut table = LcsTable::new(seq1.len() + 1, seq2.len() + 1);
    for i in 1..=seq1.len() {
        for j in 1..=seq2.len() {
            let value = if seq1[i - 1] == seq2[j - 1] {
                table.at(i - 1, j - 1) + 1
            } else {
                table.at(i - 1, j).max(table.at(i, j - 1))
            };
            table.set(i, j, value);
        }
    }
    table.at(seq1.len(), seq2.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn transposed_tail_has_length_two() {
        assert_eq!(lcs_length(&["a", "b", "c"], &["a", "c", "b"]), 2);
    }

    #[test]
    fn empty_side_is_zero() {
        let empty: [&str; 0] = [];
        assert_eq!(lcs_length(&empty, &["a"]), 0);
        assert_eq!(lcs_length(&["a"], &empty), 0);
    }

    #[test]
    fn reversed_sequence_keeps_one_token() {
        assert_eq!(
            lcs_length(&["the", "quick", "brown", "fox"], &["fox", "brown", "quick", "the"]),
            1
        );
    }

    #[test]
    fn non_contiguous_subsequence_counts() {
        assert_eq!(
            lcs_length(&["a", "x", "b", "y", "c"], &["a", "b", "c"]),
            3
        );
    }

    proptest! {
        #[test]
        fn symmetric_and_bounded(
            a in proptest::collection::vec(0u8..4, 0..24),
            b in proptest::collection::vec(0u8..4, 0..24)
        ) {
            let forward = lcs_length(&a, &b);
            prop_assert_eq!(forward, lcs_length(&b, &a));
            prop_assert!(forward <= a.len().min(b.len()));
            prop_assert_eq!(lcs_length(&a, &a), a.len());
        }
    }
}
