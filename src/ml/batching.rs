// ============================================================
// Layer 5 — Variable-Length Batch Reordering
// ============================================================
// The GRU processes a batch of variable-length sequences without
// wasting work on padding. That requires three pieces:
//
//   1. `sort`   — a permutation ordering the batch by descending
//                 length (stable for ties)
//   2. `unsort` — its exact inverse, to restore original batch
//                 order afterwards: unsort[sort[i]] == i
//   3. per-timestep active counts — with the batch sorted
//                 descending, the sequences still alive at time t
//                 form a prefix, so one count per timestep fully
//                 describes the packed layout
//
// Both permutations are recomputed fresh for every batch and
// discarded after the unsort step.

/// Sort/unsort permutation pair for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortPermutation {
    /// Maps sorted position → original batch position.
    /// Indexing a tensor's batch dimension with this reorders it
    /// into descending-length order.
    pub sort: Vec<usize>,

    /// Inverse of `sort`: indexing the sorted tensor with this
    /// restores the original batch order.
    pub unsort: Vec<usize>,
}

impl SortPermutation {
    /// Compute the permutation pair for a length vector.
    ///
    /// The sort is stable: among equal lengths, original relative
    /// order is preserved. Lengths must be non-empty and positive.
    pub fn from_lengths(lengths: &[usize]) -> Self {
        assert!(!lengths.is_empty(), "batch must contain at least one sequence");
        assert!(
            lengths.iter().all(|&l| l > 0),
            "zero-length sequence in batch"
        );

        let mut sort: Vec<usize> = (0..lengths.len()).collect();
        // sort_by_key is stable, so ties keep their original order
        sort.sort_by_key(|&i| std::cmp::Reverse(lengths[i]));

        let mut unsort = vec![0usize; lengths.len()];
        for (sorted_pos, &orig_pos) in sort.iter().enumerate() {
            unsort[orig_pos] = sorted_pos;
        }

        Self { sort, unsort }
    }

    /// Apply `sort` to a length vector, yielding descending lengths.
    pub fn sorted_lengths(&self, lengths: &[usize]) -> Vec<usize> {
        self.sort.iter().map(|&i| lengths[i]).collect()
    }
}

/// Number of sequences still active at each timestep, given lengths
/// already sorted in descending order. `active[t]` sequences occupy
/// the leading rows of the sorted batch at time t — the packed
/// representation of the batch.
pub fn active_batch_sizes(sorted_lengths: &[usize]) -> Vec<usize> {
    let max_len = sorted_lengths.first().copied().unwrap_or(0);
    (0..max_len)
        .map(|t| sorted_lengths.iter().take_while(|&&l| l > t).count())
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_descending_is_identity() {
        let p = SortPermutation::from_lengths(&[7, 5]);
        assert_eq!(p.sort, vec![0, 1]);
        assert_eq!(p.unsort, vec![0, 1]);
    }

    #[test]
    fn test_ascending_pair_swaps() {
        let p = SortPermutation::from_lengths(&[5, 7]);
        assert_eq!(p.sort, vec![1, 0]);
        assert_eq!(p.unsort, vec![1, 0]);
    }

    #[test]
    fn test_singleton_is_identity() {
        let p = SortPermutation::from_lengths(&[3]);
        assert_eq!(p.sort, vec![0]);
        assert_eq!(p.unsort, vec![0]);
    }

    #[test]
    fn test_unsort_inverts_sort() {
        let lengths = [4, 9, 1, 6, 6, 2, 9, 3];
        let p = SortPermutation::from_lengths(&lengths);
        for i in 0..lengths.len() {
            assert_eq!(p.unsort[p.sort[i]], i);
        }
    }

    #[test]
    fn test_sorted_lengths_non_increasing() {
        let lengths = [4, 9, 1, 6, 6, 2, 9, 3];
        let p = SortPermutation::from_lengths(&lengths);
        let sorted = p.sorted_lengths(&lengths);
        assert!(sorted.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_stable_for_ties() {
        // Equal lengths keep their original relative order
        let p = SortPermutation::from_lengths(&[5, 5, 7, 5]);
        assert_eq!(p.sort, vec![2, 0, 1, 3]);
    }

    #[test]
    #[should_panic(expected = "zero-length")]
    fn test_zero_length_rejected() {
        SortPermutation::from_lengths(&[3, 0]);
    }

    #[test]
    #[should_panic(expected = "at least one")]
    fn test_empty_batch_rejected() {
        SortPermutation::from_lengths(&[]);
    }

    #[test]
    fn test_active_batch_sizes() {
        // lengths sorted descending: 4, 2, 2, 1
        assert_eq!(active_batch_sizes(&[4, 2, 2, 1]), vec![4, 3, 1, 1]);
        assert_eq!(active_batch_sizes(&[1]), vec![1]);
        assert_eq!(active_batch_sizes(&[]), Vec::<usize>::new());
    }
}
