// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles instances and splits them into a training set and a
// held-out validation set. Shuffling first keeps both sets
// representative when the corpus file is ordered by label or
// source. Each instance carries its own label, so the split can
// never separate a sequence from its annotation.

use rand::seq::SliceRandom;

use crate::data::corpus::Corpus;

/// Randomly shuffle the corpus and split it into (train, validation).
///
/// `train_fraction` is the proportion kept for training, e.g. 0.8.
pub fn split_train_val(mut corpus: Corpus, train_fraction: f64) -> (Corpus, Corpus) {
    let mut rng = rand::thread_rng();
    corpus.instances.shuffle(&mut rng);

    let total = corpus.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;
    let split_at = split_at.min(total);

    // split_off(n) removes elements [n..] and returns them
    let val = corpus.instances.split_off(split_at);

    tracing::debug!(
        "Corpus split: {} training, {} validation",
        corpus.instances.len(),
        val.len(),
    );

    (corpus, Corpus::new(val))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instance::Instance;

    fn corpus_of(n: usize) -> Corpus {
        Corpus::new((0..n).map(|i| Instance::new(vec![format!("t{i}")], 0)).collect())
    }

    #[test]
    fn test_correct_split_sizes() {
        let (train, val) = split_train_val(corpus_of(100), 0.8);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(), 20);
    }

    #[test]
    fn test_all_instances_preserved() {
        let (train, val) = split_train_val(corpus_of(50), 0.7);
        assert_eq!(train.len() + val.len(), 50);
    }

    #[test]
    fn test_empty_corpus() {
        let (train, val) = split_train_val(corpus_of(0), 0.8);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_full_training_split() {
        let (train, val) = split_train_val(corpus_of(10), 1.0);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }
}
