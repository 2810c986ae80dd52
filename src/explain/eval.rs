// ============================================================
// Layer 5 — Interpretability Evaluation
// ============================================================
// Scores importance rankings against human rationale annotations:
// for each annotated example, the k highest-attributed token
// positions are compared to the ground-truth relevant set, and
// precision/recall/F1 are averaged over the corpus.
//
// k is capped at the example's token count, so short sequences
// are evaluated over all their tokens rather than erroring.
// Ties at the k-boundary break toward the lower token index,
// which keeps the metric deterministic.

use anyhow::{bail, Result};
use std::collections::HashSet;

use crate::data::corpus::Corpus;
use crate::explain::gradients::ImportanceScores;

// ─── PrecRecallF1 ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecRecallF1 {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
}

/// Token positions of the k highest scores, descending by score,
/// lower index first among equal scores.
pub fn top_k_positions(scores: &[f32], k: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..scores.len()).collect();
    idx.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    idx.truncate(k.min(scores.len()));
    idx
}

/// Precision/recall/F1 of the top-k scored positions against the
/// ground-truth relevant set for a single example.
pub fn prec_recall_f1_at_k(scores: &[f32], relevant: &[usize], k: usize) -> PrecRecallF1 {
    let top: Vec<usize> = top_k_positions(scores, k);
    let relevant: HashSet<usize> = relevant.iter().copied().collect();

    let hits = top.iter().filter(|p| relevant.contains(p)).count() as f64;

    let precision = if top.is_empty() { 0.0 } else { hits / top.len() as f64 };
    let recall = if relevant.is_empty() { 0.0 } else { hits / relevant.len() as f64 };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    PrecRecallF1 { precision, recall, f1 }
}

/// Corpus-wide average of precision/recall/F1 at cutoff k.
///
/// Examples without a rationale annotation are skipped; it is an error
/// for the whole corpus to carry none.
pub fn avg_prec_recall_f1_at_k(
    importance: &ImportanceScores,
    corpus:     &Corpus,
    k:          usize,
) -> Result<PrecRecallF1> {
    assert_eq!(
        importance.len(),
        corpus.len(),
        "importance scores and corpus must be aligned"
    );

    let mut sum = PrecRecallF1 { precision: 0.0, recall: 0.0, f1: 0.0 };
    let mut counted = 0usize;

    for (scores, inst) in importance.scores.iter().zip(&corpus.instances) {
        if inst.rationale.is_empty() {
            continue;
        }
        let m = prec_recall_f1_at_k(scores, &inst.rationale, k);
        sum.precision += m.precision;
        sum.recall    += m.recall;
        sum.f1        += m.f1;
        counted += 1;
    }

    if counted == 0 {
        bail!("Corpus has no rationale annotations to evaluate against");
    }

    let n = counted as f64;
    Ok(PrecRecallF1 {
        precision: sum.precision / n,
        recall:    sum.recall / n,
        f1:        sum.f1 / n,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instance::Instance;

    #[test]
    fn test_top_k_descending_with_index_tiebreak() {
        let scores = [0.2, 0.9, 0.2, 0.9];
        // Equal scores: lower index wins
        assert_eq!(top_k_positions(&scores, 3), vec![1, 3, 0]);
    }

    #[test]
    fn test_k_larger_than_sequence_uses_all_tokens() {
        let scores = [0.5, 0.1, 0.3];
        assert_eq!(top_k_positions(&scores, 15).len(), 3);

        // Top-3 covers everything, so recall must be perfect
        let m = prec_recall_f1_at_k(&scores, &[0, 2], 15);
        assert_eq!(m.recall, 1.0);
        assert!((m.precision - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_ranking() {
        let m = prec_recall_f1_at_k(&[0.9, 0.8, 0.1, 0.0], &[0, 1], 2);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1, 1.0);
    }

    #[test]
    fn test_disjoint_ranking() {
        let m = prec_recall_f1_at_k(&[0.9, 0.8, 0.1, 0.0], &[2, 3], 2);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
    }

    #[test]
    fn test_average_skips_unannotated_examples() {
        let corpus = Corpus::new(vec![
            Instance {
                tokens: vec!["a".into(), "b".into()],
                label: 0,
                rationale: vec![0],
            },
            Instance::new(vec!["c".into(), "d".into()], 1),
        ]);
        let importance = ImportanceScores {
            scores: vec![vec![1.0, 0.0], vec![0.5, 0.5]],
        };

        let m = avg_prec_recall_f1_at_k(&importance, &corpus, 1).unwrap();
        // Only the annotated example contributes: top-1 is position 0, a hit
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
    }

    #[test]
    fn test_unannotated_corpus_is_error() {
        let corpus = Corpus::new(vec![Instance::new(vec!["a".into()], 0)]);
        let importance = ImportanceScores { scores: vec![vec![1.0]] };
        assert!(avg_prec_recall_f1_at_k(&importance, &corpus, 5).is_err());
    }
}
