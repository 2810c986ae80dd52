// ============================================================
// Layer 2 — ExplainUseCase
// ============================================================
// Loads a trained checkpoint, computes gradient-based word
// importance over a corpus, and scores the explanations against
// the corpus's rationale annotations at a top-k cutoff.
//
// The attribution pass differentiates through the model, so it
// runs on the autodiff backend — but with dropout forced to zero
// so repeated runs attribute identically.

use anyhow::Result;
use burn::prelude::*;
use std::{collections::HashMap, path::Path};

use crate::data::{corpus::Corpus, corpus::JsonCorpusLoader, encoder::{CorpusEncoder, Vocab}};
use crate::explain::eval::{avg_prec_recall_f1_at_k, PrecRecallF1};
use crate::explain::gradients::{grad_importance, AttributionMethod, ImportanceScores};
use crate::infra::{checkpoint::CheckpointManager, files};
use crate::ml::model::GruClassifier;

type ExplainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

/// How many of the highest-scoring tokens to keep in the corpus-wide
/// top-token dump.
const TOP_TOKENS: usize = 50;

pub struct ExplainUseCase {
    checkpoint_dir: String,
    corpus_path:    String,
}

impl ExplainUseCase {
    pub fn new(checkpoint_dir: String, corpus_path: String) -> Self {
        Self { checkpoint_dir, corpus_path }
    }

    /// Compute importance scores and evaluate them at cutoff `k`.
    /// When `scores_dir` is given, the raw per-token scores and the
    /// corpus-wide top tokens are also written there as JSON.
    pub fn execute(
        &self,
        method:     AttributionMethod,
        k:          usize,
        scores_dir: Option<&Path>,
    ) -> Result<PrecRecallF1> {
        let device = <ExplainBackend as Backend>::Device::default();

        let ckpt = CheckpointManager::new(&self.checkpoint_dir);
        let mut cfg = ckpt.load_config()?;
        // Stochastic dropout would make attributions non-deterministic
        cfg.dropout = 0.0;

        let model: GruClassifier<ExplainBackend> = cfg.init(&device);
        let model = ckpt.load_model(model, &device)?;
        tracing::info!("Model loaded from '{}'", self.checkpoint_dir);

        let vocab = Vocab::load(ckpt.dir())?;
        let encoder = CorpusEncoder::new(vocab);
        let corpus = JsonCorpusLoader::new(&self.corpus_path).load()?;

        let importance =
            grad_importance(&model, &corpus, &encoder, method, cfg.batch_size, &device)?;

        if let Some(dir) = scores_dir {
            files::write_json(&importance, "importance_scores.json", dir)?;
            let top = top_scoring_tokens(&importance, &corpus);
            files::write_json(&top, "top_tokens.json", dir)?;
            tracing::info!("Wrote importance scores to '{}'", dir.display());
        }

        avg_prec_recall_f1_at_k(&importance, &corpus, k)
    }
}

/// Corpus-wide view: each token's highest attribution anywhere in the
/// corpus, reduced to the TOP_TOKENS best entries.
fn top_scoring_tokens(
    importance: &ImportanceScores,
    corpus:     &Corpus,
) -> Vec<(String, f64)> {
    let mut best: HashMap<String, f64> = HashMap::new();
    for (scores, inst) in importance.scores.iter().zip(&corpus.instances) {
        for (pos, &score) in scores.iter().enumerate() {
            let entry = best.entry(inst.tokens[pos].clone()).or_insert(f64::MIN);
            *entry = entry.max(score as f64);
        }
    }
    files::top_k_entries(&best, TOP_TOKENS)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instance::Instance;

    #[test]
    fn test_top_scoring_tokens_takes_max_per_token() {
        let corpus = Corpus::new(vec![
            Instance::new(vec!["a".into(), "b".into()], 0),
            Instance::new(vec!["a".into()], 1),
        ]);
        let importance = ImportanceScores {
            scores: vec![vec![0.1, 0.9], vec![0.7]],
        };

        let top = top_scoring_tokens(&importance, &corpus);
        assert_eq!(top[0].0, "b");
        let a = top.iter().find(|(t, _)| t == "a").unwrap();
        assert!((a.1 - 0.7).abs() < 1e-6);
    }
}
