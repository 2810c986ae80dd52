// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Loads a trained checkpoint and measures label accuracy on a
// held-out corpus. No gradients, no parameter updates.

use anyhow::Result;
use burn::prelude::*;

use crate::data::{corpus::JsonCorpusLoader, encoder::{CorpusEncoder, Vocab}};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::GruClassifier;
use crate::ml::predictor;

type EvalBackend = burn::backend::NdArray;

/// Outcome of evaluating a checkpoint on a corpus.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub total:    usize,
}

pub struct EvaluateUseCase {
    checkpoint_dir: String,
    corpus_path:    String,
}

impl EvaluateUseCase {
    pub fn new(checkpoint_dir: String, corpus_path: String) -> Self {
        Self { checkpoint_dir, corpus_path }
    }

    pub fn execute(&self) -> Result<EvaluationReport> {
        let device = <EvalBackend as Backend>::Device::default();

        // Rebuild the saved architecture, then restore its weights
        let ckpt = CheckpointManager::new(&self.checkpoint_dir);
        let cfg = ckpt.load_config()?;
        let model: GruClassifier<EvalBackend> = cfg.init(&device);
        let model = ckpt.load_model(model, &device)?;
        tracing::info!("Model loaded from '{}'", self.checkpoint_dir);

        let vocab = Vocab::load(ckpt.dir())?;
        let encoder = CorpusEncoder::new(vocab);

        let corpus = JsonCorpusLoader::new(&self.corpus_path).load()?;
        let (y_pred, y_true) =
            predictor::predict(&model, &corpus, &encoder, cfg.batch_size, &device)?;

        Ok(EvaluationReport {
            accuracy: predictor::accuracy(&y_pred, &y_true),
            total:    y_true.len(),
        })
    }
}
