// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the labelled corpus     (Layer 4 - data)
//   Step 2: Split train/validation       (Layer 4 - data)
//   Step 3: Build + save the vocabulary  (Layer 4 - data)
//   Step 4: Save the model config        (Layer 6 - infra)
//   Step 5: Run the training loop        (Layer 5 - ml)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    corpus::JsonCorpusLoader,
    encoder::{CorpusEncoder, Vocab, PAD_ID},
    splitter::split_train_val,
};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::model::GruClassifierConfig;
use crate::ml::trainer::{run_training, TrainOptions};

/// Fraction of the corpus kept for training; the rest is validation.
const TRAIN_FRACTION: f64 = 0.8;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Serialisable so a run can be
// reproduced from its saved configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub corpus_path:    String,
    pub checkpoint_dir: String,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub num_layers:     usize,
    pub hidden_dim:     usize,
    pub embedding_dim:  usize,
    pub dropout:        f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            corpus_path:    "data/train.json".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            batch_size:     32,
            epochs:         10,
            lr:             1e-3,
            num_layers:     2,
            hidden_dim:     100,
            embedding_dim:  100,
            dropout:        0.5,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load the corpus ───────────────────────────────────────────
        tracing::info!("Loading corpus from '{}'", cfg.corpus_path);
        let corpus = JsonCorpusLoader::new(&cfg.corpus_path).load()?;
        if corpus.is_empty() {
            bail!("Corpus '{}' contains no instances", cfg.corpus_path);
        }
        let label_size = corpus.label_count();
        if label_size < 2 {
            bail!("Corpus must contain at least two distinct labels");
        }

        // ── Step 2: Build the vocabulary over the whole corpus ────────────────
        // Built before splitting so validation sequences don't collapse
        // to <unk>, and saved so evaluate/explain reuse the same ids.
        let vocab = Vocab::build(&corpus);
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        vocab.save(ckpt_manager.dir())?;

        // ── Step 3: Train / validation split ──────────────────────────────────
        let (train_corpus, val_corpus) = split_train_val(corpus, TRAIN_FRACTION);
        tracing::info!(
            "Split: {} train, {} validation",
            train_corpus.len(),
            val_corpus.len()
        );

        // ── Step 4: Save the model hyperparameters ────────────────────────────
        // Evaluate/explain rebuild the exact architecture from this file
        // before restoring the weights into it.
        let model_cfg = GruClassifierConfig::new(
            cfg.num_layers,
            cfg.hidden_dim,
            vocab.len(),
            PAD_ID,
            cfg.embedding_dim,
            cfg.dropout,
            label_size,
            cfg.batch_size,
        );
        ckpt_manager.save_config(&model_cfg)?;

        // ── Step 5: Run the training loop (Layer 5) ───────────────────────────
        let encoder = CorpusEncoder::new(vocab);
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;
        let opts = TrainOptions { epochs: cfg.epochs, lr: cfg.lr };
        run_training(
            &model_cfg, &opts, train_corpus, val_corpus,
            &encoder, &ckpt_manager, &metrics,
        )?;

        Ok(())
    }
}
