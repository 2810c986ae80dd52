// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop over shuffled corpus batches:
//
//   shuffle → forward (packed) → NLL loss → zero grads →
//   backward → Adam step → detach hidden state → report
//
// The hidden state is re-zeroed at the start of every epoch,
// carried across batches within it, and detached after every
// optimizer step so the autograd graph never grows across
// batches. Numeric failures (non-finite loss) are not caught —
// this is a research loop, not a service.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::data::{corpus::Corpus, encoder::CorpusEncoder};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{GruClassifier, GruClassifierConfig};
use crate::ml::predictor;

type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;
type ValidBackend = burn::backend::NdArray;

/// How often (in batches) the running loss is reported.
const LOG_EVERY: usize = 100;

pub struct TrainOptions {
    pub epochs: usize,
    pub lr:     f64,
}

pub fn run_training(
    model_cfg:    &GruClassifierConfig,
    opts:         &TrainOptions,
    train_corpus: Corpus,
    val_corpus:   Corpus,
    encoder:      &CorpusEncoder,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
) -> Result<()> {
    let device = <ValidBackend as Backend>::Device::default();
    tracing::info!("Using device: {:?}", device);
    train_loop(model_cfg, opts, train_corpus, val_corpus, encoder, ckpt_manager, metrics, device)
}

#[allow(clippy::too_many_arguments)]
fn train_loop(
    model_cfg:    &GruClassifierConfig,
    opts:         &TrainOptions,
    mut train_corpus: Corpus,
    val_corpus:   Corpus,
    encoder:      &CorpusEncoder,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
    device:       <ValidBackend as Backend>::Device,
) -> Result<()> {
    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: GruClassifier<TrainBackend> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {} GRU layers, hidden_dim={}, vocab={}",
        model_cfg.num_layers, model_cfg.hidden_dim, model_cfg.vocab_size,
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let optim_cfg = AdamConfig::new().with_epsilon(1e-8);
    let mut optim = optim_cfg.init();

    let mut rng = rand::thread_rng();
    let batch_size = model_cfg.batch_size;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=opts.epochs {
        // Shuffle the corpus; instances carry their labels, so the
        // sequence/label pairing stays intact.
        train_corpus.shuffle(&mut rng);

        // Fresh recurrent state at the start of each epoch
        let mut hidden = model.init_hidden(batch_size, &device);

        let mut epoch_loss_sum = 0.0f64;
        let mut epoch_batches  = 0usize;
        let mut running_loss   = 0.0f64;

        for (idx, group) in encoder.batches(&train_corpus, batch_size).enumerate() {
            let batch = encoder.batch_to_tensors::<TrainBackend>(group, &device)?;

            // Forward pass over the packed, length-sorted batch
            let out = model.forward(batch.token_ids, &batch.lengths, hidden);
            let loss = model.loss(out.log_probs, batch.labels);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            epoch_loss_sum += loss_val;
            epoch_batches  += 1;
            running_loss   += loss_val;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(opts.lr, model, grads);

            // Sever the hidden state from this batch's graph before the
            // next forward pass starts a fresh one.
            hidden = out.hidden.detach();

            if (idx + 1) % LOG_EVERY == 0 {
                tracing::info!(
                    "[epoch {:>3}, batch {:>5}] loss: {:.3}",
                    epoch,
                    idx + 1,
                    running_loss / LOG_EVERY as f64,
                );
                running_loss = 0.0;
            }
        }

        let avg_train_loss = if epoch_batches > 0 {
            epoch_loss_sum / epoch_batches as f64
        } else {
            f64::NAN
        };

        // ── Validation phase ──────────────────────────────────────────────────
        // model.valid() moves to the inner backend: no autodiff overhead,
        // dropout disabled for deterministic evaluation.
        let model_valid = model.valid();
        let (val_loss, val_acc) =
            validate(&model_valid, &val_corpus, encoder, batch_size, &device)?;

        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_acc={:.1}%",
            epoch, opts.epochs, avg_train_loss, val_loss, val_acc * 100.0,
        );
        metrics.log(&EpochMetrics::new(epoch, avg_train_loss, val_loss, val_acc))?;

        ckpt_manager.save_model(&model)?;
        tracing::debug!("Checkpoint saved after epoch {}", epoch);
    }

    tracing::info!("Training complete");
    Ok(())
}

/// Average NLL loss and accuracy over a held-out corpus.
fn validate(
    model:      &GruClassifier<ValidBackend>,
    corpus:     &Corpus,
    encoder:    &CorpusEncoder,
    batch_size: usize,
    device:     &<ValidBackend as Backend>::Device,
) -> Result<(f64, f64)> {
    if corpus.is_empty() {
        return Ok((f64::NAN, 0.0));
    }

    let mut loss_sum = 0.0f64;
    let mut batches  = 0usize;
    let mut hidden = model.init_hidden(batch_size, device);

    for group in encoder.batches(corpus, batch_size) {
        let batch = encoder.batch_to_tensors::<ValidBackend>(group, device)?;
        let out = model.forward(batch.token_ids, &batch.lengths, hidden);

        loss_sum += model.loss(out.log_probs, batch.labels).into_scalar().elem::<f64>();
        batches  += 1;
        hidden = out.hidden.detach();
    }

    let (y_pred, y_true) = predictor::predict(model, corpus, encoder, batch_size, device)?;
    let acc = predictor::accuracy(&y_pred, &y_true);

    Ok((loss_sum / batches as f64, acc))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encoder::{Vocab, PAD_ID};
    use crate::domain::instance::Instance;

    fn tiny_corpus() -> Corpus {
        // Two trivially separable classes with mixed sequence lengths,
        // sized so batch_size=3 leaves an under-full final batch.
        let mut instances = Vec::new();
        for i in 0..4 {
            let mut toks = vec!["good".to_string()];
            toks.extend((0..i).map(|_| "fine".to_string()));
            instances.push(Instance::new(toks, 1));

            let mut toks = vec!["bad".to_string()];
            toks.extend((0..(3 - i).max(1)).map(|_| "poor".to_string()));
            instances.push(Instance::new(toks, 0));
        }
        Corpus::new(instances)
    }

    #[test]
    fn test_training_saves_loadable_checkpoint_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = tiny_corpus();
        let encoder = CorpusEncoder::new(Vocab::build(&corpus));

        let model_cfg = GruClassifierConfig::new(
            1, 8, encoder.vocab().len(), PAD_ID, 4, 0.0, 2, 3,
        );
        let ckpt = CheckpointManager::new(dir.path());
        ckpt.save_config(&model_cfg).unwrap();
        let metrics = MetricsLogger::new(dir.path()).unwrap();

        let opts = TrainOptions { epochs: 2, lr: 1e-2 };
        run_training(
            &model_cfg, &opts, corpus.clone(), corpus,
            &encoder, &ckpt, &metrics,
        )
        .unwrap();

        // Checkpoint must be restorable into the saved architecture
        let device = Default::default();
        let model: GruClassifier<TrainBackend> = ckpt.load_config().unwrap().init(&device);
        assert!(ckpt.load_model(model, &device).is_ok());

        // One header + one metrics row per epoch
        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }
}
