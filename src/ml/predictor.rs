// ============================================================
// Layer 5 — Prediction Loop
// ============================================================
// Batch iteration in evaluation mode: forward pass, argmax label
// per example, no parameter updates and no gradient computation.
// The hidden state is still detached after every batch — no
// backward pass happens here, but the discipline is kept so
// prediction can never accumulate graph history either.

use anyhow::{anyhow, Result};
use burn::prelude::*;

use crate::data::{corpus::Corpus, encoder::CorpusEncoder};
use crate::ml::model::GruClassifier;

/// Predict a label for every instance, in corpus order.
/// Returns (predicted labels, true labels).
pub fn predict<B: Backend>(
    model:      &GruClassifier<B>,
    corpus:     &Corpus,
    encoder:    &CorpusEncoder,
    batch_size: usize,
    device:     &B::Device,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let mut y_pred = Vec::with_capacity(corpus.len());
    let mut y_true = Vec::with_capacity(corpus.len());

    let mut hidden = model.init_hidden(batch_size, device);

    for group in encoder.batches(corpus, batch_size) {
        let batch = encoder.batch_to_tensors::<B>(group, device)?;

        let truth: Vec<i64> = batch
            .labels
            .into_data()
            .to_vec()
            .map_err(|e| anyhow!("Cannot read label tensor: {e:?}"))?;
        y_true.extend(truth.iter().map(|&l| l as usize));

        let out = model.forward(batch.token_ids, &batch.lengths, hidden);

        // argmax(1) returns shape [batch, 1] — flatten before reading
        let preds: Vec<i64> = out
            .log_probs
            .argmax(1)
            .flatten::<1>(0, 1)
            .into_data()
            .to_vec()
            .map_err(|e| anyhow!("Cannot read prediction tensor: {e:?}"))?;
        y_pred.extend(preds.iter().map(|&p| p as usize));

        hidden = out.hidden.detach();
    }

    Ok((y_pred, y_true))
}

/// Fraction of positions where prediction equals truth.
pub fn accuracy(y_pred: &[usize], y_true: &[usize]) -> f64 {
    assert_eq!(y_pred.len(), y_true.len());
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_pred.iter().zip(y_true).filter(|(p, t)| p == t).count();
    correct as f64 / y_true.len() as f64
}
