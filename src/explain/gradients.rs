// ============================================================
// Layer 5 — Gradient Attribution
// ============================================================
// Computes per-token importance scores for a trained classifier
// by differentiating the predicted-class log-probability with
// respect to the embedded input.
//
// The embedding output is re-marked as a gradient root before the
// recurrent forward pass resumes, so backward() deposits a
// gradient of shape [batch, seq, emb_dim] there; the per-token
// score then collapses the embedding dimension according to the
// chosen strategy. Scoring one corpus never trains or mutates the
// classifier.

use anyhow::{anyhow, Result};
use burn::tensor::backend::AutodiffBackend;
use serde::Serialize;

use crate::data::{corpus::Corpus, encoder::CorpusEncoder};
use crate::ml::model::GruClassifier;

// ─── AttributionMethod ────────────────────────────────────────────────────────
/// Closed set of attribution strategies. A tagged enum instead of a
/// string key, so an invalid method name cannot survive to runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributionMethod {
    /// Dot product of the gradient with the embedding itself
    /// (grad · input), one score per token.
    ModDot,

    /// L2 norm of the gradient over the embedding dimension.
    GradNorm,
}

// ─── ImportanceScores ─────────────────────────────────────────────────────────
/// Per-example, per-token attribution scores, in corpus order.
/// Each inner vector is truncated to the example's true length.
#[derive(Debug, Clone, Serialize)]
pub struct ImportanceScores {
    pub scores: Vec<Vec<f32>>,
}

impl ImportanceScores {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Compute gradient-derived importance scores for every corpus instance.
pub fn grad_importance<B: AutodiffBackend>(
    model:      &GruClassifier<B>,
    corpus:     &Corpus,
    encoder:    &CorpusEncoder,
    method:     AttributionMethod,
    batch_size: usize,
    device:     &B::Device,
) -> Result<ImportanceScores> {
    let mut scores: Vec<Vec<f32>> = Vec::with_capacity(corpus.len());

    for group in encoder.batches(corpus, batch_size) {
        let batch = encoder.batch_to_tensors::<B>(group, device)?;
        let [n_examples, max_len] = batch.token_ids.dims();

        // Mark the embedded input as a gradient root, detaching it from
        // the embedding weights; attribution needs ∂output/∂embs only.
        let embs = model.embed(batch.token_ids).detach().require_grad();

        let hidden = model.init_hidden(n_examples, device);
        let out = model.forward_embedded(embs.clone(), &batch.lengths, hidden);

        // Score of the predicted class per example; summing is exact here
        // because example i's score depends only on example i's tokens.
        let predicted = out.log_probs.clone().argmax(1);
        let objective = out.log_probs.gather(1, predicted).sum();

        let grads = objective.backward();
        let grad = embs
            .grad(&grads)
            .ok_or_else(|| anyhow!("No gradient recorded for the embedded input"))?;

        let per_token = match method {
            AttributionMethod::ModDot => {
                (grad * embs.inner()).sum_dim(2).squeeze::<2>(2)
            }
            AttributionMethod::GradNorm => {
                grad.powf_scalar(2.0).sum_dim(2).sqrt().squeeze::<2>(2)
            }
        };

        let flat: Vec<f32> = per_token
            .into_data()
            .to_vec()
            .map_err(|e| anyhow!("Cannot read attribution tensor: {e:?}"))?;

        // Truncate each row to the example's true length — scores over
        // padding positions are meaningless.
        for (i, &len) in batch.lengths.iter().enumerate() {
            scores.push(flat[i * max_len..i * max_len + len].to_vec());
        }
    }

    tracing::info!(
        "Computed {:?} importance scores for {} instances",
        method,
        scores.len(),
    );
    Ok(ImportanceScores { scores })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encoder::Vocab;
    use crate::domain::instance::Instance;
    use crate::ml::model::GruClassifierConfig;

    type ExplainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

    fn setup() -> (Corpus, CorpusEncoder) {
        let corpus = Corpus::new(vec![
            Instance::new(vec!["good".into(), "movie".into(), "indeed".into()], 1),
            Instance::new(vec!["bad".into()], 0),
        ]);
        let encoder = CorpusEncoder::new(Vocab::build(&corpus));
        (corpus, encoder)
    }

    #[test]
    fn test_scores_match_sequence_lengths() {
        let (corpus, encoder) = setup();
        let device = Default::default();
        let model = GruClassifierConfig::new(1, 4, encoder.vocab().len(), 0, 3, 0.0, 2, 2)
            .init::<ExplainBackend>(&device);

        let imp = grad_importance(
            &model, &corpus, &encoder,
            AttributionMethod::ModDot, 2, &device,
        )
        .unwrap();

        assert_eq!(imp.len(), 2);
        assert_eq!(imp.scores[0].len(), 3);
        assert_eq!(imp.scores[1].len(), 1);
    }

    #[test]
    fn test_grad_norm_is_non_negative() {
        let (corpus, encoder) = setup();
        let device = Default::default();
        let model = GruClassifierConfig::new(2, 4, encoder.vocab().len(), 0, 3, 0.0, 2, 2)
            .init::<ExplainBackend>(&device);

        let imp = grad_importance(
            &model, &corpus, &encoder,
            AttributionMethod::GradNorm, 2, &device,
        )
        .unwrap();

        assert!(imp.scores.iter().flatten().all(|&s| s >= 0.0));
    }
}
