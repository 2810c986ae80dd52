// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn-specific code lives in this layer (and in explain/,
// which differentiates through it). No other layer imports burn
// directly.
//
//   batching.rs  — sort/unsort permutations for variable-length
//                  batches and the packed per-timestep schedule
//
//   model.rs     — the GRU classifier:
//                  • embedding layer
//                  • stacked GRU layers (hand-rolled cells, so the
//                    packed schedule controls every timestep)
//                  • inter-layer dropout
//                  • linear head + log-softmax
//                  • carried HiddenState with truncate/detach
//
//   trainer.rs   — epoch loop: shuffle, forward, NLL loss,
//                  backward, Adam step, hidden-state detach,
//                  validation metrics, checkpointing
//
//   predictor.rs — evaluation-mode batch prediction (argmax)
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Cho et al. (2014) Learning Phrase Representations
//            using RNN Encoder-Decoder

/// Sort/unsort permutations and packed batch schedule
pub mod batching;

/// GRU classifier architecture and carried hidden state
pub mod model;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Evaluation-mode prediction loop
pub mod predictor;
