// ============================================================
// Layer 5 — Explanation Layer
// ============================================================
// Post-hoc interpretability for a trained classifier:
//
//   gradients.rs — per-token importance from backpropagated
//                  gradients (closed AttributionMethod enum)
//
//   eval.rs      — precision/recall/F1 of the top-k attributed
//                  tokens against rationale annotations
//
// Reference: Li et al. (2016) Visualizing and Understanding
//            Neural Models in NLP

/// Gradient-based importance scoring
pub mod gradients;

/// Top-k precision/recall/F1 against rationale annotations
pub mod eval;
