// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: each use case tells the other
// layers what to do but does no ML math, no printing, and no
// direct tensor work itself.

// The training workflow
pub mod train_use_case;

// The accuracy-evaluation workflow
pub mod evaluate_use_case;

// The importance-scoring and interpretability-evaluation workflow
pub mod explain_use_case;
