use serde::{Deserialize, Serialize};

/// One labelled training example: a variable-length token sequence,
/// its class label, and (optionally) the positions of the tokens a human
/// annotator marked as evidence for that label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// The token sequence, in surface order
    pub tokens: Vec<String>,

    /// Class label index in [0, label_size)
    pub label: usize,

    /// Token positions the annotator marked as relevant ("rationale").
    /// Empty when the example carries no annotation — such examples are
    /// skipped by the interpretability evaluator.
    #[serde(default)]
    pub rationale: Vec<usize>,
}

impl Instance {
    pub fn new(tokens: Vec<String>, label: usize) -> Self {
        Self { tokens, label, rationale: Vec::new() }
    }

    /// Sequence length in tokens (before any padding)
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
