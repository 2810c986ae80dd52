// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The rest of the system programs against these traits instead
// of concrete types, so data sources can be swapped without
// touching the application layer.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::instance::Instance;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can load a labelled corpus.
///
/// Implementations:
///   - JsonCorpusLoader → loads from a JSON file of instances
pub trait CorpusSource {
    /// Load all instances from this source, in source order.
    fn load_all(&self) -> Result<Vec<Instance>>;
}
