// ============================================================
// Layer 4 — Corpus
// ============================================================
// A corpus is an ordered collection of labelled instances.
// Each `Instance` carries its own label and rationale, so any
// shuffle or split of the corpus moves sequences, labels, and
// annotations together — the lockstep invariant is structural
// and cannot be violated by reordering.

use anyhow::{bail, Context, Result};
use rand::seq::SliceRandom;
use std::{fs, path::PathBuf};

use crate::domain::{instance::Instance, traits::CorpusSource};

// ─── Corpus ───────────────────────────────────────────────────────────────────
/// An in-memory labelled corpus.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub instances: Vec<Instance>,
}

impl Corpus {
    pub fn new(instances: Vec<Instance>) -> Self {
        Self { instances }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Number of distinct labels, assuming labels are 0-based indices.
    pub fn label_count(&self) -> usize {
        self.instances.iter().map(|i| i.label + 1).max().unwrap_or(0)
    }

    /// Shuffle instances in place. Labels and rationales travel with
    /// their instance, so the pairing always stays intact.
    pub fn shuffle(&mut self, rng: &mut impl rand::Rng) {
        self.instances.shuffle(rng);
    }
}

// ─── JsonCorpusLoader ─────────────────────────────────────────────────────────
/// Loads a corpus from a JSON file containing an array of instances:
///
///   [{"tokens": ["not", "bad"], "label": 1, "rationale": [0]}, ...]
pub struct JsonCorpusLoader {
    path: PathBuf,
}

impl JsonCorpusLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Corpus> {
        Ok(Corpus::new(self.load_all()?))
    }
}

impl CorpusSource for JsonCorpusLoader {
    fn load_all(&self) -> Result<Vec<Instance>> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read corpus file '{}'", self.path.display()))?;

        let instances: Vec<Instance> = serde_json::from_str(&json)
            .with_context(|| format!("Malformed corpus JSON in '{}'", self.path.display()))?;

        // Zero-length sequences are a precondition violation for the
        // packed forward pass — reject them up front with a clear error.
        for (idx, inst) in instances.iter().enumerate() {
            if inst.is_empty() {
                bail!(
                    "Corpus instance {} in '{}' has no tokens",
                    idx,
                    self.path.display()
                );
            }
        }

        tracing::info!("Loaded {} instances from '{}'", instances.len(), self.path.display());
        Ok(instances)
    }
}
