// ============================================================
// Layer 4 — Vocabulary and Corpus Encoder
// ============================================================
// Converts token sequences into padded, GPU-ready id tensors.
//
// The pipeline per batch:
//   Vec<Instance>  → token ids        (Vocab lookup, <unk> fallback)
//                  → right-padding    (to the longest sequence in batch)
//                  → Tensor [batch, max_len] + labels + true lengths
//
// Lengths are returned alongside the tensors because the forward
// pass needs them to sort, pack, and select the final valid
// hidden state per sequence.
//
// Reference: Burn Book §4 (Datasets and Batching)

use anyhow::{bail, Context, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};

use crate::data::corpus::Corpus;
use crate::domain::instance::Instance;

/// Reserved id for the padding token.
pub const PAD_ID: usize = 0;
/// Reserved id for out-of-vocabulary tokens.
pub const UNK_ID: usize = 1;

// ─── Vocab ────────────────────────────────────────────────────────────────────
/// Token ↔ id mapping built once from the training corpus and persisted
/// next to the checkpoint so evaluation and explanation reuse the exact
/// same ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocab {
    token_to_id: HashMap<String, usize>,
    id_to_token: Vec<String>,
}

impl Vocab {
    /// Build a vocabulary over every token in the corpus.
    /// Ids 0 and 1 are reserved for <pad> and <unk>.
    pub fn build(corpus: &Corpus) -> Self {
        let mut id_to_token = vec!["<pad>".to_string(), "<unk>".to_string()];
        let mut token_to_id = HashMap::new();
        token_to_id.insert("<pad>".to_string(), PAD_ID);
        token_to_id.insert("<unk>".to_string(), UNK_ID);

        for inst in &corpus.instances {
            for tok in &inst.tokens {
                if !token_to_id.contains_key(tok) {
                    token_to_id.insert(tok.clone(), id_to_token.len());
                    id_to_token.push(tok.clone());
                }
            }
        }

        tracing::info!("Built vocabulary with {} entries", id_to_token.len());
        Self { token_to_id, id_to_token }
    }

    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    /// Map a token to its id, falling back to <unk>.
    pub fn id(&self, token: &str) -> usize {
        self.token_to_id.get(token).copied().unwrap_or(UNK_ID)
    }

    pub fn token(&self, id: usize) -> Option<&str> {
        self.id_to_token.get(id).map(String::as_str)
    }

    /// Persist the vocabulary as JSON in the given directory.
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let path = dir.join("vocab.json");
        fs::write(&path, serde_json::to_string(self)?)
            .with_context(|| format!("Cannot write vocabulary to '{}'", path.display()))?;
        tracing::debug!("Saved vocabulary to '{}'", path.display());
        Ok(())
    }

    /// Load a previously saved vocabulary.
    /// Fails if none exists — a fresh vocabulary would silently remap ids.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join("vocab.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read vocabulary from '{}'. Have you run 'train' first?",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

// ─── EncodedBatch ─────────────────────────────────────────────────────────────
/// One padded batch ready for the classifier forward pass.
#[derive(Debug, Clone)]
pub struct EncodedBatch<B: Backend> {
    /// Token ids — shape [batch_size, max_len], right-padded with PAD_ID
    pub token_ids: Tensor<B, 2, Int>,

    /// Class labels — shape [batch_size]
    pub labels: Tensor<B, 1, Int>,

    /// True (unpadded) length of each sequence, in batch order
    pub lengths: Vec<usize>,
}

// ─── CorpusEncoder ────────────────────────────────────────────────────────────
/// Turns instances into padded tensor batches using a fixed vocabulary.
pub struct CorpusEncoder {
    vocab: Vocab,
}

impl CorpusEncoder {
    pub fn new(vocab: Vocab) -> Self {
        Self { vocab }
    }

    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    /// Yield corpus instances in groups of `batch_size`, preserving corpus
    /// order. The final group may be smaller than `batch_size`.
    pub fn batches<'a>(
        &self,
        corpus: &'a Corpus,
        batch_size: usize,
    ) -> impl Iterator<Item = &'a [Instance]> {
        assert!(batch_size > 0, "batch_size must be positive");
        corpus.instances.chunks(batch_size)
    }

    /// Convert one group of instances into padded tensors plus lengths.
    ///
    /// Steps:
    ///   1. Look up each token's id (<unk> for unseen tokens)
    ///   2. Right-pad every sequence to the longest in the batch
    ///   3. Flatten to one Vec<i32> and reshape to [batch, max_len]
    pub fn batch_to_tensors<B: Backend>(
        &self,
        batch: &[Instance],
        device: &B::Device,
    ) -> Result<EncodedBatch<B>> {
        if batch.is_empty() {
            bail!("Cannot encode an empty batch");
        }

        let lengths: Vec<usize> = batch.iter().map(Instance::len).collect();
        if lengths.contains(&0) {
            bail!("Cannot encode a zero-length sequence");
        }
        let max_len = *lengths.iter().max().unwrap_or(&0);

        let ids_flat: Vec<i32> = batch
            .iter()
            .flat_map(|inst| {
                let mut row: Vec<i32> =
                    inst.tokens.iter().map(|t| self.vocab.id(t) as i32).collect();
                row.resize(max_len, PAD_ID as i32);
                row
            })
            .collect();

        let label_flat: Vec<i32> = batch.iter().map(|inst| inst.label as i32).collect();

        let token_ids = Tensor::<B, 1, Int>::from_ints(ids_flat.as_slice(), device)
            .reshape([batch.len(), max_len]);
        let labels = Tensor::<B, 1, Int>::from_ints(label_flat.as_slice(), device);

        Ok(EncodedBatch { token_ids, labels, lengths })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn corpus() -> Corpus {
        Corpus::new(vec![
            Instance::new(vec!["the".into(), "cat".into(), "sat".into()], 0),
            Instance::new(vec!["cat".into()], 1),
        ])
    }

    #[test]
    fn test_vocab_reserves_special_ids() {
        let vocab = Vocab::build(&corpus());
        assert_eq!(vocab.id("<pad>"), PAD_ID);
        assert_eq!(vocab.id("<unk>"), UNK_ID);
        assert_eq!(vocab.id("never-seen"), UNK_ID);
        // 2 specials + 3 distinct corpus tokens
        assert_eq!(vocab.len(), 5);
    }

    #[test]
    fn test_batch_padding_and_lengths() {
        let corpus = corpus();
        let encoder = CorpusEncoder::new(Vocab::build(&corpus));
        let device = Default::default();

        let batch = encoder
            .batch_to_tensors::<TestBackend>(&corpus.instances, &device)
            .unwrap();

        assert_eq!(batch.token_ids.dims(), [2, 3]);
        assert_eq!(batch.lengths, vec![3, 1]);

        let ids: Vec<i64> = batch.token_ids.into_data().to_vec().unwrap();
        // Second row is "cat" followed by two pads
        assert_eq!(ids[4], PAD_ID as i64);
        assert_eq!(ids[5], PAD_ID as i64);
    }

    #[test]
    fn test_batches_cover_corpus_in_order() {
        let corpus = corpus();
        let encoder = CorpusEncoder::new(Vocab::build(&corpus));
        let groups: Vec<_> = encoder.batches(&corpus, 1).collect();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0][0].label, 0);
        assert_eq!(groups[1][0].label, 1);
    }

    #[test]
    fn test_vocab_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let vocab = Vocab::build(&corpus());
        vocab.save(dir.path()).unwrap();
        let loaded = Vocab::load(dir.path()).unwrap();
        assert_eq!(loaded.len(), vocab.len());
        assert_eq!(loaded.id("cat"), vocab.id("cat"));
    }

    #[test]
    fn test_load_missing_vocab_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Vocab::load(dir.path()).is_err());
    }
}
