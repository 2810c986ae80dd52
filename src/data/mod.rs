// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw corpus file to padded tensor batches:
//
//   corpus.json
//       │
//       ▼
//   JsonCorpusLoader  → reads and validates instances
//       │
//       ▼
//   split_train_val   → shuffles, holds out a validation set
//       │
//       ▼
//   Vocab             → maps tokens to ids (<pad>=0, <unk>=1)
//       │
//       ▼
//   CorpusEncoder     → pads each batch, yields ids + labels + lengths
//
// Each module is responsible for exactly one step.

/// Labelled corpus container and JSON loader
pub mod corpus;

/// Vocabulary and padded batch-to-tensor conversion
pub mod encoder;

/// Shuffles and splits the corpus into train/validation sets
pub mod splitter;
