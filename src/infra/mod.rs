// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence concerns used by multiple layers:
//
//   checkpoint.rs — model hyperparameters + parameter snapshot,
//                   saved and restored as one unit
//
//   metrics.rs    — per-epoch training metrics CSV
//
//   files.rs      — generic JSON / line-list file I/O and the
//                   top-k score-map helper

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Generic JSON/list file I/O and top-k map selection
pub mod files;
