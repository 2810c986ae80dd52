// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits that define the core concepts of
// the system. No Burn types, no file I/O, no ML code here —
// this layer says what things ARE, not how they work.

// A labelled, optionally rationale-annotated token sequence
pub mod instance;

// Core abstractions (traits) that other layers implement
pub mod traits;
