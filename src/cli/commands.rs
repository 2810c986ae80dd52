// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands — `train`, `evaluate`, `explain` —
// and all their configurable flags. clap's derive macros generate
// help text, missing-argument errors, and type conversion.

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::TrainConfig;
use crate::explain::gradients::AttributionMethod;

/// The top-level subcommands available to the user.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the GRU classifier on a labelled corpus
    Train(TrainArgs),

    /// Measure label accuracy of a trained checkpoint on a corpus
    Evaluate(EvaluateArgs),

    /// Compute gradient-based word importance and score it against
    /// rationale annotations
    Explain(ExplainArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Path to the training corpus (JSON array of instances)
    #[arg(long, default_value = "data/train.json")]
    pub corpus: String,

    /// Directory for checkpoints, vocabulary, and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Number of sequences processed together in one forward pass
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Number of stacked GRU layers
    #[arg(long, default_value_t = 2)]
    pub num_layers: usize,

    /// Dimension of each GRU hidden state
    #[arg(long, default_value_t = 100)]
    pub hidden_dim: usize,

    /// Dimension of the word embeddings
    #[arg(long, default_value_t = 100)]
    pub embedding_dim: usize,

    /// Dropout probability between stacked GRU layers
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            corpus_path:    a.corpus,
            checkpoint_dir: a.checkpoint_dir,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            num_layers:     a.num_layers,
            hidden_dim:     a.hidden_dim,
            embedding_dim:  a.embedding_dim,
            dropout:        a.dropout,
        }
    }
}

/// All arguments for the `evaluate` command.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Path to the corpus to evaluate on
    #[arg(long, default_value = "data/test.json")]
    pub corpus: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

/// All arguments for the `explain` command.
#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Path to the corpus to explain (must carry rationale annotations)
    #[arg(long, default_value = "data/test.json")]
    pub corpus: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Attribution strategy
    #[arg(long, value_enum, default_value = "mod-dot")]
    pub method: MethodArg,

    /// How many top-attributed tokens to compare against the rationale
    #[arg(long, default_value_t = 15)]
    pub top_k: usize,

    /// Optional directory to dump raw importance scores as JSON
    #[arg(long)]
    pub scores_dir: Option<String>,
}

/// CLI-facing attribution method names; mapped onto the closed
/// `AttributionMethod` enum so the rest of the system never sees
/// a string-keyed method.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum MethodArg {
    /// Gradient · embedding dot product
    ModDot,
    /// L2 norm of the gradient
    GradNorm,
}

impl From<MethodArg> for AttributionMethod {
    fn from(m: MethodArg) -> Self {
        match m {
            MethodArg::ModDot   => AttributionMethod::ModDot,
            MethodArg::GradNorm => AttributionMethod::GradNorm,
        }
    }
}
