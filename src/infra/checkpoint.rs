// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Persists a trained classifier as one logical unit:
//
//   checkpoints/
//     gru_classifier.*   ← parameter snapshot (CompactRecorder)
//     model_config.json  ← constructor hyperparameters
//     vocab.json         ← written separately by the encoder
//
// The config is saved alongside the weights because loading must
// first rebuild a classifier with the exact saved hyperparameters
// before the parameters can be restored into it. A missing file
// is an error — loading never falls back to a fresh random model.
//
// Burn's CompactRecorder serialises parameters to MessagePack and
// refuses to load into a mismatched architecture.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use std::{fs, path::PathBuf};

use crate::ml::model::{GruClassifier, GruClassifierConfig};

/// Default base name of the saved model file (recorder adds the extension).
pub const MODEL_FILE: &str = "gru_classifier";

pub struct CheckpointManager {
    /// Directory where all checkpoint files are stored
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a manager for `dir`, creating the directory if absent.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Save the model's parameter snapshot.
    pub fn save_model<B: AutodiffBackend>(&self, model: &GruClassifier<B>) -> Result<()> {
        let path = self.dir.join(MODEL_FILE);
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;
        Ok(())
    }

    /// Restore parameters into a model built from the saved config.
    /// The model must match the saved architecture or loading fails.
    pub fn load_model<B: Backend>(
        &self,
        model:  GruClassifier<B>,
        device: &B::Device,
    ) -> Result<GruClassifier<B>> {
        let path = self.dir.join(MODEL_FILE);
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;
        Ok(model.load_record(record))
    }

    /// Save the model hyperparameters as JSON.
    /// Must happen before training so a crash mid-run still leaves a
    /// loadable config next to the latest weights.
    pub fn save_config(&self, cfg: &GruClassifierConfig) -> Result<()> {
        let path = self.dir.join("model_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write model config to '{}'", path.display()))?;
        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    /// Load the saved hyperparameters, needed to rebuild the exact
    /// architecture before restoring weights.
    pub fn load_config(&self) -> Result<GruClassifierConfig> {
        let path = self.dir.join("model_config.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read model config from '{}'. Have you run 'train' first?",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::Autodiff<burn::backend::NdArray>;

    fn config() -> GruClassifierConfig {
        GruClassifierConfig::new(1, 4, 10, 0, 3, 0.0, 2, 2)
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path());
        mgr.save_config(&config()).unwrap();

        let loaded = mgr.load_config().unwrap();
        assert_eq!(loaded.num_layers, 1);
        assert_eq!(loaded.hidden_dim, 4);
        assert_eq!(loaded.vocab_size, 10);
        assert_eq!(loaded.label_size, 2);
    }

    #[test]
    fn test_load_without_checkpoint_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path());
        assert!(mgr.load_config().is_err());

        let device = Default::default();
        let model = config().init::<TestBackend>(&device);
        assert!(mgr.load_model(model, &device).is_err());
    }

    #[test]
    fn test_checkpoint_roundtrip_reproduces_forward_output() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path());
        let device = Default::default();
        let cfg = config();

        let model = cfg.init::<TestBackend>(&device);
        mgr.save_config(&cfg).unwrap();
        mgr.save_model(&model).unwrap();

        let restored = mgr
            .load_model(mgr.load_config().unwrap().init::<TestBackend>(&device), &device)
            .unwrap();

        let input = Tensor::<TestBackend, 1, Int>::from_ints([1, 2, 3, 4], &device)
            .reshape([1, 4]);
        let before = model.forward(input.clone(), &[4], model.init_hidden(1, &device));
        let after = restored.forward(input, &[4], restored.init_hidden(1, &device));

        let a: Vec<f32> = before.log_probs.into_data().to_vec().unwrap();
        let b: Vec<f32> = after.log_probs.into_data().to_vec().unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-6, "outputs diverge after reload: {x} vs {y}");
        }
    }
}
