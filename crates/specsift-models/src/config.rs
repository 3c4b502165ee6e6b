//! Training run configuration.

use serde::{Deserialize, Serialize};

use crate::dataset::DEFAULT_MAX_FILES_PER_LABEL;

/// Architectures trained by default, in run order.
pub const ALL_ARCHS: [&str; 6] = [
    "cnn_deep",
    "forest",
    "ocsvm",
    "cnn",
    "cnn_gru",
    "cnn_gru_embed",
];

/// Central configuration for a training run. Loaded from a JSON file with
/// CLI-flag overrides applied afterwards; with no file, the defaults are
/// used and printed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Directory of per-label CSV subdirectories.
    pub data_dir: String,
    /// Root for model weights, reports, and plots.
    pub out_dir: String,
    /// Architectures to train; see [`ALL_ARCHS`].
    pub models: Vec<String>,
    pub max_files_per_label: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub test_fraction: f64,
    pub seed: u64,
    /// "cpu" or "cuda".
    pub device: String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            data_dir: String::from("derived/spc_csv"),
            out_dir: String::from("derived"),
            models: ALL_ARCHS.iter().map(|s| s.to_string()).collect(),
            max_files_per_label: DEFAULT_MAX_FILES_PER_LABEL,
            epochs: 10,
            batch_size: 16,
            learning_rate: 1e-3,
            test_fraction: 0.2,
            seed: 42,
            device: String::from("cpu"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_json() {
        let cfg = TrainConfig::default();
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.models.len(), ALL_ARCHS.len());
        assert_eq!(back.epochs, 10);
        assert_eq!(back.batch_size, 16);
        assert_eq!(back.seed, 42);
    }
}
