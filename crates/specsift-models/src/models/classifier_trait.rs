use anyhow::Result;
use ndarray::Array2;

/// Contract for the classical (non-neural) classifiers trained by the
/// pipeline. Centralized here so implementations can live next to model
/// code.
pub trait SpectrumClassifier {
    /// Fit the model on row-major features and class indices.
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<()>;

    /// Predict a class index per row.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>>;

    /// Human readable model name.
    fn name(&self) -> &'static str {
        "classifier"
    }
}
