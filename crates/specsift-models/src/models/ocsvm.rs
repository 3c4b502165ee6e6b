//! One-class SVM anomaly detector.
//!
//! Fit only on examples of the "normal" class; at prediction time,
//! inliers are flagged as normal and everything else as anomalous.

use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use linfa::dataset::Pr;
use linfa::prelude::*;
use linfa::Dataset;
use linfa_svm::Svm;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneClassSvmParams {
    /// Upper bound on the training-outlier fraction.
    pub nu: f64,
    /// Gaussian kernel width.
    pub kernel_eps: f64,
}

impl Default for OneClassSvmParams {
    fn default() -> Self {
        OneClassSvmParams {
            nu: 0.1,
            kernel_eps: 100.0,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct OneClassSvm {
    params: OneClassSvmParams,
    model: Option<Svm<f64, bool>>,
}

impl OneClassSvm {
    pub fn new(params: OneClassSvmParams) -> Self {
        OneClassSvm {
            params,
            model: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Fit on normal-class rows only.
    pub fn fit(&mut self, x_normal: &Array2<f64>) -> Result<()> {
        anyhow::ensure!(
            x_normal.nrows() > 0,
            "one-class SVM needs at least one normal example"
        );

        let n = x_normal.nrows();
        let train = Dataset::new(x_normal.clone(), Array1::from_elem(n, ()));
        let model = Svm::<f64, Pr>::params()
            .nu_weight(self.params.nu)
            .gaussian_kernel(self.params.kernel_eps)
            .fit(&train)
            .map_err(|e| anyhow!("fitting one-class SVM: {e}"))?;

        log::debug!("one-class SVM fit on {} normal rows", n);
        self.model = Some(model);
        Ok(())
    }

    /// True for inliers (predicted normal), false for outliers.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<bool>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| anyhow!("one-class SVM predict called before fit"))?;
        let pred = model.predict(x);
        Ok(pred.to_vec())
    }

    /// Persist the fitted model as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer(file, self).context("serializing one-class SVM")?;
        Ok(())
    }
}
