//! Common training and inference loop for the candle-based models.
//!
//! Each architecture provides its forward pass and var store; fitting,
//! prediction, and safetensors persistence are shared here. All models
//! output one logit per spectrum; training minimizes binary cross-entropy
//! against the normal/anomalous target with AdamW.

use std::path::Path;

use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::{Optimizer, VarMap};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Hyper-parameters for [`NeuralSpectrumModel::fit`].
#[derive(Debug, Clone)]
pub struct FitParams {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub seed: u64,
}

impl Default for FitParams {
    fn default() -> Self {
        FitParams {
            epochs: 10,
            batch_size: 16,
            learning_rate: 1e-3,
            seed: 42,
        }
    }
}

pub trait NeuralSpectrumModel {
    /// Short architecture name used for artifact and report file names.
    fn arch(&self) -> &'static str;

    fn device(&self) -> &Device;

    fn varmap(&mut self) -> &mut VarMap;

    /// Forward pass over a `(batch, 1, width)` tensor, producing one
    /// logit per row.
    fn forward(&self, xs: &Tensor, training: bool) -> candle_core::Result<Tensor>;

    /// Train with AdamW and binary cross-entropy on 0/1 targets.
    /// Returns the average batch loss per epoch.
    fn fit(&mut self, x: &Array2<f32>, y: &[f32], params: &FitParams) -> Result<Vec<f32>> {
        anyhow::ensure!(x.nrows() == y.len(), "feature and label counts differ");
        anyhow::ensure!(x.nrows() > 0, "cannot train on an empty matrix");

        let device = self.device().clone();
        let opt_params = candle_nn::ParamsAdamW {
            lr: params.learning_rate,
            ..Default::default()
        };
        let vars = self.varmap().all_vars();
        let mut opt = candle_nn::AdamW::new(vars, opt_params)?;

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut order: Vec<usize> = (0..x.nrows()).collect();
        let mut epoch_losses = Vec::with_capacity(params.epochs);

        for epoch in 0..params.epochs {
            order.shuffle(&mut rng);
            let mut total_loss = 0f32;
            let mut batches = 0usize;

            for chunk in order.chunks(params.batch_size.max(1)) {
                let input = rows_to_tensor(x, chunk, &device)?;
                let targets: Vec<f32> = chunk.iter().map(|&i| y[i]).collect();
                let target = Tensor::from_vec(targets, chunk.len(), &device)?;

                let logits = self.forward(&input, true)?;
                let loss = candle_nn::loss::binary_cross_entropy_with_logit(&logits, &target)?;
                opt.backward_step(&loss)?;

                total_loss += loss.to_vec0::<f32>()?;
                batches += 1;
            }

            let avg_loss = total_loss / batches.max(1) as f32;
            log::info!(
                "[{}] epoch {}: avg batch loss {:.6}",
                self.arch(),
                epoch,
                avg_loss
            );
            epoch_losses.push(avg_loss);
        }

        Ok(epoch_losses)
    }

    /// Probability of the positive ("normal") class per row.
    fn predict_proba(&self, x: &Array2<f32>, batch_size: usize) -> Result<Vec<f32>> {
        let device = self.device().clone();
        let indices: Vec<usize> = (0..x.nrows()).collect();
        let mut probs = Vec::with_capacity(x.nrows());

        for chunk in indices.chunks(batch_size.max(1)) {
            let input = rows_to_tensor(x, chunk, &device)?;
            let logits = self.forward(&input, false)?;
            let p = candle_nn::ops::sigmoid(&logits)?;
            probs.extend(p.to_vec1::<f32>()?);
        }
        Ok(probs)
    }

    /// Hard 0/1 predictions at the 0.5 threshold.
    fn predict(&self, x: &Array2<f32>, batch_size: usize) -> Result<Vec<usize>> {
        Ok(self
            .predict_proba(x, batch_size)?
            .into_iter()
            .map(|p| usize::from(p > 0.5))
            .collect())
    }

    /// Save model weights in safetensors format.
    fn save(&mut self, path: &Path) -> Result<()> {
        log::info!("saving {} weights to {}", self.arch(), path.display());
        self.varmap().save(path)?;
        Ok(())
    }
}

/// Gather rows of `x` into a `(batch, 1, width)` tensor.
pub fn rows_to_tensor(
    x: &Array2<f32>,
    rows: &[usize],
    device: &Device,
) -> candle_core::Result<Tensor> {
    let width = x.ncols();
    let mut data = Vec::with_capacity(rows.len() * width);
    for &row in rows {
        data.extend(x.row(row).iter().copied());
    }
    Tensor::from_vec(data, (rows.len(), 1, width), device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn rows_to_tensor_gathers_in_order() -> candle_core::Result<()> {
        let x = Array2::from_shape_vec(
            (3, 2),
            vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0],
        )
        .unwrap();
        let t = rows_to_tensor(&x, &[2, 0], &Device::Cpu)?;
        assert_eq!(t.dims(), &[2, 1, 2]);
        assert_eq!(t.flatten_all()?.to_vec1::<f32>()?, vec![5.0, 6.0, 1.0, 2.0]);
        Ok(())
    }
}
