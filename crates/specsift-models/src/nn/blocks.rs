//! Shared layers for the 1-D spectrum architectures.

use candle_core::{Result, Tensor, D};
use candle_nn::{Conv1d, Conv1dConfig, VarBuilder};

/// A 1-D convolution with the given padding; weights come from (or are
/// created in) the supplied var store under `name`.
pub fn conv1d_layer(
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    padding: usize,
    vb: &VarBuilder,
    name: &str,
) -> Result<Conv1d> {
    candle_nn::conv1d(
        in_channels,
        out_channels,
        kernel_size,
        Conv1dConfig {
            padding,
            ..Default::default()
        },
        vb.pp(name),
    )
}

/// Max pooling over the last (sample) axis of a `(batch, channel, len)`
/// tensor, implemented through the 2-D pooling kernel.
pub fn max_pool1d(x: &Tensor, window: usize) -> Result<Tensor> {
    x.unsqueeze(2)?.max_pool2d((1, window))?.squeeze(2)
}

/// Global max over the last axis: `(batch, channel, len)` -> `(batch, channel)`.
pub fn global_max_pool1d(x: &Tensor) -> Result<Tensor> {
    x.max(D::Minus1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn max_pool1d_halves_length() -> Result<()> {
        let x = Tensor::from_vec(
            vec![1f32, 3.0, 2.0, 8.0, 5.0, 4.0],
            (1, 1, 6),
            &Device::Cpu,
        )?;
        let pooled = max_pool1d(&x, 2)?;
        assert_eq!(pooled.dims(), &[1, 1, 3]);
        assert_eq!(pooled.flatten_all()?.to_vec1::<f32>()?, vec![3.0, 8.0, 5.0]);
        Ok(())
    }

    #[test]
    fn global_max_pool_reduces_to_channels() -> Result<()> {
        let x = Tensor::from_vec(
            vec![1f32, 9.0, 2.0, 4.0, 6.0, 5.0],
            (1, 2, 3),
            &Device::Cpu,
        )?;
        let pooled = global_max_pool1d(&x)?;
        assert_eq!(pooled.dims(), &[1, 2]);
        assert_eq!(pooled.flatten_all()?.to_vec1::<f32>()?, vec![9.0, 6.0]);
        Ok(())
    }
}
