//! Compact 1-D CNN for normal/anomalous spectrum classification.

use candle_core::{DType, Device, Tensor};
use candle_nn::{Conv1d, Linear, Module, VarBuilder, VarMap};

use crate::nn::blocks::{conv1d_layer, global_max_pool1d, max_pool1d};
use crate::nn::model_interface::NeuralSpectrumModel;

/// conv(1->32,k5) / pool2 / conv(32->64,k5) / global max / dense 32 / dense 1.
pub struct CnnModel {
    varmap: VarMap,
    device: Device,
    conv1: Conv1d,
    conv2: Conv1d,
    fc1: Linear,
    fc2: Linear,
}

impl CnnModel {
    pub fn new(device: Device) -> anyhow::Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let conv1 = conv1d_layer(1, 32, 5, 0, &vb, "conv1")?;
        let conv2 = conv1d_layer(32, 64, 5, 0, &vb, "conv2")?;
        let fc1 = candle_nn::linear(64, 32, vb.pp("fc1"))?;
        let fc2 = candle_nn::linear(32, 1, vb.pp("fc2"))?;

        Ok(Self {
            varmap,
            device,
            conv1,
            conv2,
            fc1,
            fc2,
        })
    }
}

impl NeuralSpectrumModel for CnnModel {
    fn arch(&self) -> &'static str {
        "cnn"
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn varmap(&mut self) -> &mut VarMap {
        &mut self.varmap
    }

    fn forward(&self, xs: &Tensor, _training: bool) -> candle_core::Result<Tensor> {
        let x = self.conv1.forward(xs)?.relu()?;
        let x = max_pool1d(&x, 2)?;
        let x = self.conv2.forward(&x)?.relu()?;
        let x = global_max_pool1d(&x)?;
        let x = self.fc1.forward(&x)?.relu()?;
        self.fc2.forward(&x)?.squeeze(1)
    }
}
