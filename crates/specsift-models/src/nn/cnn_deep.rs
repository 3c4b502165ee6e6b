//! Deeper 1-D CNN; the widest of the convolutional architectures.

use candle_core::{DType, Device, Tensor};
use candle_nn::{Conv1d, Linear, Module, VarBuilder, VarMap};

use crate::nn::blocks::{conv1d_layer, global_max_pool1d, max_pool1d};
use crate::nn::model_interface::NeuralSpectrumModel;

/// conv(1->64,k7) / pool2 / conv(64->128,k5) / pool2 / conv(128->256,k3)
/// / global max / dense 128 / dense 1. Convolutions are padded so the
/// sample axis shrinks only through pooling.
pub struct DeepCnnModel {
    varmap: VarMap,
    device: Device,
    conv1: Conv1d,
    conv2: Conv1d,
    conv3: Conv1d,
    fc1: Linear,
    fc2: Linear,
}

impl DeepCnnModel {
    pub fn new(device: Device) -> anyhow::Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let conv1 = conv1d_layer(1, 64, 7, 3, &vb, "conv1")?;
        let conv2 = conv1d_layer(64, 128, 5, 2, &vb, "conv2")?;
        let conv3 = conv1d_layer(128, 256, 3, 1, &vb, "conv3")?;
        let fc1 = candle_nn::linear(256, 128, vb.pp("fc1"))?;
        let fc2 = candle_nn::linear(128, 1, vb.pp("fc2"))?;

        Ok(Self {
            varmap,
            device,
            conv1,
            conv2,
            conv3,
            fc1,
            fc2,
        })
    }
}

impl NeuralSpectrumModel for DeepCnnModel {
    fn arch(&self) -> &'static str {
        "cnn_deep"
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
        let x = max_pool1d(&x, 2)?;
        let x = self.conv3.forward(&x)?.relu()?;
        let x = global_max_pool1d(&x)?;
        let x = self.fc1.forward(&x)?.relu()?;
        self.fc2.forward(&x)?.squeeze(1)
    }
}
