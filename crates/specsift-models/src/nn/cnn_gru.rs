//! Convolutional front end feeding a GRU over the pooled sequence.

use candle_core::{DType, Device, Tensor};
use candle_nn::{rnn, Conv1d, Linear, Module, VarBuilder, VarMap, RNN};

use crate::nn::blocks::{conv1d_layer, max_pool1d};
use crate::nn::model_interface::NeuralSpectrumModel;

const GRU_HIDDEN: usize = 32;

/// conv(1->32,k5) / pool2 / GRU(32) / global max over time / dense 32 /
/// dense 1.
pub struct CnnGruModel {
    varmap: VarMap,
    device: Device,
    conv1: Conv1d,
    gru: rnn::GRU,
    fc1: Linear,
    fc2: Linear,
}

impl CnnGruModel {
    pub fn new(device: Device) -> anyhow::Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let conv1 = conv1d_layer(1, 32, 5, 0, &vb, "conv1")?;
        let gru = rnn::gru(32, GRU_HIDDEN, rnn::GRUConfig::default(), vb.pp("gru"))?;
        let fc1 = candle_nn::linear(GRU_HIDDEN, 32, vb.pp("fc1"))?;
        let fc2 = candle_nn::linear(32, 1, vb.pp("fc2"))?;

        Ok(Self {
            varmap,
            device,
            conv1,
            gru,
            fc1,
            fc2,
        })
    }
}

/// Run the GRU across a `(batch, time, features)` tensor and take the
/// element-wise max of the hidden states over time.
pub(crate) fn gru_max_over_time(gru: &rnn::GRU, x: &Tensor) -> candle_core::Result<Tensor> {
    let states = gru.seq(x)?;
    let hidden: Vec<Tensor> = states.iter().map(|s| s.h().clone()).collect();
    Tensor::stack(&hidden, 1)?.max(1)
}

impl NeuralSpectrumModel for CnnGruModel {
    fn arch(&self) -> &'static str {
        "cnn_gru"
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
        // (batch, channel, time) -> (batch, time, channel) for the GRU.
        let x = x.transpose(1, 2)?.contiguous()?;
        let x = gru_max_over_time(&self.gru, &x)?;
        let x = self.fc1.forward(&x)?.relu()?;
        self.fc2.forward(&x)?.squeeze(1)
    }
}
