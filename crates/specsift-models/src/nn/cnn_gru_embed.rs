//! The CNN+GRU architecture with a named low-dimensional embedding layer
//! ahead of the output head, so the learned features can be reused for
//! transfer experiments.

use candle_core::{DType, Device, Tensor};
use candle_nn::{rnn, Conv1d, Linear, Module, VarBuilder, VarMap};

use crate::nn::blocks::{conv1d_layer, max_pool1d};
use crate::nn::cnn_gru::gru_max_over_time;
use crate::nn::model_interface::NeuralSpectrumModel;

const GRU_HIDDEN: usize = 32;
/// Width of the reusable feature layer.
pub const EMBED_DIM: usize = 16;

pub struct CnnGruEmbedModel {
    varmap: VarMap,
    device: Device,
    conv1: Conv1d,
    gru: rnn::GRU,
    fc1: Linear,
    embed: Linear,
    out: Linear,
}

impl CnnGruEmbedModel {
    pub fn new(device: Device) -> anyhow::Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let conv1 = conv1d_layer(1, 32, 5, 0, &vb, "conv1")?;
        let gru = rnn::gru(32, GRU_HIDDEN, rnn::GRUConfig::default(), vb.pp("gru"))?;
        let fc1 = candle_nn::linear(GRU_HIDDEN, 32, vb.pp("fc1"))?;
        let embed = candle_nn::linear(32, EMBED_DIM, vb.pp("feature"))?;
        let out = candle_nn::linear(EMBED_DIM, 1, vb.pp("out"))?;

        Ok(Self {
            varmap,
            device,
            conv1,
            gru,
            fc1,
            embed,
            out,
        })
    }

    /// The 16-dimensional feature vector per spectrum, for transfer use.
    pub fn embed(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        self.features(xs)
    }

    fn features(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let x = self.conv1.forward(xs)?.relu()?;
        let x = max_pool1d(&x, 2)?;
        let x = x.transpose(1, 2)?.contiguous()?;
        let x = gru_max_over_time(&self.gru, &x)?;
        let x = self.fc1.forward(&x)?.relu()?;
        self.embed.forward(&x)?.relu()
    }
}

impl NeuralSpectrumModel for CnnGruEmbedModel {
    fn arch(&self) -> &'static str {
        "cnn_gru_embed"
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn varmap(&mut self) -> &mut VarMap {
        &mut self.varmap
    }

    fn forward(&self, xs: &Tensor, _training: bool) -> candle_core::Result<Tensor> {
        let x = self.features(xs)?;
        self.out.forward(&x)?.squeeze(1)
    }
}
