//! Neural spectrum models built on candle.

pub mod blocks;
pub mod cnn;
pub mod cnn_deep;
pub mod cnn_gru;
pub mod cnn_gru_embed;
pub mod model_interface;

use anyhow::Result;
use candle_core::Device;

/// Resolve a device string ("cpu" or "cuda") to a candle device, falling
/// back to CPU when CUDA is unavailable.
pub fn get_device(name: &str) -> Result<Device> {
    match name.to_lowercase().as_str() {
        "cuda" | "gpu" => match Device::new_cuda(0) {
            Ok(device) => Ok(device),
            Err(e) => {
                log::warn!("CUDA unavailable ({e}); falling back to CPU");
                Ok(Device::Cpu)
            }
        },
        _ => Ok(Device::Cpu),
    }
}
