//! Device detection

use candle_core::{Device, utils};

/// Pick the best available device, or CPU when forced.
pub fn detect(cpu: bool) -> anyhow::Result<Device> {
    if cpu {
        return Ok(Device::Cpu);
    }

    if utils::cuda_is_available() {
        Ok(Device::new_cuda(0)?)
    } else if utils::metal_is_available() {
        Ok(Device::new_metal(0)?)
    } else {
        tracing::warn!("no accelerator available, running on CPU");
        Ok(Device::Cpu)
    }
}
