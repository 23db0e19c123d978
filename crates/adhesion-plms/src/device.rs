use candle_core::utils::{cuda_is_available, metal_is_available};
use candle_core::{Device, DeviceLocation};
use tracing::{info, warn};

/// Pick the compute device: CUDA, then Metal, else CPU.
///
/// `cpu` forces the CPU. An accelerator that is compiled in but fails to
/// initialize falls back to the CPU with a warning.
pub fn select_device(cpu: bool) -> Device {
    if cpu {
        return Device::Cpu;
    }
    if cuda_is_available() {
        match Device::new_cuda(0) {
            Ok(device) => {
                info!("Using CUDA device 0");
                return device;
            }
            Err(e) => warn!("CUDA available but device 0 failed to start: {}", e),
        }
    } else if metal_is_available() {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Using Metal device 0");
                return device;
            }
            Err(e) => warn!("Metal available but device 0 failed to start: {}", e),
        }
    } else {
        #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
        {
            info!("Running on CPU, to run on GPU(metal), build with `--features metal`");
        }
        #[cfg(not(all(target_os = "macos", target_arch = "aarch64")))]
        {
            info!("Running on CPU, to run on GPU, build with `--features cuda`");
        }
    }
    Device::Cpu
}

/// Total memory of the accelerator behind `device`, in GB.
///
/// CUDA devices are queried through NVML when built with the `cuda` feature.
/// The CPU, Metal and failed queries give `None`.
pub fn accelerator_memory_gb(device: &Device) -> Option<f64> {
    match device.location() {
        #[cfg(feature = "cuda")]
        DeviceLocation::Cuda { gpu_id } => cuda_memory_gb(gpu_id),
        _ => None,
    }
}

#[cfg(feature = "cuda")]
fn cuda_memory_gb(gpu_id: usize) -> Option<f64> {
    use nvml_wrapper::Nvml;
    const BYTES_PER_GB: f64 = (1u64 << 30) as f64;

    let nvml = match Nvml::init() {
        Ok(nvml) => nvml,
        Err(e) => {
            warn!("NVML unavailable, cannot read GPU memory: {}", e);
            return None;
        }
    };
    let index = u32::try_from(gpu_id).ok()?;
    match nvml
        .device_by_index(index)
        .and_then(|device| device.memory_info())
    {
        Ok(memory) => {
            let gb = memory.total as f64 / BYTES_PER_GB;
            info!("CUDA device {} has {:.1} GB of memory", gpu_id, gb);
            Some(gb)
        }
        Err(e) => {
            warn!("Failed to query memory of CUDA device {}: {}", gpu_id, e);
            None
        }
    }
}

/// Hashable identity of a [`Device`], used to key loaded models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKey {
    Cpu,
    Cuda(usize),
    Metal(usize),
}

impl From<&Device> for DeviceKey {
    fn from(device: &Device) -> Self {
        match device.location() {
            DeviceLocation::Cpu => DeviceKey::Cpu,
            DeviceLocation::Cuda { gpu_id } => DeviceKey::Cuda(gpu_id),
            DeviceLocation::Metal { gpu_id } => DeviceKey::Metal(gpu_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_cpu() {
        let device = select_device(true);
        assert!(device.is_cpu());
        assert_eq!(DeviceKey::from(&device), DeviceKey::Cpu);
        assert_eq!(accelerator_memory_gb(&device), None);
    }
}
