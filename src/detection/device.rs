use std::fmt;

use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProvider, ExecutionProviderDispatch,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device {0} requested but not available")]
    Unavailable(Device),
}

/// Configured device choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    #[default]
    Auto,
    Cpu,
    Cuda,
}

/// Device the model session actually runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda => f.write_str("cuda"),
        }
    }
}

impl Device {
    pub fn execution_providers(self) -> Vec<ExecutionProviderDispatch> {
        match self {
            Device::Cuda => vec![CUDAExecutionProvider::default().build().error_on_failure()],
            Device::Cpu => vec![CPUExecutionProvider::default().build()],
        }
    }
}

pub trait AcceleratorProbe {
    fn cuda_available(&self) -> bool;
}

/// Asks the ONNX Runtime build whether its CUDA provider can be used.
pub struct OrtProbe;

impl AcceleratorProbe for OrtProbe {
    fn cuda_available(&self) -> bool {
        match CUDAExecutionProvider::default().is_available() {
            Ok(available) => available,
            Err(e) => {
                tracing::debug!(error = %e, "cuda availability check failed");
                false
            }
        }
    }
}

impl DevicePreference {
    pub fn resolve(self, probe: &dyn AcceleratorProbe) -> Result<Device, DeviceError> {
        match self {
            DevicePreference::Cpu => Ok(Device::Cpu),
            DevicePreference::Cuda if probe.cuda_available() => Ok(Device::Cuda),
            DevicePreference::Cuda => Err(DeviceError::Unavailable(Device::Cuda)),
            DevicePreference::Auto if probe.cuda_available() => Ok(Device::Cuda),
            DevicePreference::Auto => Ok(Device::Cpu),
        }
    }
}
