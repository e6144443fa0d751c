//! # Strata Compute
//!
//! Generation backends and the session that drives them.
//!
//! This crate provides two backends:
//! - **CPU**: host memory, Rayon parallelism (reference output, no GPU needed)
//! - **GPU**: device memory via wgpu; history never leaves the device unless read back
//!
//! ## Backend Selection
//!
//! Set `STRATA_BACKEND` environment variable:
//! - `cpu` - Force CPU backend
//! - `gpu` - Force GPU backend
//! - `auto` (default) - GPU when an adapter exists, CPU otherwise

pub mod backend;
pub mod session;
pub mod shaders;

pub use backend::{CpuBackend, GpuBackend};
pub use session::{DynSession, Session};

use strata_core::config::{BackendKind, StrataConfig};
use strata_core::error::StrataResult;
use strata_core::traits::GenerationBackend;

/// Create the appropriate generation backend based on configuration
pub fn create_backend(config: &StrataConfig) -> StrataResult<Box<dyn GenerationBackend>> {
    config.validate()?;
    match config.compute.backend {
        BackendKind::Auto => {
            if !gpu_available() {
                tracing::info!("Using CPU backend (Rayon), no GPU adapter");
                return Ok(Box::new(CpuBackend::new(config)?));
            }
            match GpuBackend::new(config) {
                Ok(gpu) => {
                    tracing::info!("Using GPU backend (wgpu)");
                    Ok(Box::new(gpu))
                }
                Err(e) => {
                    tracing::warn!("GPU not available ({}), falling back to CPU", e);
                    Ok(Box::new(CpuBackend::new(config)?))
                }
            }
        }
        BackendKind::Cpu => {
            tracing::info!("Using CPU backend (Rayon)");
            Ok(Box::new(CpuBackend::new(config)?))
        }
        BackendKind::Gpu => {
            tracing::info!("Using GPU backend (wgpu)");
            Ok(Box::new(GpuBackend::new(config)?))
        }
    }
}

/// Allocate a backend and start a run at generation 0
pub fn open_session(config: &StrataConfig) -> StrataResult<DynSession> {
    let backend = create_backend(config)?;
    Session::new(backend, config)
}

/// Check if GPU is available on this system
pub fn gpu_available() -> bool {
    if std::env::var("STRATA_FORCE_CPU").is_ok() {
        return false;
    }

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapters = pollster::block_on(instance.enumerate_adapters(wgpu::Backends::all()));
    !adapters.is_empty()
}

/// Get information about available compute devices
pub fn device_info() -> Vec<DeviceInfo> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapters = pollster::block_on(instance.enumerate_adapters(wgpu::Backends::all()));

    adapters
        .into_iter()
        .map(|adapter| {
            let info = adapter.get_info();
            let limits = adapter.limits();
            DeviceInfo {
                name: info.name,
                vendor: info.vendor.to_string(),
                device_type: format!("{:?}", info.device_type),
                backend: format!("{:?}", info.backend),
                max_buffer_size: limits.max_buffer_size,
            }
        })
        .collect()
}

/// Information about a compute device
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub vendor: String,
    pub device_type: String,
    pub backend: String,
    /// Largest single buffer, which bounds `width * height * history_depth`
    pub max_buffer_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_backend_selected_explicitly() {
        let mut config = StrataConfig::with_grid(8, 8, 2);
        config.compute.backend = BackendKind::Cpu;
        let backend = create_backend(&config).unwrap();
        assert_eq!(backend.name(), "CPU (Rayon)");
    }

    #[test]
    fn test_auto_always_yields_a_backend() {
        let config = StrataConfig::with_grid(8, 8, 2);
        let mut session = open_session(&config).unwrap();
        session.seed_random(0.5, 1).unwrap();
        session.step().unwrap();
        assert_eq!(session.export_all().unwrap().len(), 128);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = StrataConfig::with_grid(0, 8, 2);
        assert!(create_backend(&config).is_err());
    }
}
