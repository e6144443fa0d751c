//! # GPU Backend
//!
//! Keeps both generation buffers resident in device memory and runs every
//! operation as a wgpu pass. The host only sees cell data on explicit
//! readback (`read_layer`, `composite`) or when it uploads a seed.
//!
//! ## Layout
//!
//! - **Cells**: two storage buffers (A, B), `depth` layers each, four cells
//!   packed per `u32` word
//! - **Step**: compute pass reading one buffer and writing the other; one
//!   bind group per direction, both built at startup
//! - **Brush**: compute pass doing read-modify-write on one layer
//! - **Composite**: full-screen triangle whose fragment stage reads the
//!   storage buffer directly, so any target size works

mod bind_groups;
mod buffers;
pub mod config;
mod dispatch;
mod pipelines;
mod readback;

use std::collections::HashMap;
use std::sync::Arc;

use strata_core::brush::BrushStamp;
use strata_core::config::StrataConfig;
use strata_core::error::{StrataError, StrataResult};
use strata_core::frame::Frame;
use strata_core::grid::{GridShape, Slot};
use strata_core::rule::RuleParams;
use strata_core::traits::{BackendStats, GenerationBackend};

use bind_groups::BindGroups;
use buffers::GpuBuffers;
use pipelines::{ComputePipelines, Layouts};

/// GPU generation backend using wgpu
pub struct GpuBackend {
    pub(crate) device: Arc<wgpu::Device>,
    pub(crate) queue: Arc<wgpu::Queue>,
    pub(crate) shape: GridShape,
    pub(crate) stats: BackendStats,

    /// Invocations per workgroup and workgroups per layer pass
    pub(crate) workgroup_size: u32,
    pub(crate) workgroups: u32,

    /// Largest staging buffer a readback may create (bytes)
    pub(crate) staging_limit: u64,
    /// Largest composite tile edge (pixels)
    pub(crate) tile_limit: u32,

    pub(crate) buffers: GpuBuffers,
    pub(crate) layouts: Layouts,
    pub(crate) pipelines: ComputePipelines,
    pub(crate) bind_groups: BindGroups,

    /// Composite pipelines, one per target format seen so far
    pub(crate) composite_pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
}

impl GpuBackend {
    /// Create a new GPU backend with both buffers zero-initialized
    pub fn new(config: &StrataConfig) -> StrataResult<Self> {
        let shape = config.shape()?;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| StrataError::gpu(format!("No suitable GPU adapter found: {}", e)))?;

        let info = adapter.get_info();
        tracing::info!(
            "🎮 GPU: {} ({:?}, {:?})",
            info.name,
            info.device_type,
            info.backend
        );

        let adapter_limits = adapter.limits();
        let buffer_bytes = shape.buffer_bytes() as u64;
        if buffer_bytes > adapter_limits.max_storage_buffer_binding_size as u64
            || buffer_bytes > adapter_limits.max_buffer_size
        {
            return Err(StrataError::gpu(format!(
                "generation buffer of {} MB exceeds device limits",
                buffer_bytes / 1024 / 1024
            )));
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Strata GPU"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits {
                max_storage_buffer_binding_size: adapter_limits.max_storage_buffer_binding_size,
                max_buffer_size: adapter_limits.max_buffer_size,
                ..Default::default()
            },
            memory_hints: wgpu::MemoryHints::Performance,
            trace: Default::default(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
        }))
        .map_err(|e| StrataError::gpu(format!("Failed to create device: {}", e)))?;

        let limits = device.limits();
        let workgroup_size = config.compute.workgroup_size;
        if workgroup_size > limits.max_compute_workgroup_size_x
            || workgroup_size > limits.max_compute_invocations_per_workgroup
        {
            return Err(StrataError::gpu(format!(
                "workgroup size {} exceeds device limit {}",
                workgroup_size, limits.max_compute_workgroup_size_x
            )));
        }
        let workgroups = (shape.layer_words() as u32).div_ceil(workgroup_size);
        if workgroups > limits.max_compute_workgroups_per_dimension {
            return Err(StrataError::gpu(format!(
                "{}x{} grid needs {} workgroups, device allows {}",
                shape.width, shape.height, workgroups, limits.max_compute_workgroups_per_dimension
            )));
        }

        tracing::info!(
            "🎮 GPU: Allocating 2 x {} KB VRAM for {}x{} cells, {} layers per buffer",
            buffer_bytes / 1024,
            shape.width,
            shape.height,
            shape.depth
        );

        let buffers = GpuBuffers::new(&device, &shape);
        let layouts = Layouts::new(&device);
        let pipelines = ComputePipelines::new(&device, &layouts, workgroup_size);
        let bind_groups = BindGroups::new(&device, &layouts, &buffers);

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            shape,
            stats: BackendStats {
                buffer_bytes: 2 * buffer_bytes,
                ..Default::default()
            },
            workgroup_size,
            workgroups,
            staging_limit: limits.max_buffer_size,
            tile_limit: limits.max_texture_dimension_2d,
            buffers,
            layouts,
            pipelines,
            bind_groups,
            composite_pipelines: HashMap::new(),
        })
    }

    /// Device handle, for front ends that own a surface
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }
}

impl GenerationBackend for GpuBackend {
    fn shape(&self) -> GridShape {
        self.shape
    }

    fn write_layer(&mut self, slot: Slot, cells: &[u8]) -> StrataResult<()> {
        self.shape.check_slot(slot)?;
        if cells.len() != self.shape.cells_per_layer() {
            return Err(StrataError::config(format!(
                "layer needs {} cells, got {}",
                self.shape.cells_per_layer(),
                cells.len()
            )));
        }
        self.upload_layer(slot, cells);
        Ok(())
    }

    fn stamp(&mut self, slot: Slot, stamp: &BrushStamp) -> StrataResult<()> {
        self.shape.check_slot(slot)?;
        self.dispatch_stamp(slot, stamp);
        self.stats.stamps_applied += 1;
        Ok(())
    }

    fn step(&mut self, from: Slot, to: Slot, rule: &RuleParams) -> StrataResult<()> {
        self.shape.check_slot(from)?;
        self.shape.check_slot(to)?;
        if from.buffer == to.buffer {
            return Err(StrataError::config("step must read and write different buffers"));
        }

        let start = std::time::Instant::now();
        self.dispatch_step(from, to, rule);
        self.stats.generations_computed += 1;
        // Submission time only; the pass completes asynchronously
        self.stats.last_step_us = start.elapsed().as_micros() as u64;
        Ok(())
    }

    fn read_layer(&mut self, slot: Slot) -> StrataResult<Vec<u8>> {
        self.read_slots(&[slot])
    }

    fn read_layers(&mut self, slots: &[Slot]) -> StrataResult<Vec<u8>> {
        self.read_slots(slots)
    }

    fn composite(&mut self, slot: Slot, frame: &mut Frame) -> StrataResult<()> {
        self.shape.check_slot(slot)?;
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(());
        }
        self.composite_offscreen(slot, frame)
    }

    fn stats(&self) -> BackendStats {
        self.stats.clone()
    }

    fn sync(&mut self) -> StrataResult<()> {
        let _ = self.device.poll(wgpu::PollType::Wait {
            submission_index: None, // Wait for most recent submission
            timeout: None,          // Wait indefinitely
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "GPU (wgpu)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use strata_core::cell::ALIVE;
    use strata_core::grid::BufferId;

    fn gpu_or_skip(config: &StrataConfig) -> Option<GpuBackend> {
        match GpuBackend::new(config) {
            Ok(gpu) => Some(gpu),
            Err(e) => {
                println!("GPU not available: {:?}", e);
                None
            }
        }
    }

    fn slot(buffer: BufferId, layer: u32) -> Slot {
        Slot { buffer, layer }
    }

    #[test]
    fn test_gpu_backend_creation() {
        let config = StrataConfig::with_grid(16, 16, 4);
        if let Some(mut gpu) = gpu_or_skip(&config) {
            assert_eq!(gpu.shape().depth, 4);
            let layer = gpu.read_layer(slot(BufferId::B, 3)).unwrap();
            assert_eq!(layer, vec![0; 256]);
        }
    }

    #[test]
    fn test_write_then_read_unaligned_layer() {
        // 5x5 leaves three padding bytes per layer
        let config = StrataConfig::with_grid(5, 5, 3);
        if let Some(mut gpu) = gpu_or_skip(&config) {
            let cells: Vec<u8> = (0..25).map(|i| i as u8 * 10).collect();
            gpu.write_layer(slot(BufferId::A, 1), &cells).unwrap();
            assert_eq!(gpu.read_layer(slot(BufferId::A, 1)).unwrap(), cells);
            assert_eq!(gpu.read_layer(slot(BufferId::A, 0)).unwrap(), vec![0; 25]);
            assert_eq!(gpu.read_layer(slot(BufferId::A, 2)).unwrap(), vec![0; 25]);
        }
    }

    #[test]
    fn test_matches_cpu_backend() {
        let mut config = StrataConfig::with_grid(23, 17, 3);
        let Some(mut gpu) = gpu_or_skip(&config) else {
            return;
        };
        let mut cpu = CpuBackend::new(&config).unwrap();

        let stamps = [
            BrushStamp { center_x: 4, center_y: 5, radius: 2.5 },
            BrushStamp { center_x: 20, center_y: 1, radius: 3.0 },
            BrushStamp { center_x: 11, center_y: 16, radius: 1.0 },
        ];
        for stamp in &stamps {
            gpu.stamp(slot(BufferId::A, 0), stamp).unwrap();
            cpu.stamp(slot(BufferId::A, 0), stamp).unwrap();
        }

        for edge_mode in [strata_core::rule::EdgeMode::Clamp, strata_core::rule::EdgeMode::Wrap] {
            config.grid.edge_mode = edge_mode;
            let rule = config.rule();
            let shape = gpu.shape();
            for g in 0..shape.last_generation() {
                let from = shape.address_of(g).unwrap();
                let to = shape.address_of(g + 1).unwrap();
                gpu.step(from, to, &rule).unwrap();
                cpu.step(from, to, &rule).unwrap();
                assert_eq!(
                    gpu.read_layer(to).unwrap(),
                    cpu.read_layer(to).unwrap(),
                    "generation {} ({:?})",
                    g + 1,
                    edge_mode
                );
            }
        }
    }

    /// CPU and GPU backends holding the same 8x8 layer in A[0]
    fn paired_8x8() -> Option<(GpuBackend, CpuBackend)> {
        let config = StrataConfig::with_grid(8, 8, 2);
        let mut gpu = gpu_or_skip(&config)?;
        let mut cpu = CpuBackend::new(&config).unwrap();
        let cells: Vec<u8> = (0..64).map(|i| if i % 3 == 0 { ALIVE } else { 0 }).collect();
        gpu.write_layer(slot(BufferId::A, 0), &cells).unwrap();
        cpu.write_layer(slot(BufferId::A, 0), &cells).unwrap();
        Some((gpu, cpu))
    }

    #[test]
    fn test_composite_wider_than_texture_limit() {
        let Some((mut gpu, mut cpu)) = paired_8x8() else {
            return;
        };
        // Multiples of the grid size keep samples off cell boundaries
        let width = gpu.device().limits().max_texture_dimension_2d + 808;
        let mut from_gpu = Frame::new(width, 16);
        let mut from_cpu = Frame::new(width, 16);
        gpu.composite(slot(BufferId::A, 0), &mut from_gpu).unwrap();
        cpu.composite(slot(BufferId::A, 0), &mut from_cpu).unwrap();
        assert_eq!(from_gpu, from_cpu);
    }

    #[test]
    fn test_composite_in_small_tiles() {
        let Some((mut gpu, mut cpu)) = paired_8x8() else {
            return;
        };
        gpu.tile_limit = 5;
        for (w, h) in [(8, 8), (16, 24), (40, 8)] {
            let mut from_gpu = Frame::new(w, h);
            let mut from_cpu = Frame::new(w, h);
            gpu.composite(slot(BufferId::A, 0), &mut from_gpu).unwrap();
            cpu.composite(slot(BufferId::A, 0), &mut from_cpu).unwrap();
            assert_eq!(from_gpu, from_cpu, "{}x{}", w, h);
        }
    }

    #[test]
    fn test_read_layers_split_across_staging_buffers() {
        let config = StrataConfig::with_grid(5, 5, 3);
        let Some(mut gpu) = gpu_or_skip(&config) else {
            return;
        };
        // Room for two 28-byte layers per staging buffer
        gpu.staging_limit = 60;
        let slots: Vec<Slot> = (0..5).map(|g| gpu.shape().address_of(g).unwrap()).collect();
        for (g, s) in slots.iter().enumerate() {
            gpu.write_layer(*s, &[g as u8 + 1; 25]).unwrap();
        }

        let all = gpu.read_layers(&slots).unwrap();
        assert_eq!(all.len(), 5 * 25);
        for (g, layer) in all.chunks_exact(25).enumerate() {
            assert!(layer.iter().all(|&v| v == g as u8 + 1), "generation {}", g);
        }
    }

    #[test]
    fn test_composite_matches_cpu() {
        let config = StrataConfig::with_grid(9, 6, 1);
        let Some(mut gpu) = gpu_or_skip(&config) else {
            return;
        };
        let mut cpu = CpuBackend::new(&config).unwrap();
        let mut cells = vec![0u8; 54];
        for (i, v) in cells.iter_mut().enumerate() {
            if i % 4 == 1 {
                *v = ALIVE;
            }
        }
        let target = slot(BufferId::A, 0);
        gpu.write_layer(target, &cells).unwrap();
        cpu.write_layer(target, &cells).unwrap();

        for (w, h) in [(9, 6), (18, 12), (27, 6)] {
            let mut from_gpu = Frame::new(w, h);
            let mut from_cpu = Frame::new(w, h);
            gpu.composite(target, &mut from_gpu).unwrap();
            cpu.composite(target, &mut from_cpu).unwrap();
            assert_eq!(from_gpu, from_cpu, "{}x{}", w, h);
        }
    }
}
