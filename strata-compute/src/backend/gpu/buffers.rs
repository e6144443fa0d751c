//! Buffer creation and host uploads for the GPU backend

use strata_core::grid::{GridShape, Slot};

use super::config::{BrushParams, StepParams, ViewParams};
use super::GpuBackend;

/// Every device buffer a run needs, allocated once at startup
pub(crate) struct GpuBuffers {
    /// Generation buffers A and B
    pub cells: [wgpu::Buffer; 2],
    pub step_params: wgpu::Buffer,
    pub brush_params: wgpu::Buffer,
    pub view_params: wgpu::Buffer,
    /// One layer of readback space
    pub staging: wgpu::Buffer,
}

impl GpuBuffers {
    pub fn new(device: &wgpu::Device, shape: &GridShape) -> Self {
        let buffer_bytes = shape.buffer_bytes() as u64;

        // wgpu zero-initializes new buffers, so every layer starts dead
        let cells = ["Cells A", "Cells B"].map(|label| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: buffer_bytes,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        });

        let uniform = |label: &str, size: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Layer Staging"),
            size: shape.layer_stride_bytes() as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            cells,
            step_params: uniform("Step Params", std::mem::size_of::<StepParams>()),
            brush_params: uniform("Brush Params", std::mem::size_of::<BrushParams>()),
            view_params: uniform("View Params", std::mem::size_of::<ViewParams>()),
            staging,
        }
    }
}

impl GpuBackend {
    /// Overwrite one layer from host memory.
    ///
    /// Writes must be whole words, so the tail of an unaligned layer is
    /// padded with dead bytes.
    pub(super) fn upload_layer(&self, slot: Slot, cells: &[u8]) {
        let stride = self.shape.layer_stride_bytes();
        let offset = self.shape.layer_offset(slot.layer) as u64;
        let target = &self.buffers.cells[slot.buffer.index()];

        if cells.len() == stride {
            self.queue.write_buffer(target, offset, cells);
        } else {
            let mut padded = vec![0u8; stride];
            padded[..cells.len()].copy_from_slice(cells);
            self.queue.write_buffer(target, offset, &padded);
        }
        self.queue.submit(None);
    }
}
