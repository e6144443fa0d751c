//! Bind group creation for the GPU backend
//!
//! Everything is bound at startup. Buffers never move, so the two step
//! directions and the per-buffer brush and view groups stay valid for the
//! whole run. Indexing is by `BufferId::index()` of the buffer read (step)
//! or touched (brush, view).

use super::buffers::GpuBuffers;
use super::pipelines::Layouts;

pub(crate) struct BindGroups {
    /// `step[0]` reads A and writes B, `step[1]` reads B and writes A
    pub step: [wgpu::BindGroup; 2],
    pub brush: [wgpu::BindGroup; 2],
    pub view: [wgpu::BindGroup; 2],
}

impl BindGroups {
    pub fn new(device: &wgpu::Device, layouts: &Layouts, buffers: &GpuBuffers) -> Self {
        let [a, b] = &buffers.cells;

        let step = |label: &str, src: &wgpu::Buffer, dst: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &layouts.step,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: src.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: dst.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: buffers.step_params.as_entire_binding(),
                    },
                ],
            })
        };

        let single = |label: &str,
                      layout: &wgpu::BindGroupLayout,
                      cells: &wgpu::Buffer,
                      params: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: cells.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: params.as_entire_binding(),
                    },
                ],
            })
        };

        Self {
            step: [step("Step A->B", a, b), step("Step B->A", b, a)],
            brush: [
                single("Brush A", &layouts.brush, a, &buffers.brush_params),
                single("Brush B", &layouts.brush, b, &buffers.brush_params),
            ],
            view: [
                single("View A", &layouts.view, a, &buffers.view_params),
                single("View B", &layouts.view, b, &buffers.view_params),
            ],
        }
    }
}
