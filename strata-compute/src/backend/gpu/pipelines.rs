//! Bind group layouts and pipelines for the GPU backend

use crate::shaders::{self, BRUSH_TEMPLATE, COMPOSITE_SHADER, STEP_TEMPLATE};

use super::GpuBackend;

fn storage_entry(
    binding: u32,
    read_only: bool,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Bind group layouts shared by pipelines and bind groups
pub(crate) struct Layouts {
    /// src (read), dst (read_write), params
    pub step: wgpu::BindGroupLayout,
    /// cells (read_write), params
    pub brush: wgpu::BindGroupLayout,
    /// cells (read, fragment stage), params
    pub view: wgpu::BindGroupLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let compute = wgpu::ShaderStages::COMPUTE;
        let fragment = wgpu::ShaderStages::FRAGMENT;

        let step = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Step Bind Group Layout"),
            entries: &[
                storage_entry(0, true, compute),
                storage_entry(1, false, compute),
                uniform_entry(2, compute),
            ],
        });

        let brush = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Brush Bind Group Layout"),
            entries: &[storage_entry(0, false, compute), uniform_entry(1, compute)],
        });

        let view = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("View Bind Group Layout"),
            entries: &[storage_entry(0, true, fragment), uniform_entry(1, fragment)],
        });

        Self { step, brush, view }
    }
}

/// Compute pipelines, built once for the configured workgroup size
pub(crate) struct ComputePipelines {
    pub step: wgpu::ComputePipeline,
    pub brush: wgpu::ComputePipeline,
}

impl ComputePipelines {
    pub fn new(device: &wgpu::Device, layouts: &Layouts, workgroup_size: u32) -> Self {
        let build = |name: &str, template: &str, layout: &wgpu::BindGroupLayout| {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(name),
                source: wgpu::ShaderSource::Wgsl(
                    shaders::generate_shader(template, workgroup_size).into(),
                ),
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(name),
                bind_group_layouts: &[layout],
                immediate_size: 0,
            });

            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(name),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        tracing::debug!("🎮 Compiling compute pipelines (workgroup size {})", workgroup_size);
        Self {
            step: build("Step Pipeline", STEP_TEMPLATE, &layouts.step),
            brush: build("Brush Pipeline", BRUSH_TEMPLATE, &layouts.brush),
        }
    }
}

impl GpuBackend {
    /// Build the composite pipeline for a target format unless cached
    pub(super) fn prepare_composite_pipeline(&mut self, format: wgpu::TextureFormat) {
        let device = &self.device;
        let view_layout = &self.layouts.view;

        self.composite_pipelines.entry(format).or_insert_with(|| {
            tracing::debug!("🎮 Building composite pipeline for {:?}", format);

            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Composite Shader"),
                source: wgpu::ShaderSource::Wgsl(COMPOSITE_SHADER.into()),
            });

            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Composite Pipeline Layout"),
                bind_group_layouts: &[view_layout],
                immediate_size: 0,
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Composite Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview_mask: None,
                cache: None,
            })
        });
    }
}
