//! Compute pipeline builder.
//!
//! Every solver kernel binds the same shape of resources: one uniform
//! parameter struct followed by a handful of storage buffers. The builder
//! collects that shape once and emits the shader module, bind group layout,
//! pipeline layout, and pipeline together:
//!
//! ```ignore
//! let (pipeline, layout) = PipelineBuilder::new(device)
//!     .shader_source(include_str!("shaders/advect_2d.wgsl"))
//!     .label("advect_2d")
//!     .entry_point("advect")
//!     .uniform_buffer_size(std::mem::size_of::<AdvectParams>() as u64)
//!     .storage_buffer(true)   // velocity
//!     .storage_buffer(true)   // src
//!     .storage_buffer(false)  // dst
//!     .build();
//! ```

use std::num::NonZeroU64;

pub struct PipelineBuilder<'a> {
    device: &'a wgpu::Device,
    shader_source: Option<&'a str>,
    label: Option<&'a str>,
    entry_point: &'a str,
    bindings: Vec<BufferBinding>,
}

#[derive(Clone, Debug)]
enum BufferBinding {
    Uniform(Option<NonZeroU64>),
    Storage { read_only: bool },
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self {
            device,
            shader_source: None,
            label: None,
            entry_point: "main",
            bindings: Vec::new(),
        }
    }

    pub fn shader_source(mut self, source: &'a str) -> Self {
        self.shader_source = Some(source);
        self
    }

    pub fn label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn entry_point(mut self, entry_point: &'a str) -> Self {
        self.entry_point = entry_point;
        self
    }

    /// Uniform binding at the next index, with a minimum-size hint.
    pub fn uniform_buffer_size(mut self, size: u64) -> Self {
        self.bindings.push(BufferBinding::Uniform(NonZeroU64::new(size)));
        self
    }

    /// Storage binding at the next index. `read_only = false` makes it
    /// read-write in the shader.
    pub fn storage_buffer(mut self, read_only: bool) -> Self {
        self.bindings.push(BufferBinding::Storage { read_only });
        self
    }

    /// # Panics
    /// Panics if `shader_source` was not set.
    pub fn build(self) -> (wgpu::ComputePipeline, wgpu::BindGroupLayout) {
        let shader_source = self
            .shader_source
            .expect("shader_source must be set before building");

        let shader = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: self.label,
                source: wgpu::ShaderSource::Wgsl(shader_source.into()),
            });

        let entries: Vec<wgpu::BindGroupLayoutEntry> = self
            .bindings
            .iter()
            .enumerate()
            .map(|(binding, spec)| match spec {
                BufferBinding::Uniform(min_size) => wgpu::BindGroupLayoutEntry {
                    binding: binding as u32,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: *min_size,
                    },
                    count: None,
                },
                BufferBinding::Storage { read_only } => wgpu::BindGroupLayoutEntry {
                    binding: binding as u32,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage {
                            read_only: *read_only,
                        },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            })
            .collect();

        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: self.label,
                    entries: &entries,
                });

        let pipeline_layout =
            self.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: self.label,
                    bind_group_layouts: &[&bind_group_layout],
                    push_constant_ranges: &[],
                });

        let pipeline = self
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: self.label,
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(self.entry_point),
                compilation_options: Default::default(),
                cache: None,
            });

        (pipeline, bind_group_layout)
    }
}
