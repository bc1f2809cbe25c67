//! GPU-resident 2D stable-fluids solver (compute only).
//!
//! All field state lives in storage buffers; the CPU records one encoder of
//! compute passes per frame and flips the buffer-pair indices as passes
//! complete. Velocity and dye are stored as `vec4<f32>` per cell (xy used
//! for velocity, rgb for dye) so one advect and one splat kernel serve both.
//!
//! Pressure ping-pongs between its own pair of buffers inside the Jacobi
//! loop; buffer A is cleared at the top of every solve so each frame's
//! relaxation starts from zero.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use sim2d::constants::SEED_VELOCITY_MAGNITUDE;
use sim2d::SolverConfig;

use super::pipeline::PipelineBuilder;
use super::{await_buffer_map, GpuError};

const WORKGROUP_SIZE: u32 = 8;

/// Bind buffers to consecutive binding indices under one layout.
fn bind(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    buffers: &[&wgpu::Buffer],
) -> wgpu::BindGroup {
    let entries: Vec<wgpu::BindGroupEntry> = buffers
        .iter()
        .enumerate()
        .map(|(i, buffer)| wgpu::BindGroupEntry {
            binding: i as u32,
            resource: buffer.as_entire_binding(),
        })
        .collect();
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &entries,
    })
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct AdvectParams {
    width: u32,
    height: u32,
    dt_scaled: f32,
    _pad: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct GridParams {
    width: u32,
    height: u32,
    _pad0: u32,
    _pad1: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct PressureParams {
    width: u32,
    height: u32,
    alpha: f32,
    beta: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ConfinementParams {
    width: u32,
    height: u32,
    dt: f32,
    strength: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SplatParams {
    center: [f32; 2],
    radius: f32,
    strength: f32,
    value: [f32; 4],
    width: u32,
    height: u32,
    _pad0: u32,
    _pad1: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct DisplayParams {
    width: u32,
    height: u32,
    _pad0: u32,
    _pad1: u32,
}

pub struct GpuStableFluids {
    width: u32,
    height: u32,
    config: SolverConfig,

    // Double-buffered fields; the index names the readable buffer.
    velocity_buffers: [wgpu::Buffer; 2],
    velocity_idx: usize,
    dye_buffers: [wgpu::Buffer; 2],
    dye_idx: usize,

    pressure_a_buffer: wgpu::Buffer,
    _pressure_b_buffer: wgpu::Buffer,
    divergence_buffer: wgpu::Buffer,
    _vorticity_buffer: wgpu::Buffer,

    advect_params_buffer: wgpu::Buffer,
    _grid_params_buffer: wgpu::Buffer,
    _pressure_params_buffer: wgpu::Buffer,
    confinement_params_buffer: wgpu::Buffer,
    force_splat_params_buffer: wgpu::Buffer,
    dye_splat_params_buffer: wgpu::Buffer,
    _display_params_buffer: wgpu::Buffer,

    advect_pipeline: wgpu::ComputePipeline,
    vorticity_pipeline: wgpu::ComputePipeline,
    confinement_pipeline: wgpu::ComputePipeline,
    divergence_pipeline: wgpu::ComputePipeline,
    pressure_pipeline: wgpu::ComputePipeline,
    gradient_pipeline: wgpu::ComputePipeline,
    splat_pipeline: wgpu::ComputePipeline,
    display_pipeline: wgpu::RenderPipeline,

    // Prebuilt bind groups, indexed by the parity of the source buffer(s).
    advect_velocity_bind_groups: [wgpu::BindGroup; 2],
    advect_dye_bind_groups: [[wgpu::BindGroup; 2]; 2],
    vorticity_bind_groups: [wgpu::BindGroup; 2],
    confinement_bind_groups: [wgpu::BindGroup; 2],
    divergence_bind_groups: [wgpu::BindGroup; 2],
    pressure_bind_group_ab: wgpu::BindGroup,
    pressure_bind_group_ba: wgpu::BindGroup,
    gradient_bind_groups: [[wgpu::BindGroup; 2]; 2],
    force_splat_bind_groups: [wgpu::BindGroup; 2],
    dye_splat_bind_groups: [wgpu::BindGroup; 2],
    display_bind_groups: [wgpu::BindGroup; 2],
}

impl GpuStableFluids {
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        surface_format: wgpu::TextureFormat,
        config: SolverConfig,
    ) -> Self {
        let cell_count = (width * height) as u64;
        let vec4_size = cell_count * std::mem::size_of::<[f32; 4]>() as u64;
        let scalar_size = cell_count * std::mem::size_of::<f32>() as u64;

        let field_buffer = |label: &str, size: u64| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        };

        let velocity_buffers = [
            field_buffer("Velocity A", vec4_size),
            field_buffer("Velocity B", vec4_size),
        ];
        let dye_buffers = [
            field_buffer("Dye A", vec4_size),
            field_buffer("Dye B", vec4_size),
        ];
        let pressure_a_buffer = field_buffer("Pressure A", scalar_size);
        let pressure_b_buffer = field_buffer("Pressure B", scalar_size);
        let divergence_buffer = field_buffer("Divergence", scalar_size);
        let vorticity_buffer = field_buffer("Vorticity", scalar_size);

        let advect_params = AdvectParams {
            width,
            height,
            dt_scaled: 0.0,
            _pad: 0.0,
        };
        let advect_params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Advect Params"),
            contents: bytemuck::bytes_of(&advect_params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let grid_params = GridParams {
            width,
            height,
            _pad0: 0,
            _pad1: 0,
        };
        let grid_params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid Params"),
            contents: bytemuck::bytes_of(&grid_params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let pressure_params = PressureParams {
            width,
            height,
            alpha: config.pressure_alpha,
            beta: config.pressure_beta,
        };
        let pressure_params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Pressure Params"),
            contents: bytemuck::bytes_of(&pressure_params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let confinement_params = ConfinementParams {
            width,
            height,
            dt: 0.0,
            strength: config.confinement_strength,
        };
        let confinement_params_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Confinement Params"),
                contents: bytemuck::bytes_of(&confinement_params),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let splat_params = SplatParams {
            center: [0.0, 0.0],
            radius: config.force_splat_radius,
            strength: config.force_splat_strength,
            value: [0.0; 4],
            width,
            height,
            _pad0: 0,
            _pad1: 0,
        };
        let force_splat_params_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Force Splat Params"),
                contents: bytemuck::bytes_of(&splat_params),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let dye_splat_params_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Dye Splat Params"),
                contents: bytemuck::bytes_of(&splat_params),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let display_params = DisplayParams {
            width,
            height,
            _pad0: 0,
            _pad1: 0,
        };
        let display_params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Display Params"),
            contents: bytemuck::bytes_of(&display_params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let (advect_pipeline, advect_layout) = PipelineBuilder::new(device)
            .shader_source(include_str!("shaders/advect_2d.wgsl"))
            .label("advect_2d")
            .entry_point("advect")
            .uniform_buffer_size(std::mem::size_of::<AdvectParams>() as u64)
            .storage_buffer(true)
            .storage_buffer(true)
            .storage_buffer(false)
            .build();

        let (vorticity_pipeline, vorticity_layout) = PipelineBuilder::new(device)
            .shader_source(include_str!("shaders/vorticity_2d.wgsl"))
            .label("vorticity_2d")
            .entry_point("compute_vorticity")
            .uniform_buffer_size(std::mem::size_of::<GridParams>() as u64)
            .storage_buffer(true)
            .storage_buffer(false)
            .build();

        let (confinement_pipeline, confinement_layout) = PipelineBuilder::new(device)
            .shader_source(include_str!("shaders/confinement_2d.wgsl"))
            .label("confinement_2d")
            .entry_point("apply_confinement")
            .uniform_buffer_size(std::mem::size_of::<ConfinementParams>() as u64)
            .storage_buffer(true)
            .storage_buffer(true)
            .storage_buffer(false)
            .build();

        let (divergence_pipeline, divergence_layout) = PipelineBuilder::new(device)
            .shader_source(include_str!("shaders/divergence_2d.wgsl"))
            .label("divergence_2d")
            .entry_point("compute_divergence")
            .uniform_buffer_size(std::mem::size_of::<GridParams>() as u64)
            .storage_buffer(true)
            .storage_buffer(false)
            .build();

        let (pressure_pipeline, pressure_layout) = PipelineBuilder::new(device)
            .shader_source(include_str!("shaders/pressure_jacobi_2d.wgsl"))
            .label("pressure_jacobi_2d")
            .entry_point("pressure_jacobi")
            .uniform_buffer_size(std::mem::size_of::<PressureParams>() as u64)
            .storage_buffer(true)
            .storage_buffer(true)
            .storage_buffer(false)
            .build();

        let (gradient_pipeline, gradient_layout) = PipelineBuilder::new(device)
            .shader_source(include_str!("shaders/gradient_subtract_2d.wgsl"))
            .label("gradient_subtract_2d")
            .entry_point("subtract_gradient")
            .uniform_buffer_size(std::mem::size_of::<GridParams>() as u64)
            .storage_buffer(true)
            .storage_buffer(true)
            .storage_buffer(false)
            .build();

        let (splat_pipeline, splat_layout) = PipelineBuilder::new(device)
            .shader_source(include_str!("shaders/splat_2d.wgsl"))
            .label("splat_2d")
            .entry_point("splat")
            .uniform_buffer_size(std::mem::size_of::<SplatParams>() as u64)
            .storage_buffer(true)
            .storage_buffer(false)
            .build();

        // Velocity self-advects: the velocity buffer is bound both as the
        // displacement source and as the advected field.
        let advect_velocity_bind_groups = [0usize, 1].map(|i| {
            bind(
                device,
                "Advect Velocity Bind Group",
                &advect_layout,
                &[
                    &advect_params_buffer,
                    &velocity_buffers[i],
                    &velocity_buffers[i],
                    &velocity_buffers[1 - i],
                ],
            )
        });

        let advect_dye_bind_groups = [0usize, 1].map(|d| {
            [0usize, 1].map(|v| {
                bind(
                    device,
                    "Advect Dye Bind Group",
                    &advect_layout,
                    &[
                        &advect_params_buffer,
                        &velocity_buffers[v],
                        &dye_buffers[d],
                        &dye_buffers[1 - d],
                    ],
                )
            })
        });

        let vorticity_bind_groups = [0usize, 1].map(|i| {
            bind(
                device,
                "Vorticity Bind Group",
                &vorticity_layout,
                &[
                    &grid_params_buffer,
                    &velocity_buffers[i],
                    &vorticity_buffer,
                ],
            )
        });

        let confinement_bind_groups = [0usize, 1].map(|i| {
            bind(
                device,
                "Confinement Bind Group",
                &confinement_layout,
                &[
                    &confinement_params_buffer,
                    &velocity_buffers[i],
                    &vorticity_buffer,
                    &velocity_buffers[1 - i],
                ],
            )
        });

        let divergence_bind_groups = [0usize, 1].map(|i| {
            bind(
                device,
                "Divergence Bind Group",
                &divergence_layout,
                &[
                    &grid_params_buffer,
                    &velocity_buffers[i],
                    &divergence_buffer,
                ],
            )
        });

        let pressure_bind_group_ab = bind(
            device,
            "Pressure Bind Group AB",
            &pressure_layout,
            &[
                &pressure_params_buffer,
                &pressure_a_buffer,
                &divergence_buffer,
                &pressure_b_buffer,
            ],
        );
        let pressure_bind_group_ba = bind(
            device,
            "Pressure Bind Group BA",
            &pressure_layout,
            &[
                &pressure_params_buffer,
                &pressure_b_buffer,
                &divergence_buffer,
                &pressure_a_buffer,
            ],
        );

        // Outer index: velocity parity. Inner index: which pressure buffer
        // holds the final Jacobi iterate (depends on the iteration count).
        let gradient_bind_groups = [0usize, 1].map(|v| {
            [&pressure_a_buffer, &pressure_b_buffer].map(|p| {
                bind(
                    device,
                    "Gradient Bind Group",
                    &gradient_layout,
                    &[
                        &grid_params_buffer,
                        &velocity_buffers[v],
                        p,
                        &velocity_buffers[1 - v],
                    ],
                )
            })
        });

        let force_splat_bind_groups = [0usize, 1].map(|i| {
            bind(
                device,
                "Force Splat Bind Group",
                &splat_layout,
                &[
                    &force_splat_params_buffer,
                    &velocity_buffers[i],
                    &velocity_buffers[1 - i],
                ],
            )
        });

        let dye_splat_bind_groups = [0usize, 1].map(|i| {
            bind(
                device,
                "Dye Splat Bind Group",
                &splat_layout,
                &[
                    &dye_splat_params_buffer,
                    &dye_buffers[i],
                    &dye_buffers[1 - i],
                ],
            )
        });

        let (display_pipeline, display_layout) =
            Self::build_display_pipeline(device, surface_format);
        let display_bind_groups = [0usize, 1].map(|i| {
            bind(
                device,
                "Display Bind Group",
                &display_layout,
                &[&display_params_buffer, &dye_buffers[i]],
            )
        });

        Self {
            width,
            height,
            config,
            velocity_buffers,
            velocity_idx: 0,
            dye_buffers,
            dye_idx: 0,
            pressure_a_buffer,
            _pressure_b_buffer: pressure_b_buffer,
            divergence_buffer,
            _vorticity_buffer: vorticity_buffer,
            advect_params_buffer,
            _grid_params_buffer: grid_params_buffer,
            _pressure_params_buffer: pressure_params_buffer,
            confinement_params_buffer,
            force_splat_params_buffer,
            dye_splat_params_buffer,
            _display_params_buffer: display_params_buffer,
            advect_pipeline,
            vorticity_pipeline,
            confinement_pipeline,
            divergence_pipeline,
            pressure_pipeline,
            gradient_pipeline,
            splat_pipeline,
            display_pipeline,
            advect_velocity_bind_groups,
            advect_dye_bind_groups,
            vorticity_bind_groups,
            confinement_bind_groups,
            divergence_bind_groups,
            pressure_bind_group_ab,
            pressure_bind_group_ba,
            gradient_bind_groups,
            force_splat_bind_groups,
            dye_splat_bind_groups,
            display_bind_groups,
        }
    }

    fn build_display_pipeline(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> (wgpu::RenderPipeline, wgpu::BindGroupLayout) {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Display Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/display_2d.wgsl").into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Display Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(
                            std::mem::size_of::<DisplayParams>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Display Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Display Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        (pipeline, layout)
    }

    fn workgroups(&self) -> (u32, u32) {
        (
            (self.width + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE,
            (self.height + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE,
        )
    }

    /// Fill both velocity buffers with the rotational start-up field so the
    /// fluid is visibly moving before any interaction.
    pub fn seed_rotation(&self, queue: &wgpu::Queue) {
        let (w, h) = (self.width as f32, self.height as f32);
        let mut data = Vec::with_capacity((self.width * self.height) as usize);
        for j in 0..self.height {
            for i in 0..self.width {
                let x = (i as f32 / w) * 2.0 - 1.0;
                let y = (j as f32 / h) * 2.0 - 1.0;
                let len = (x * x + y * y).sqrt() + 0.001;
                data.push([
                    y / len * SEED_VELOCITY_MAGNITUDE,
                    -x / len * SEED_VELOCITY_MAGNITUDE,
                    0.0,
                    0.0,
                ]);
            }
        }
        let bytes: &[u8] = bytemuck::cast_slice(&data);
        queue.write_buffer(&self.velocity_buffers[0], 0, bytes);
        queue.write_buffer(&self.velocity_buffers[1], 0, bytes);
    }

    /// Zero both velocity buffers.
    pub fn clear_velocity(&self, queue: &wgpu::Queue) {
        let zeros = vec![[0.0f32; 4]; (self.width * self.height) as usize];
        let bytes: &[u8] = bytemuck::cast_slice(&zeros);
        queue.write_buffer(&self.velocity_buffers[0], 0, bytes);
        queue.write_buffer(&self.velocity_buffers[1], 0, bytes);
    }

    /// Record and submit one full solver step: advect velocity, vorticity
    /// confinement, divergence, Jacobi pressure relaxation, gradient
    /// subtraction, advect dye.
    pub fn step(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, dt: f32) {
        let advect_params = AdvectParams {
            width: self.width,
            height: self.height,
            dt_scaled: dt * self.config.advection_time_scale,
            _pad: 0.0,
        };
        queue.write_buffer(
            &self.advect_params_buffer,
            0,
            bytemuck::bytes_of(&advect_params),
        );

        let confinement_params = ConfinementParams {
            width: self.width,
            height: self.height,
            dt,
            strength: self.config.confinement_strength,
        };
        queue.write_buffer(
            &self.confinement_params_buffer,
            0,
            bytemuck::bytes_of(&confinement_params),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Solver Step Encoder"),
        });
        let (wg_x, wg_y) = self.workgroups();

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Advect Velocity Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.advect_pipeline);
            pass.set_bind_group(0, &self.advect_velocity_bind_groups[self.velocity_idx], &[]);
            pass.dispatch_workgroups(wg_x, wg_y, 1);
        }
        self.velocity_idx = 1 - self.velocity_idx;

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Vorticity Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.vorticity_pipeline);
            pass.set_bind_group(0, &self.vorticity_bind_groups[self.velocity_idx], &[]);
            pass.dispatch_workgroups(wg_x, wg_y, 1);
        }
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Confinement Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.confinement_pipeline);
            pass.set_bind_group(0, &self.confinement_bind_groups[self.velocity_idx], &[]);
            pass.dispatch_workgroups(wg_x, wg_y, 1);
        }
        self.velocity_idx = 1 - self.velocity_idx;

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Divergence Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.divergence_pipeline);
            pass.set_bind_group(0, &self.divergence_bind_groups[self.velocity_idx], &[]);
            pass.dispatch_workgroups(wg_x, wg_y, 1);
        }

        // Jacobi relaxation restarts from zero pressure every frame.
        encoder.clear_buffer(&self.pressure_a_buffer, 0, None);
        for iter in 0..self.config.pressure_iterations {
            let bind_group = if iter % 2 == 0 {
                &self.pressure_bind_group_ab
            } else {
                &self.pressure_bind_group_ba
            };
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Pressure Jacobi Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pressure_pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(wg_x, wg_y, 1);
        }
        // Even iteration counts land the final iterate back in buffer A.
        let pressure_idx = self.config.pressure_iterations % 2;

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Gradient Subtract Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.gradient_pipeline);
            pass.set_bind_group(
                0,
                &self.gradient_bind_groups[self.velocity_idx][pressure_idx],
                &[],
            );
            pass.dispatch_workgroups(wg_x, wg_y, 1);
        }
        self.velocity_idx = 1 - self.velocity_idx;

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Advect Dye Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.advect_pipeline);
            pass.set_bind_group(
                0,
                &self.advect_dye_bind_groups[self.dye_idx][self.velocity_idx],
                &[],
            );
            pass.dispatch_workgroups(wg_x, wg_y, 1);
        }
        self.dye_idx = 1 - self.dye_idx;

        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Inject momentum `(fx, fy)` around normalized position `(x, y)`.
    pub fn add_force(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        x: f32,
        y: f32,
        fx: f32,
        fy: f32,
    ) {
        let params = SplatParams {
            center: [x * self.width as f32, y * self.height as f32],
            radius: self.config.force_splat_radius,
            strength: self.config.force_splat_strength,
            value: [fx, fy, 0.0, 0.0],
            width: self.width,
            height: self.height,
            _pad0: 0,
            _pad1: 0,
        };
        queue.write_buffer(&self.force_splat_params_buffer, 0, bytemuck::bytes_of(&params));

        self.submit_splat(
            device,
            queue,
            "Force Splat",
            &self.force_splat_bind_groups[self.velocity_idx],
        );
        self.velocity_idx = 1 - self.velocity_idx;
    }

    /// Inject dye color `(r, g, b)` around normalized position `(x, y)`.
    pub fn add_dye(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        x: f32,
        y: f32,
        r: f32,
        g: f32,
        b: f32,
    ) {
        let params = SplatParams {
            center: [x * self.width as f32, y * self.height as f32],
            radius: self.config.dye_splat_radius,
            strength: self.config.dye_splat_strength,
            value: [r, g, b, 0.0],
            width: self.width,
            height: self.height,
            _pad0: 0,
            _pad1: 0,
        };
        queue.write_buffer(&self.dye_splat_params_buffer, 0, bytemuck::bytes_of(&params));

        self.submit_splat(
            device,
            queue,
            "Dye Splat",
            &self.dye_splat_bind_groups[self.dye_idx],
        );
        self.dye_idx = 1 - self.dye_idx;
    }

    fn submit_splat(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        bind_group: &wgpu::BindGroup,
    ) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(label),
        });
        let (wg_x, wg_y) = self.workgroups();
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(label),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.splat_pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(wg_x, wg_y, 1);
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Draw the current dye field over the whole target view.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Display Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.display_pipeline);
        pass.set_bind_group(0, &self.display_bind_groups[self.dye_idx], &[]);
        pass.draw(0..3, 0..1);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn read_field(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        buffer: &wgpu::Buffer,
        size: u64,
    ) -> Result<Vec<u8>, GpuError> {
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        await_buffer_map(rx)?;

        let data = slice.get_mapped_range();
        let result = data.to_vec();
        drop(data);
        staging.unmap();
        Ok(result)
    }

    /// Read back the current velocity field as (vx, vy) per cell.
    pub fn read_velocity(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<[f32; 2]>, GpuError> {
        let size = (self.width * self.height) as u64 * std::mem::size_of::<[f32; 4]>() as u64;
        let bytes = self.read_field(device, queue, &self.velocity_buffers[self.velocity_idx], size)?;
        let raw: &[[f32; 4]] = bytemuck::cast_slice(&bytes);
        Ok(raw.iter().map(|v| [v[0], v[1]]).collect())
    }

    /// Read back the current dye field as (r, g, b) per cell.
    pub fn read_dye(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<[f32; 3]>, GpuError> {
        let size = (self.width * self.height) as u64 * std::mem::size_of::<[f32; 4]>() as u64;
        let bytes = self.read_field(device, queue, &self.dye_buffers[self.dye_idx], size)?;
        let raw: &[[f32; 4]] = bytemuck::cast_slice(&bytes);
        Ok(raw.iter().map(|v| [v[0], v[1], v[2]]).collect())
    }

    pub fn read_divergence(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<f32>, GpuError> {
        let size = (self.width * self.height) as u64 * std::mem::size_of::<f32>() as u64;
        let bytes = self.read_field(device, queue, &self.divergence_buffer, size)?;
        Ok(bytemuck::cast_slice(&bytes).to_vec())
    }

    pub fn read_pressure(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<f32>, GpuError> {
        let size = (self.width * self.height) as u64 * std::mem::size_of::<f32>() as u64;
        let bytes = self.read_field(device, queue, &self.pressure_a_buffer, size)?;
        Ok(bytemuck::cast_slice(&bytes).to_vec())
    }
}
