//! GPU resource graph and per-frame orchestration for the automaton.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::config::{seed_cells, SimConfig};
use crate::error::EngineError;
use crate::pacer::FramePacer;
use crate::pingpong::CellBuffers;
use crate::shader;

const SHADER_PATH: &str = "shaders/life.wgsl";

// One instanceable quad: two triangles of 2D positions, shared by every cell.
const QUAD_VERTICES: [f32; 12] = [
    -0.8, -0.8, //
    0.8, -0.8, //
    0.8, 0.8, //
    -0.8, -0.8, //
    0.8, 0.8, //
    -0.8, 0.8,
];
const QUAD_VERTEX_COUNT: u32 = 6;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.4,
    a: 1.0,
};

/// Owns every GPU resource for the simulation. Dropping it releases the
/// resources in reverse acquisition order; there is no manual teardown path.
pub struct LifeState {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,

    vertex_buffer: wgpu::Buffer,
    #[allow(dead_code)] // referenced by both bind groups; kept alive here
    uniform_buffer: wgpu::Buffer,
    cells: CellBuffers,
    render_pipeline: wgpu::RenderPipeline,
    simulation_pipeline: wgpu::ComputePipeline,

    config: SimConfig,
    workgroup_count: u32,
    step: u64,
    pacer: FramePacer,
}

impl LifeState {
    pub async fn new(window: Arc<Window>, config: SimConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| EngineError::Init(format!("failed to create surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| EngineError::init("no compatible GPU adapter found"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Life Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| EngineError::Init(format!("failed to request device: {e}")))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let shader = shader::load_module(&device, SHADER_PATH)?;

        let cell_state_bytes = u64::from(config.cell_count()) * 4;
        let bind_group_layout = create_bind_group_layout(&device, cell_state_bytes);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cell Quad Vertices"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid Dimensions"),
            contents: bytemuck::cast_slice(&[config.grid_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let seed_words = seed_cells(config.cell_count() as usize, config.seed);
        let cells = CellBuffers::new(&device, &bind_group_layout, &uniform_buffer, &seed_words);

        let (render_pipeline, simulation_pipeline) = create_pipelines(
            &device,
            &bind_group_layout,
            &shader,
            surface_config.format,
            config.workgroup_size,
        );

        log::info!(
            "simulating {size}x{size} cells, {wg}x{wg} workgroups, {interval}s per generation",
            size = config.grid_size,
            wg = config.workgroup_count(),
            interval = config.update_interval,
        );

        let workgroup_count = config.workgroup_count();
        let pacer = FramePacer::new(config.update_interval);

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            vertex_buffer,
            uniform_buffer,
            cells,
            render_pipeline,
            simulation_pipeline,
            config,
            workgroup_count,
            step: 0,
            pacer,
        })
    }

    /// Runs one presentation tick: advances the simulation by one generation
    /// when the pacer says enough time has passed, then always draws the
    /// latest committed generation.
    pub fn render_frame(&mut self) -> Result<(), EngineError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let stepped = self.pacer.tick(Instant::now());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        if stepped {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Simulation Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.simulation_pipeline);
            pass.set_bind_group(0, self.cells.select(self.step), &[]);
            pass.dispatch_workgroups(self.workgroup_count, self.workgroup_count, 1);
            drop(pass);
            self.step += 1;
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Cell Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.render_pipeline);
            // Same bind group the most recent compute step dispatched with,
            // so the draw reflects the generation just written.
            pass.set_bind_group(0, self.cells.select_rendered(self.step), &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.draw(0..QUAD_VERTEX_COUNT, 0..self.config.cell_count());
        }

        // Compute and render share one command buffer, so the queue observes
        // the dispatch's writes before the draw reads them.
        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }

    /// Reconfigures the presentation surface only. Simulation buffers, the
    /// step counter, and the pacer are untouched.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Reapplies the current surface configuration after a lost surface.
    pub fn reconfigure_surface(&self) {
        self.surface.configure(&self.device, &self.surface_config);
    }
}

fn create_bind_group_layout(
    device: &wgpu::Device,
    cell_state_bytes: u64,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Cell Bind Group Layout"),
        entries: &[
            // Grid dimensions, read by every stage.
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX
                    | wgpu::ShaderStages::FRAGMENT
                    | wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(8),
                },
                count: None,
            },
            // Cell state input: the previous generation.
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::VERTEX
                    | wgpu::ShaderStages::FRAGMENT
                    | wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(cell_state_bytes),
                },
                count: None,
            },
            // Cell state output: the generation being written.
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: false },
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(cell_state_bytes),
                },
                count: None,
            },
        ],
    })
}

fn create_pipelines(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    shader: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    workgroup_size: u32,
) -> (wgpu::RenderPipeline, wgpu::ComputePipeline) {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Cell Pipeline Layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    let vertex_layout = wgpu::VertexBufferLayout {
        array_stride: 8,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 0,
            shader_location: 0,
        }],
    };

    let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Cell Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vertexMain",
            buffers: &[vertex_layout],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fragmentMain",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    });

    // The shader sizes its local invocation grid from this override constant.
    let constants = HashMap::from([(String::from("WORKGROUP_SIZE"), f64::from(workgroup_size))]);

    let simulation_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Simulation Pipeline"),
        layout: Some(&pipeline_layout),
        module: shader,
        entry_point: "computeMain",
        compilation_options: wgpu::PipelineCompilationOptions {
            constants: &constants,
            ..Default::default()
        },
        cache: None,
    });

    (render_pipeline, simulation_pipeline)
}
