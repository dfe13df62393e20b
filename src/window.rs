//! Native window host.
//!
//! Runs the petal loop inside a winit event loop. Petals are rasterized on
//! the CPU into a [`PixelCanvas`]; [`Presenter`] uploads that canvas into a
//! texture every redraw and composites it over the background with a
//! fullscreen triangle.
//!
//! The loop's "next frame" requests become `Window::request_redraw` calls
//! through [`WindowScheduler`]. Redraws the OS asks for on its own (expose,
//! resize) only re-present the canvas; they never advance the simulation.

use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::canvas::{Canvas, PixelCanvas, SurfaceSize};
use crate::config::EffectConfig;
use crate::effect::PetalLoop;
use crate::error::{AssetError, GpuError, RunError};
use crate::rng::SmallRngSource;
use crate::scheduler::FrameScheduler;
use crate::shader::{Uniforms, PRESENT_SOURCE};
use crate::sprite::{self, Sprite};
use crate::time::FrameClock;

const CANVAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Messages delivered to the event loop from other threads.
#[derive(Debug)]
pub enum AppEvent {
    /// The background sprite loader finished.
    SpriteLoaded(Result<Sprite, AssetError>),
}

/// [`FrameScheduler`] backed by `Window::request_redraw`.
pub struct WindowScheduler {
    window: Arc<Window>,
    pending: bool,
}

impl WindowScheduler {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            pending: false,
        }
    }

    /// Consume the pending frame request, if any.
    pub fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

impl FrameScheduler for WindowScheduler {
    fn request_frame(&mut self) {
        self.pending = true;
        self.window.request_redraw();
    }
}

/// GPU side of the window: swapchain plus the canvas texture.
pub struct Presenter {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    canvas_texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    canvas_size: SurfaceSize,
}

impl Presenter {
    pub async fn new(window: Arc<Window>, background: [f32; 3]) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniforms = Uniforms::from_srgb(background);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Present Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // The canvas maps 1:1 onto the window, no filtering needed.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Canvas Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Present Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Present Shader"),
            source: wgpu::ShaderSource::Wgsl(PRESENT_SOURCE.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Present Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Present Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
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
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let canvas_size = SurfaceSize::new(config.width, config.height);
        let (canvas_texture, bind_group) = create_canvas_texture(
            &device,
            &bind_group_layout,
            &uniform_buffer,
            &sampler,
            canvas_size,
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            bind_group_layout,
            uniform_buffer,
            sampler,
            canvas_texture,
            bind_group,
            canvas_size,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure the swapchain at its current size (after surface loss).
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Upload the canvas and present it.
    pub fn render(&mut self, canvas: &PixelCanvas) -> Result<(), wgpu::SurfaceError> {
        let size = canvas.size();
        if size.is_empty() {
            return Ok(());
        }
        if size != self.canvas_size {
            let (texture, bind_group) = create_canvas_texture(
                &self.device,
                &self.bind_group_layout,
                &self.uniform_buffer,
                &self.sampler,
                size,
            );
            self.canvas_texture = texture;
            self.bind_group = bind_group;
            self.canvas_size = size;
        }

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.canvas_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            canvas.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.width),
                rows_per_image: Some(size.height),
            },
            wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
        );

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Present Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Present Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_canvas_texture(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniform_buffer: &wgpu::Buffer,
    sampler: &wgpu::Sampler,
    size: SurfaceSize,
) -> (wgpu::Texture, wgpu::BindGroup) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Canvas Texture"),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: CANVAS_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Present Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    (texture, bind_group)
}

struct App {
    config: EffectConfig,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    scheduler: Option<WindowScheduler>,
    petal_loop: Option<PetalLoop<SmallRngSource>>,
    canvas: PixelCanvas,
    /// Sprite result that arrived before the window existed.
    early_sprite: Option<Result<Sprite, AssetError>>,
    clock: FrameClock,
    error: Option<RunError>,
}

impl App {
    fn new(config: EffectConfig) -> Self {
        let canvas = PixelCanvas::new(config.surface_size);
        Self {
            config,
            window: None,
            presenter: None,
            scheduler: None,
            petal_loop: None,
            canvas,
            early_sprite: None,
            clock: FrameClock::new(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: RunError) {
        log::error!("{error}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let scheduled = self
            .scheduler
            .as_mut()
            .map(WindowScheduler::take_pending)
            .unwrap_or(false);

        if scheduled {
            if let (Some(petal_loop), Some(scheduler)) = (&mut self.petal_loop, &mut self.scheduler) {
                if petal_loop.frame(&mut self.canvas, scheduler) {
                    if let Some(fps) = self.clock.tick() {
                        log::debug!(
                            "{fps:.1} fps over {} frames, last frame {:.2} ms",
                            self.clock.frame(),
                            self.clock.delta().as_secs_f64() * 1000.0
                        );
                    }
                }
            }
        }

        let Some(presenter) = &mut self.presenter else {
            return;
        };
        match presenter.render(&self.canvas) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => presenter.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory, closing");
                event_loop.exit();
            }
            Err(e) => log::warn!("render error: {e:?}"),
        }
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let size = self.config.surface_size;
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window_title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(size.width, size.height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let presenter = match pollster::block_on(Presenter::new(window.clone(), self.config.background)) {
            Ok(presenter) => presenter,
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let surface = SurfaceSize::from(window.inner_size());
        self.canvas.resize(surface);
        let mut scheduler = WindowScheduler::new(window.clone());
        let mut petal_loop = PetalLoop::new(&self.config, surface, SmallRngSource::from_clock());
        log::info!(
            "window ready at {}x{}, {} petals waiting for sprite",
            surface.width,
            surface.height,
            petal_loop.petals().len()
        );

        if let Some(result) = self.early_sprite.take() {
            petal_loop.sprite_loaded(result, &mut scheduler);
        }

        // First paint shows the background even if the sprite never arrives.
        window.request_redraw();

        self.window = Some(window);
        self.presenter = Some(presenter);
        self.scheduler = Some(scheduler);
        self.petal_loop = Some(petal_loop);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::SpriteLoaded(result) => {
                match (&mut self.petal_loop, &mut self.scheduler) {
                    (Some(petal_loop), Some(scheduler)) => petal_loop.sprite_loaded(result, scheduler),
                    _ => self.early_sprite = Some(result),
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!(
                    "window closed after {} frames in {:.1}s ({:.1} fps)",
                    self.clock.frame(),
                    self.clock.elapsed().as_secs_f32(),
                    self.clock.fps()
                );
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(presenter) = &mut self.presenter {
                    presenter.resize(physical_size);
                }
                let size = SurfaceSize::from(physical_size);
                match &mut self.petal_loop {
                    Some(petal_loop) => petal_loop.resize(&mut self.canvas, size),
                    None => self.canvas.resize(size),
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Open a window and run the petal effect until it is closed.
///
/// The sprite is decoded on a background thread; until it arrives (or if it
/// never does) the window shows only the background.
pub fn run(config: EffectConfig) -> Result<(), RunError> {
    config.validate()?;

    let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let proxy = event_loop.create_proxy();
    sprite::load_in_background(config.sprite_path.clone(), config.filter, move |result| {
        if proxy.send_event(AppEvent::SpriteLoaded(result)).is_err() {
            log::debug!("event loop closed before the sprite finished loading");
        }
    })
    .map_err(RunError::LoaderThread)?;

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
