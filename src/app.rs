//! Application shell and per-frame update logic.
//!
//! `App` owns the long-lived Vulkan resources plus the only simulation state
//! carried across frames: the drone pose, the camera mode, the menu state
//! machine and the simulation clock. Each frame runs a fixed sequence:
//!
//! 1. Resolve menu/state transitions from this frame's key edges
//! 2. While flying: integrate drone kinematics and camera-mode selection
//! 3. Advance the clock and evaluate the day/night light cycle
//! 4. Compose the per-object and global uniform blocks
//! 5. Record the command buffer (terrain, drone, skybox last, overlay) and
//!    present
//!
//! Everything derived in steps 3-4 is a pure function of the carried state,
//! recomputed from scratch every frame.

use std::{sync::Arc, time::Instant};

use egui_winit_vulkano::{Gui, GuiConfig};
use vulkano::{
  Validated,
  VulkanError,
  buffer::{Subbuffer, allocator::SubbufferAllocator},
  command_buffer::{
    AutoCommandBufferBuilder,
    CommandBufferUsage,
    allocator::StandardCommandBufferAllocator,
  },
  descriptor_set::{DescriptorSet, WriteDescriptorSet, allocator::StandardDescriptorSetAllocator},
  device::{Device, Queue},
  format::Format,
  image::{ImageUsage, sampler::Sampler, view::ImageView},
  instance::Instance,
  memory::allocator::StandardMemoryAllocator,
  pipeline::Pipeline,
  render_pass::Subpass,
  swapchain::{Surface, Swapchain, SwapchainCreateInfo, SwapchainPresentInfo, acquire_next_image},
  sync::{self, GpuFuture},
};
use winit::{
  application::ApplicationHandler,
  dpi::LogicalSize,
  event::WindowEvent,
  event_loop::{ActiveEventLoop, EventLoop},
  keyboard::PhysicalKey,
  window::{Window, WindowId},
};

use crate::{
  camera::CameraMode,
  core::{
    command_buffer_builder_ext::AutoCommandBufferBuilderExt,
    init::{SceneAssets, initialize_vulkan},
  },
  drone::DronePose,
  frame::{self, FrameUniforms, ObjectUniforms},
  gui::{self, HudState},
  input::InputTracker,
  lighting::light_at,
  render::pipeline::{RenderContext, WindowSizeSetupConfig, window_size_dependent_setup},
  shaders::{scene_fs, scene_vs, sky_fs, sky_vs},
  state::{AppState, StateMachine},
};

/// Complete application state: Vulkan resources, window-dependent rendering
/// context, and the simulation.
pub struct App {
  // Vulkan resources
  instance: Arc<Instance>,
  device: Arc<Device>,
  queue: Arc<Queue>,
  memory_allocator: Arc<StandardMemoryAllocator>,
  descriptor_set_allocator: Arc<StandardDescriptorSetAllocator>,
  command_buffer_allocator: Arc<StandardCommandBufferAllocator>,
  uniform_buffer_allocator: SubbufferAllocator,
  assets: SceneAssets,
  sampler: Arc<Sampler>,

  // Rendering context and overlay
  rcx: Option<RenderContext>,
  gui: Option<Gui>,
  hud: HudState,
  needs_pipeline_update: bool,

  // Frame timing
  last_frame_time: Instant,

  // Simulation state carried across frames
  input: InputTracker,
  state: StateMachine,
  drone: DronePose,
  camera_mode: CameraMode,
  sim_time: f32,
}

impl App {
  /// Initializes Vulkan and loads every asset. Panics on any startup
  /// failure; there is nothing to recover to before a device exists.
  pub fn new(event_loop: &EventLoop<()>) -> Self {
    let initialized = initialize_vulkan(event_loop);

    App {
      instance: initialized.instance,
      device: initialized.device,
      queue: initialized.queue,
      memory_allocator: initialized.memory_allocator,
      descriptor_set_allocator: initialized.descriptor_set_allocator,
      command_buffer_allocator: initialized.command_buffer_allocator,
      uniform_buffer_allocator: initialized.uniform_buffer_allocator,
      assets: initialized.assets,
      sampler: initialized.sampler,
      rcx: None,
      gui: None,
      hud: HudState::default(),
      needs_pipeline_update: false,
      last_frame_time: Instant::now(),
      input: InputTracker::new(),
      state: StateMachine::new(),
      drone: DronePose::new(),
      camera_mode: CameraMode::Center,
      sim_time: 0.0,
    }
  }

  /// Steps the simulation by `dt` seconds and returns this frame's uniform
  /// blocks, or `None` when the application should quit.
  ///
  /// Ordering matters: the state machine consumes key edges before the
  /// integrator sees held keys, and the clock advances before the light
  /// cycle is sampled.
  fn advance_simulation(&mut self, dt: f32, aspect: f32) -> Option<FrameUniforms> {
    let outcome = self.state.update(&self.input);
    if outcome.transitioned {
      // Overlay topology changed; rebuild the pipelines with the swapchain.
      self.needs_pipeline_update = true;
    }
    if self.state.should_close() {
      return None;
    }

    if self.state.current() == AppState::Playing {
      self.drone.integrate(&self.input, dt);
      self.camera_mode = self.camera_mode.select(&self.input);
    }

    self.sim_time += dt;
    let light = light_at(self.sim_time);
    let view = self.camera_mode.build_view(&self.drone);
    self.input.end_frame();

    Some(frame::compose(
      &self.drone,
      &view,
      light,
      self.sim_time,
      aspect,
    ))
  }
}

/// Writes one object's transform block into a fresh uniform subbuffer.
fn upload_object(
  allocator: &SubbufferAllocator,
  uniforms: &ObjectUniforms,
) -> Subbuffer<scene_vs::ObjectData> {
  let buffer = allocator.allocate_sized().unwrap();
  *buffer.write().unwrap() = scene_vs::ObjectData {
    mvp: uniforms.mvp.to_cols_array_2d(),
    model: uniforms.model.to_cols_array_2d(),
    normal_matrix: uniforms.normal.to_cols_array_2d(),
  };
  buffer
}

/// Writes the shared camera/clock/light block. The vec3 quantities are
/// packed into vec4s exactly as the shader block declares them.
fn upload_global(
  allocator: &SubbufferAllocator,
  uniforms: &FrameUniforms,
) -> Subbuffer<scene_fs::GlobalData> {
  let global = &uniforms.global;
  let buffer = allocator.allocate_sized().unwrap();
  *buffer.write().unwrap() = scene_fs::GlobalData {
    view: global.view.to_cols_array_2d(),
    proj: global.proj.to_cols_array_2d(),
    camera_pos: [
      global.camera_pos.x,
      global.camera_pos.y,
      global.camera_pos.z,
      global.time,
    ],
    light_dir: [
      global.light.direction.x,
      global.light.direction.y,
      global.light.direction.z,
      0.0,
    ],
    light_color: [
      global.light.color.x,
      global.light.color.y,
      global.light.color.z,
      global.light.intensity,
    ],
  };
  buffer
}

fn upload_sky(
  allocator: &SubbufferAllocator,
  uniforms: &FrameUniforms,
) -> Subbuffer<sky_vs::SkyData> {
  let buffer = allocator.allocate_sized().unwrap();
  *buffer.write().unwrap() = sky_vs::SkyData {
    mvp: uniforms.skybox_mvp.to_cols_array_2d(),
  };
  buffer
}

impl ApplicationHandler for App {
  /// Creates the window, swapchain, render pass, pipelines and the egui
  /// integration. Also runs again if the application is restored after a
  /// suspension.
  fn resumed(&mut self, event_loop: &ActiveEventLoop) {
    let window_attrs = Window::default_attributes()
      .with_decorations(true)
      .with_title("Drone Simulator")
      .with_inner_size(LogicalSize::new(1200, 800));

    let window = Arc::new(event_loop.create_window(window_attrs).unwrap());

    let surface = Surface::from_window(self.instance.clone(), window.clone()).unwrap();
    let window_size = window.inner_size();

    let (swapchain, images) = {
      let surface_capabilities = self
        .device
        .physical_device()
        .surface_capabilities(&surface, Default::default())
        .unwrap();

      let present_modes = self
        .device
        .physical_device()
        .surface_present_modes(&surface, Default::default())
        .unwrap();

      // Prefer MAILBOX (triple buffering), fall back to the always-available
      // FIFO (vsync).
      let present_mode = if present_modes.contains(&vulkano::swapchain::PresentMode::Mailbox) {
        vulkano::swapchain::PresentMode::Mailbox
      } else {
        vulkano::swapchain::PresentMode::Fifo
      };

      let (image_format, _) = self
        .device
        .physical_device()
        .surface_formats(&surface, Default::default())
        .unwrap()
        .into_iter()
        .find(|(format, _)| {
          matches!(
            format,
            Format::B8G8R8A8_UNORM | Format::R8G8B8A8_UNORM | Format::A8B8G8R8_UNORM_PACK32
          )
        })
        .unwrap_or_else(|| {
          self
            .device
            .physical_device()
            .surface_formats(&surface, Default::default())
            .unwrap()[0]
        });

      println!("Selected format: {image_format:?}, present mode: {present_mode:?}");

      Swapchain::new(self.device.clone(), surface.clone(), SwapchainCreateInfo {
        min_image_count: surface_capabilities.min_image_count.max(2),
        image_format,
        image_extent: window_size.into(),
        image_usage: ImageUsage::COLOR_ATTACHMENT,
        composite_alpha: vulkano::swapchain::CompositeAlpha::Opaque,
        pre_transform: surface_capabilities.current_transform,
        clipped: true,
        present_mode,
        ..Default::default()
      })
      .unwrap()
    };

    let render_pass = vulkano::ordered_passes_renderpass!(
      self.device.clone(),
      attachments: {
        msaa_color: {
          format: swapchain.image_format(),
          samples: 4,
          load_op: Clear,
          store_op: DontCare,
        },
        final_color: {
          format: swapchain.image_format(),
          samples: 1,
          load_op: DontCare,
          store_op: Store,
        },
        depth: {
          format: Format::D32_SFLOAT,
          samples: 4,
          load_op: Clear,
          store_op: DontCare,
        }
      },
      passes: [
        {
          color: [msaa_color],
          color_resolve: [final_color],
          depth_stencil: {depth},
          input: []
        },
        {
          color: [final_color],
          depth_stencil: {},
          input: []
        }
      ]
    )
    .unwrap();

    let scene_vs = scene_vs::load(self.device.clone())
      .unwrap()
      .entry_point("main")
      .unwrap();
    let scene_fs = scene_fs::load(self.device.clone())
      .unwrap()
      .entry_point("main")
      .unwrap();
    let sky_vs = sky_vs::load(self.device.clone())
      .unwrap()
      .entry_point("main")
      .unwrap();
    let sky_fs = sky_fs::load(self.device.clone())
      .unwrap()
      .entry_point("main")
      .unwrap();

    let swapchain_image_views: Vec<_> = images
      .iter()
      .map(|image| ImageView::new_default(image.clone()).unwrap())
      .collect();

    let (framebuffers, scene_pipeline, sky_pipeline) =
      window_size_dependent_setup(WindowSizeSetupConfig {
        window_size,
        images: &images,
        render_pass: &render_pass,
        memory_allocator: &self.memory_allocator,
        scene_vs: &scene_vs,
        scene_fs: &scene_fs,
        sky_vs: &sky_vs,
        sky_fs: &sky_fs,
      });

    let previous_frame_end = Some(sync::now(self.device.clone()).boxed());

    self.gui = Some(Gui::new_with_subpass(
      event_loop,
      surface.clone(),
      self.queue.clone(),
      Subpass::from(render_pass.clone(), 1).unwrap(),
      swapchain.image_format(),
      GuiConfig::default(),
    ));

    self.rcx = Some(RenderContext {
      window,
      swapchain,
      render_pass,
      framebuffers,
      scene_vs,
      scene_fs,
      sky_vs,
      sky_fs,
      scene_pipeline,
      sky_pipeline,
      recreate_swapchain: false,
      previous_frame_end,
      swapchain_image_views,
    });
  }

  fn window_event(
    &mut self,
    event_loop: &ActiveEventLoop,
    _window_id: WindowId,
    event: WindowEvent,
  ) {
    // egui needs to see every event for its own input bookkeeping. The
    // overlay has no interactive widgets, so nothing is withheld from the
    // simulation.
    if let Some(gui) = &mut self.gui {
      gui.update(&event);
    }

    let rcx = self.rcx.as_mut().unwrap();

    match event {
      WindowEvent::CloseRequested => {
        event_loop.exit();
      }
      WindowEvent::Resized(_) => {
        // Aspect ratio is recomputed from the new swapchain extent.
        rcx.recreate_swapchain = true;
      }
      WindowEvent::KeyboardInput { event: key_event, .. } => {
        if let PhysicalKey::Code(code) = key_event.physical_key {
          self.input.record(code, key_event.state);
        }
      }
      WindowEvent::RedrawRequested => {
        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        // Clamp to 100ms so a stall doesn't teleport the drone.
        let dt = frame_time.min(0.1);

        let window_size = rcx.window.inner_size();
        if window_size.width == 0 || window_size.height == 0 {
          return;
        }

        rcx.previous_frame_end.as_mut().unwrap().cleanup_finished();

        if rcx.recreate_swapchain || self.needs_pipeline_update {
          let (new_swapchain, new_images) = rcx
            .swapchain
            .recreate(SwapchainCreateInfo {
              image_extent: window_size.into(),
              ..rcx.swapchain.create_info()
            })
            .expect("failed to recreate swapchain");

          rcx.swapchain = new_swapchain;
          rcx.swapchain_image_views = new_images
            .iter()
            .map(|image| ImageView::new_default(image.clone()).unwrap())
            .collect();
          (rcx.framebuffers, rcx.scene_pipeline, rcx.sky_pipeline) =
            window_size_dependent_setup(WindowSizeSetupConfig {
              window_size,
              images: &new_images,
              render_pass: &rcx.render_pass,
              memory_allocator: &self.memory_allocator,
              scene_vs: &rcx.scene_vs,
              scene_fs: &rcx.scene_fs,
              sky_vs: &rcx.sky_vs,
              sky_fs: &rcx.sky_fs,
            });
          rcx.recreate_swapchain = false;
          self.needs_pipeline_update = false;
        }

        let extent = rcx.swapchain.image_extent();
        let aspect = extent[0] as f32 / extent[1] as f32;

        let Some(uniforms) = self.advance_simulation(dt, aspect) else {
          event_loop.exit();
          return;
        };
        let rcx = self.rcx.as_mut().unwrap();

        if let Some(gui) = &mut self.gui {
          gui::draw_overlay(
            gui,
            &mut self.hud,
            self.state.current(),
            &self.drone,
            self.camera_mode,
            self.sim_time,
          );
        }

        let global_buffer = upload_global(&self.uniform_buffer_allocator, &uniforms);
        let terrain_buffer = upload_object(&self.uniform_buffer_allocator, &uniforms.terrain);
        let drone_buffer = upload_object(&self.uniform_buffer_allocator, &uniforms.drone);
        let sky_buffer = upload_sky(&self.uniform_buffer_allocator, &uniforms);

        let scene_layout = &rcx.scene_pipeline.layout().set_layouts()[0];
        let terrain_set = DescriptorSet::new(
          self.descriptor_set_allocator.clone(),
          scene_layout.clone(),
          [
            WriteDescriptorSet::buffer(0, terrain_buffer),
            WriteDescriptorSet::buffer(1, global_buffer.clone()),
            WriteDescriptorSet::image_view_sampler(
              2,
              self.assets.terrain_texture.clone(),
              self.sampler.clone(),
            ),
          ],
          [],
        )
        .unwrap();
        let drone_set = DescriptorSet::new(
          self.descriptor_set_allocator.clone(),
          scene_layout.clone(),
          [
            WriteDescriptorSet::buffer(0, drone_buffer),
            WriteDescriptorSet::buffer(1, global_buffer),
            WriteDescriptorSet::image_view_sampler(
              2,
              self.assets.drone_texture.clone(),
              self.sampler.clone(),
            ),
          ],
          [],
        )
        .unwrap();

        let sky_layout = &rcx.sky_pipeline.layout().set_layouts()[0];
        let sky_set = DescriptorSet::new(
          self.descriptor_set_allocator.clone(),
          sky_layout.clone(),
          [
            WriteDescriptorSet::buffer(0, sky_buffer),
            WriteDescriptorSet::image_view_sampler(
              1,
              self.assets.skybox_texture.clone(),
              self.sampler.clone(),
            ),
          ],
          [],
        )
        .unwrap();

        let (image_index, suboptimal, acquire_future) =
          match acquire_next_image(rcx.swapchain.clone(), None).map_err(Validated::unwrap) {
            Ok(r) => r,
            Err(VulkanError::OutOfDate) => {
              rcx.recreate_swapchain = true;
              return;
            }
            Err(e) => panic!("failed to acquire next image: {e}"),
          };

        if suboptimal {
          rcx.recreate_swapchain = true;
        }

        if let Some(previous_frame_end) = rcx.previous_frame_end.as_mut() {
          previous_frame_end.cleanup_finished();
          if let Err(e) = previous_frame_end.flush() {
            println!("Failed to wait for previous frame: {e}");
            rcx.recreate_swapchain = true;
            return;
          }
        }

        let mut builder = AutoCommandBufferBuilder::primary(
          self.command_buffer_allocator.clone(),
          self.queue.queue_family_index(),
          CommandBufferUsage::OneTimeSubmit,
        )
        .unwrap();

        builder.build_app_render_pass(
          rcx,
          &[
            (terrain_set, &self.assets.terrain_mesh),
            (drone_set, &self.assets.drone_mesh),
          ],
          (sky_set, &self.assets.skybox_mesh),
          image_index,
          &mut self.gui,
        );

        let command_buffer = builder.build().unwrap();

        let final_future = sync::now(self.device.clone())
          .join(acquire_future)
          .then_execute(self.queue.clone(), command_buffer)
          .unwrap()
          .then_signal_semaphore()
          .then_swapchain_present(
            self.queue.clone(),
            SwapchainPresentInfo::swapchain_image_index(rcx.swapchain.clone(), image_index),
          )
          .then_signal_fence_and_flush();

        match final_future.map_err(Validated::unwrap) {
          Ok(future) => {
            rcx.previous_frame_end = Some(future.boxed());
          }
          Err(VulkanError::OutOfDate) => {
            rcx.recreate_swapchain = true;
            rcx.previous_frame_end = Some(sync::now(self.device.clone()).boxed());
          }
          Err(e) => {
            println!("Failed to flush future: {e}");
            rcx.previous_frame_end = Some(sync::now(self.device.clone()).boxed());
          }
        }
      }
      _ => {}
    }
  }

  fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
    // Continuous rendering: always queue the next frame.
    if let Some(rcx) = self.rcx.as_ref() {
      rcx.window.request_redraw();
    }
  }
}
