//! Render context and swapchain-dependent resource creation.
//!
//! Two graphics pipelines share one render pass: the scene pipeline (terrain
//! and drone, textured + lit, normal depth writes) and the skybox pipeline
//! (unlit, depth test LESS_OR_EQUAL with writes disabled so it only fills
//! the far plane). Both are rebuilt together whenever the window is resized
//! or the application requests a pipeline rebuild.

use std::sync::Arc;

use vulkano::{
  device::DeviceOwned,
  format::Format,
  image::{Image, ImageCreateInfo, ImageType, ImageUsage, view::ImageView},
  memory::allocator::{AllocationCreateInfo, StandardMemoryAllocator},
  pipeline::{
    GraphicsPipeline,
    PipelineLayout,
    PipelineShaderStageCreateInfo,
    graphics::{
      GraphicsPipelineCreateInfo,
      color_blend::{ColorBlendAttachmentState, ColorBlendState},
      depth_stencil::{CompareOp, DepthState, DepthStencilState},
      input_assembly::InputAssemblyState,
      multisample::MultisampleState,
      rasterization::RasterizationState,
      vertex_input::{Vertex, VertexDefinition, VertexInputState},
      viewport::{Viewport, ViewportState},
    },
    layout::PipelineDescriptorSetLayoutCreateInfo,
  },
  render_pass::{Framebuffer, FramebufferCreateInfo, RenderPass, Subpass},
  shader::EntryPoint,
  swapchain::Swapchain,
  sync::GpuFuture,
};
use winit::{dpi::PhysicalSize, window::Window};

use crate::render::vertex::{Normal, Position, TexCoord};

/// All rendering resources whose lifetime is tied to the window/swapchain.
pub struct RenderContext {
  pub window: Arc<Window>,
  pub swapchain: Arc<Swapchain>,
  pub render_pass: Arc<RenderPass>,
  pub framebuffers: Vec<Arc<Framebuffer>>,
  pub scene_vs: EntryPoint,
  pub scene_fs: EntryPoint,
  pub sky_vs: EntryPoint,
  pub sky_fs: EntryPoint,
  pub scene_pipeline: Arc<GraphicsPipeline>,
  pub sky_pipeline: Arc<GraphicsPipeline>,
  pub recreate_swapchain: bool,
  pub previous_frame_end: Option<Box<dyn GpuFuture>>,
  pub swapchain_image_views: Vec<Arc<ImageView>>,
}

/// Inputs for (re)creating the size-dependent resources.
#[derive(Clone)]
pub struct WindowSizeSetupConfig<'a> {
  pub window_size: PhysicalSize<u32>,
  pub images: &'a [Arc<Image>],
  pub render_pass: &'a Arc<RenderPass>,
  pub memory_allocator: &'a Arc<StandardMemoryAllocator>,
  pub scene_vs: &'a EntryPoint,
  pub scene_fs: &'a EntryPoint,
  pub sky_vs: &'a EntryPoint,
  pub sky_fs: &'a EntryPoint,
}

/// Creates framebuffers and both pipelines. Called at startup and again on
/// every resize or requested rebuild.
pub fn window_size_dependent_setup(
  config: WindowSizeSetupConfig,
) -> (
  Vec<Arc<Framebuffer>>,
  Arc<GraphicsPipeline>,
  Arc<GraphicsPipeline>,
) {
  let memory_allocator = config.memory_allocator;

  // Shared 4x MSAA depth buffer. TRANSIENT_ATTACHMENT: never read back.
  let depth_buffer = ImageView::new_default(
    Image::new(
      memory_allocator.clone(),
      ImageCreateInfo {
        image_type: ImageType::Dim2d,
        format: Format::D32_SFLOAT,
        extent: config.images[0].extent(),
        usage: ImageUsage::DEPTH_STENCIL_ATTACHMENT | ImageUsage::TRANSIENT_ATTACHMENT,
        samples: vulkano::image::SampleCount::Sample4,
        ..Default::default()
      },
      AllocationCreateInfo::default(),
    )
    .unwrap(),
  )
  .unwrap();

  let framebuffers = config
    .images
    .iter()
    .map(|image| {
      let view = ImageView::new_default(image.clone()).unwrap();

      // Multisampled colour target, resolved to the swapchain image by the
      // render pass.
      let msaa_color = ImageView::new_default(
        Image::new(
          memory_allocator.clone(),
          ImageCreateInfo {
            image_type: ImageType::Dim2d,
            format: image.format(),
            extent: image.extent(),
            usage: ImageUsage::COLOR_ATTACHMENT | ImageUsage::TRANSIENT_ATTACHMENT,
            samples: vulkano::image::SampleCount::Sample4,
            ..Default::default()
          },
          AllocationCreateInfo::default(),
        )
        .unwrap(),
      )
      .unwrap();

      Framebuffer::new(
        config.render_pass.clone(),
        FramebufferCreateInfo {
          attachments: vec![msaa_color, view, depth_buffer.clone()],
          ..Default::default()
        },
      )
      .unwrap()
    })
    .collect::<Vec<_>>();

  let scene_vertex_input = [
    Position::per_vertex(),
    Normal::per_vertex(),
    TexCoord::per_vertex(),
  ]
  .definition(config.scene_vs)
  .unwrap();

  // The skybox shader only consumes position + texture coordinates.
  let sky_vertex_input = [Position::per_vertex(), TexCoord::per_vertex()]
    .definition(config.sky_vs)
    .unwrap();

  let scene_pipeline = build_pipeline(
    config.window_size,
    config.render_pass,
    config.scene_vs,
    config.scene_fs,
    scene_vertex_input,
    DepthState::simple(),
  );

  let sky_pipeline = build_pipeline(
    config.window_size,
    config.render_pass,
    config.sky_vs,
    config.sky_fs,
    sky_vertex_input,
    DepthState {
      write_enable: false,
      compare_op: CompareOp::LessOrEqual,
    },
  );

  (framebuffers, scene_pipeline, sky_pipeline)
}

fn build_pipeline(
  window_size: PhysicalSize<u32>,
  render_pass: &Arc<RenderPass>,
  vs: &EntryPoint,
  fs: &EntryPoint,
  vertex_input_state: VertexInputState,
  depth: DepthState,
) -> Arc<GraphicsPipeline> {
  let device = render_pass.device();

  let stages = [
    PipelineShaderStageCreateInfo::new(vs.clone()),
    PipelineShaderStageCreateInfo::new(fs.clone()),
  ];

  let layout = PipelineLayout::new(
    device.clone(),
    PipelineDescriptorSetLayoutCreateInfo::from_stages(&stages)
      .into_pipeline_layout_create_info(device.clone())
      .unwrap(),
  )
  .unwrap();

  let subpass = Subpass::from(render_pass.clone(), 0).unwrap();

  GraphicsPipeline::new(
    device.clone(),
    None,
    GraphicsPipelineCreateInfo {
      stages: stages.into_iter().collect(),
      vertex_input_state: Some(vertex_input_state),
      input_assembly_state: Some(InputAssemblyState::default()),
      viewport_state: Some(ViewportState {
        viewports: [Viewport {
          offset: [0.0, 0.0],
          extent: window_size.into(),
          depth_range: 0.0..=1.0,
        }]
        .into_iter()
        .collect(),
        ..Default::default()
      }),
      rasterization_state: Some(RasterizationState {
        cull_mode: vulkano::pipeline::graphics::rasterization::CullMode::None,
        ..Default::default()
      }),
      depth_stencil_state: Some(DepthStencilState {
        depth: Some(depth),
        ..Default::default()
      }),
      multisample_state: Some(MultisampleState {
        rasterization_samples: vulkano::image::SampleCount::Sample4,
        ..Default::default()
      }),
      color_blend_state: Some(ColorBlendState::with_attachment_states(
        subpass.num_color_attachments(),
        ColorBlendAttachmentState::default(),
      )),
      subpass: Some(subpass.into()),
      ..GraphicsPipelineCreateInfo::layout(layout)
    },
  )
  .unwrap()
}
