use std::sync::Arc;

use egui_winit_vulkano::Gui;
use vulkano::{
  command_buffer::{
    AutoCommandBufferBuilder, RenderPassBeginInfo, SubpassBeginInfo, SubpassContents,
    SubpassEndInfo,
  },
  descriptor_set::DescriptorSet,
  pipeline::{Pipeline, PipelineBindPoint},
};

use crate::render::{model::MeshBuffers, pipeline::RenderContext};

/// Matches the original window clear colour.
const BACKGROUND: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

pub(crate) trait AutoCommandBufferBuilderExt<L> {
  /// Records the whole frame: opaque objects first, the skybox last (it
  /// only wins depth tests at the far plane), then the overlay subpass.
  fn build_app_render_pass(
    &mut self,
    rcx: &mut RenderContext,
    scene_draws: &[(Arc<DescriptorSet>, &MeshBuffers)],
    sky_draw: (Arc<DescriptorSet>, &MeshBuffers),
    image_index: u32,
    gui: &mut Option<Gui>,
  );
}

impl<L> AutoCommandBufferBuilderExt<L> for AutoCommandBufferBuilder<L> {
  fn build_app_render_pass(
    &mut self,
    rcx: &mut RenderContext,
    scene_draws: &[(Arc<DescriptorSet>, &MeshBuffers)],
    sky_draw: (Arc<DescriptorSet>, &MeshBuffers),
    image_index: u32,
    gui: &mut Option<Gui>,
  ) {
    self
      .begin_render_pass(
        RenderPassBeginInfo {
          clear_values: vec![
            Some(BACKGROUND.into()), // msaa_color
            None,                    // final_color (DontCare)
            Some(1.0.into()),        // depth
          ],
          ..RenderPassBeginInfo::framebuffer(rcx.framebuffers[image_index as usize].clone())
        },
        SubpassBeginInfo {
          contents: SubpassContents::Inline,
          ..Default::default()
        },
      )
      .unwrap();

    self.bind_pipeline_graphics(rcx.scene_pipeline.clone()).unwrap();

    for (descriptor_set, mesh) in scene_draws {
      self
        .bind_descriptor_sets(
          PipelineBindPoint::Graphics,
          rcx.scene_pipeline.layout().clone(),
          0,
          descriptor_set.clone(),
        )
        .unwrap()
        .bind_vertex_buffers(
          0,
          (
            mesh.positions.clone(),
            mesh.normals.clone(),
            mesh.tex_coords.clone(),
          ),
        )
        .unwrap()
        .bind_index_buffer(mesh.indices.clone())
        .unwrap();

      unsafe { self.draw_indexed(mesh.indices.len() as u32, 1, 0, 0, 0) }.unwrap();
    }

    let (sky_set, sky_mesh) = sky_draw;
    self
      .bind_pipeline_graphics(rcx.sky_pipeline.clone())
      .unwrap()
      .bind_descriptor_sets(
        PipelineBindPoint::Graphics,
        rcx.sky_pipeline.layout().clone(),
        0,
        sky_set,
      )
      .unwrap()
      .bind_vertex_buffers(0, (sky_mesh.positions.clone(), sky_mesh.tex_coords.clone()))
      .unwrap()
      .bind_index_buffer(sky_mesh.indices.clone())
      .unwrap();

    unsafe { self.draw_indexed(sky_mesh.indices.len() as u32, 1, 0, 0, 0) }.unwrap();

    // Overlay subpass
    self
      .next_subpass(
        SubpassEndInfo::default(),
        SubpassBeginInfo {
          contents: SubpassContents::SecondaryCommandBuffers,
          ..Default::default()
        },
      )
      .unwrap();

    if let Some(gui) = gui {
      let cb = gui.draw_on_subpass_image([
        rcx.swapchain.image_extent()[0],
        rcx.swapchain.image_extent()[1],
      ]);
      self.execute_commands(cb).unwrap();
    }

    self.end_render_pass(SubpassEndInfo::default()).unwrap();
  }
}
