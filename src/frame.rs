//! Per-frame uniform composition.
//!
//! Everything here is a pure function of the drone pose, the selected view,
//! the light state and the clock. The resulting blocks are written into
//! uniform subbuffers by the frame loop and handed to the GPU; nothing is
//! kept across frames.

use glam::{Mat3, Mat4, Quat, Vec3};

use crate::{
  camera::{DRONE_SCALE, ViewState},
  drone::DronePose,
  lighting::LightState,
};

/// Vertical field of view, radians.
const FOV_Y: f32 = 45.0 * std::f32::consts::PI / 180.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;

/// Static placement of the mountain terrain.
const TERRAIN_SCALE: f32 = 10.0;
const TERRAIN_OFFSET: Vec3 = Vec3::new(0.0, -2.0, 0.0);

/// The skybox cube is scaled out well past the scene and given a fixed yaw
/// so its texture seams sit behind the terrain.
const SKYBOX_SCALE: f32 = 80.0;
const SKYBOX_YAW: f32 = std::f32::consts::FRAC_PI_4;

/// Transform block for one drawable object.
#[derive(Clone, Copy, Debug)]
pub struct ObjectUniforms {
  pub model: Mat4,
  pub mvp: Mat4,
  /// `transpose(inverse(model))`, for transforming surface normals.
  pub normal: Mat4,
}

impl ObjectUniforms {
  pub fn new(model: Mat4, view_proj: Mat4) -> Self {
    Self {
      model,
      mvp: view_proj * model,
      normal: model.inverse().transpose(),
    }
  }
}

/// Per-frame shared block: camera, clock and light.
#[derive(Clone, Copy, Debug)]
pub struct GlobalUniforms {
  pub view: Mat4,
  pub proj: Mat4,
  pub camera_pos: Vec3,
  pub time: f32,
  pub light: LightState,
}

/// All uniform blocks for one frame, in upload order.
#[derive(Clone, Copy, Debug)]
pub struct FrameUniforms {
  pub terrain: ObjectUniforms,
  pub drone: ObjectUniforms,
  pub skybox_mvp: Mat4,
  pub global: GlobalUniforms,
}

/// Perspective projection with the Y flip Vulkan clip space requires.
pub fn projection(aspect: f32) -> Mat4 {
  let mut proj = Mat4::perspective_rh(FOV_Y, aspect, Z_NEAR, Z_FAR);
  proj.y_axis.y *= -1.0;
  proj
}

/// Composes every uniform block for the frame.
pub fn compose(
  pose: &DronePose,
  view_state: &ViewState,
  light: LightState,
  time: f32,
  aspect: f32,
) -> FrameUniforms {
  let proj = projection(aspect);
  let view_proj = proj * view_state.view;

  let terrain_model =
    Mat4::from_translation(TERRAIN_OFFSET) * Mat4::from_scale(Vec3::splat(TERRAIN_SCALE));

  let drone_model = Mat4::from_scale_rotation_translation(
    Vec3::splat(DRONE_SCALE),
    Quat::from_rotation_y(pose.yaw) * Quat::from_rotation_x(pose.pitch) * Quat::from_rotation_z(pose.roll),
    pose.position,
  );

  // The skybox must never translate with the camera: strip the view down to
  // its rotation before projecting.
  let view_rotation = Mat4::from_mat3(Mat3::from_mat4(view_state.view));
  let skybox_model =
    Mat4::from_rotation_y(SKYBOX_YAW) * Mat4::from_scale(Vec3::splat(SKYBOX_SCALE));
  let skybox_mvp = proj * view_rotation * skybox_model;

  FrameUniforms {
    terrain: ObjectUniforms::new(terrain_model, view_proj),
    drone: ObjectUniforms::new(drone_model, view_proj),
    skybox_mvp,
    global: GlobalUniforms {
      view: view_state.view,
      proj,
      camera_pos: view_state.camera_pos,
      time,
      light,
    },
  }
}

#[cfg(test)]
mod tests {
  use crate::{camera::CameraMode, lighting::light_at};

  use super::*;

  const EPS: f32 = 1e-4;

  #[test]
  fn projection_flips_the_y_axis() {
    let proj = projection(16.0 / 9.0);
    assert!(proj.y_axis.y < 0.0);
  }

  #[test]
  fn normal_matrix_preserves_normal_orthogonality() {
    // translate + rotate + uniform scale, the only model-matrix shapes this
    // application produces.
    let model = Mat4::from_scale_rotation_translation(
      Vec3::splat(2.5),
      Quat::from_rotation_y(0.8) * Quat::from_rotation_x(-0.3),
      Vec3::new(4.0, -1.0, 2.0),
    );
    let uniforms = ObjectUniforms::new(model, Mat4::IDENTITY);

    let normal = Vec3::Y;
    let tangent = Vec3::X;
    let transformed_normal = uniforms.normal.transform_vector3(normal);
    let transformed_tangent = model.transform_vector3(tangent);

    assert!(
      transformed_normal
        .normalize()
        .dot(transformed_tangent.normalize())
        .abs()
        < EPS
    );
  }

  #[test]
  fn mvp_is_projection_times_view_times_model() {
    let pose = DronePose::new();
    let view = CameraMode::Center.build_view(&pose);
    let uniforms = compose(&pose, &view, light_at(0.0), 0.0, 1.5);

    let expected = projection(1.5) * view.view * uniforms.drone.model;
    let diff = uniforms
      .drone
      .mvp
      .to_cols_array()
      .iter()
      .zip(expected.to_cols_array().iter())
      .map(|(a, b)| (a - b).abs())
      .fold(0.0_f32, f32::max);
    assert!(diff < EPS);
  }

  #[test]
  fn skybox_ignores_camera_translation() {
    // Same attitude, different positions: cockpit views differ only by
    // translation, so the skybox transform must be identical.
    let mut near = DronePose::new();
    near.yaw = 0.6;
    near.pitch = 0.2;
    let mut far = near;
    far.position += Vec3::new(10.0, 5.0, -20.0);

    let a = compose(
      &near,
      &CameraMode::Cockpit.build_view(&near),
      light_at(0.0),
      0.0,
      1.0,
    );
    let b = compose(
      &far,
      &CameraMode::Cockpit.build_view(&far),
      light_at(0.0),
      0.0,
      1.0,
    );

    let diff = a
      .skybox_mvp
      .to_cols_array()
      .iter()
      .zip(b.skybox_mvp.to_cols_array().iter())
      .map(|(x, y)| (x - y).abs())
      .fold(0.0_f32, f32::max);
    assert!(diff < EPS);
  }

  #[test]
  fn drone_model_places_the_mesh_at_the_pose_position() {
    let mut pose = DronePose::new();
    pose.position = Vec3::new(3.0, 7.0, -2.0);
    pose.yaw = 1.1;

    let view = CameraMode::Follow.build_view(&pose);
    let uniforms = compose(&pose, &view, light_at(10.0), 10.0, 1.0);

    let origin = uniforms.drone.model.transform_point3(Vec3::ZERO);
    assert!((origin - pose.position).length() < EPS);
  }
}
