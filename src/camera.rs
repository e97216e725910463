//! Camera mode selection and view-matrix construction.

use glam::{Mat3, Mat4, Vec3};

use crate::{
  drone::DronePose,
  input::{InputTracker, bindings},
};

/// Uniform scale applied to the drone model; the follow offset is expressed
/// in drone-model units and scaled by this.
pub const DRONE_SCALE: f32 = 0.5;

/// Center mode: above and behind the drone along world Z.
const CENTER_OFFSET: Vec3 = Vec3::new(0.0, 2.0, 5.0);
/// Follow mode offset in drone-model units, rotated by the drone's yaw.
const FOLLOW_OFFSET: Vec3 = Vec3::new(0.0, 3.0, 8.0);
/// Cockpit mode: just ahead of the airframe nose, rotated by yaw.
const COCKPIT_OFFSET: Vec3 = Vec3::new(0.0, 0.2, -0.6);

/// The three mutually exclusive camera behaviours.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMode {
  /// Fixed offset from the drone in world axes, always looking at it.
  Center,
  /// Chase camera behind the drone, sharing its full attitude.
  Follow,
  /// First-person view from the airframe.
  Cockpit,
}

/// View matrix plus the camera's resolved world position (used for
/// lighting, not navigation). Re-derived every frame, never persisted.
#[derive(Clone, Copy, Debug)]
pub struct ViewState {
  pub view: Mat4,
  pub camera_pos: Vec3,
}

impl CameraMode {
  /// Applies this frame's mode-select key edges. The keys are tested in the
  /// fixed order Center, Follow, Cockpit, so if several are pressed on the
  /// same frame the last one tested wins.
  pub fn select(self, input: &InputTracker) -> CameraMode {
    let mut mode = self;
    if input.was_just_pressed(bindings::CAMERA_CENTER) {
      mode = CameraMode::Center;
    }
    if input.was_just_pressed(bindings::CAMERA_FOLLOW) {
      mode = CameraMode::Follow;
    }
    if input.was_just_pressed(bindings::CAMERA_COCKPIT) {
      mode = CameraMode::Cockpit;
    }
    mode
  }

  /// Builds the view matrix for the current drone pose.
  pub fn build_view(self, pose: &DronePose) -> ViewState {
    let view = match self {
      CameraMode::Center => {
        let eye = pose.position + CENTER_OFFSET;
        // Roll is ignored in this mode: the horizon stays level.
        Mat4::look_at_rh(eye, pose.position, Vec3::Y)
      }
      CameraMode::Follow => {
        let offset = Mat3::from_rotation_y(pose.yaw) * (FOLLOW_OFFSET * DRONE_SCALE);
        look_in_direction(pose.position + offset, pose)
      }
      CameraMode::Cockpit => {
        let offset = Mat3::from_rotation_y(pose.yaw) * COCKPIT_OFFSET;
        look_in_direction(pose.position + offset, pose)
      }
    };

    // The camera's world position is the translation column of the inverse
    // view transform.
    let camera_pos = view.inverse().w_axis.truncate();
    ViewState { view, camera_pos }
  }
}

/// World-to-camera transform for a camera at `eye` sharing the drone's
/// attitude: translate to the eye, then undo yaw, pitch, roll in that order.
fn look_in_direction(eye: Vec3, pose: &DronePose) -> Mat4 {
  Mat4::from_rotation_z(-pose.roll)
    * Mat4::from_rotation_x(-pose.pitch)
    * Mat4::from_rotation_y(-pose.yaw)
    * Mat4::from_translation(-eye)
}

#[cfg(test)]
mod tests {
  use winit::{event::ElementState, keyboard::KeyCode};

  use super::*;

  const EPS: f32 = 1e-4;

  #[test]
  fn center_mode_keeps_the_drone_on_the_view_axis() {
    let pose = DronePose::new();
    let ViewState { view, .. } = CameraMode::Center.build_view(&pose);

    // look_at invariant: the target lies straight ahead, on -Z in camera
    // space.
    let target = view.transform_point3(pose.position);
    assert!(target.x.abs() < EPS);
    assert!(target.y.abs() < EPS);
    assert!(target.z < 0.0);
  }

  #[test]
  fn camera_pos_matches_the_constructed_eye() {
    let mut pose = DronePose::new();
    pose.position = Vec3::new(2.0, 4.0, -3.0);

    let state = CameraMode::Center.build_view(&pose);
    let expected = pose.position + CENTER_OFFSET;
    assert!((state.camera_pos - expected).length() < EPS);
  }

  #[test]
  fn cockpit_view_places_the_eye_at_the_origin_of_camera_space() {
    let mut pose = DronePose::new();
    pose.position = Vec3::new(1.0, 2.0, 3.0);
    pose.yaw = 0.9;
    pose.pitch = 0.3;
    pose.roll = -0.2;

    let state = CameraMode::Cockpit.build_view(&pose);
    let eye_in_camera = state.view.transform_point3(state.camera_pos);
    assert!(eye_in_camera.length() < EPS);
  }

  #[test]
  fn follow_view_is_a_rigid_transform() {
    let mut pose = DronePose::new();
    pose.yaw = 1.5;
    pose.pitch = -0.4;
    pose.roll = 0.7;

    let state = CameraMode::Follow.build_view(&pose);
    let a = state.view.transform_point3(Vec3::new(1.0, 0.0, 0.0));
    let b = state.view.transform_point3(Vec3::new(0.0, 1.0, 1.0));
    let before = (Vec3::new(1.0, 0.0, 0.0) - Vec3::new(0.0, 1.0, 1.0)).length();
    assert!(((a - b).length() - before).abs() < EPS);
  }

  #[test]
  fn last_tested_mode_key_wins() {
    let mut input = InputTracker::new();
    input.record(KeyCode::KeyI, ElementState::Pressed);
    input.record(KeyCode::KeyP, ElementState::Pressed);

    assert_eq!(CameraMode::Center.select(&input), CameraMode::Cockpit);
  }

  #[test]
  fn no_mode_key_keeps_the_current_mode() {
    let input = InputTracker::new();
    assert_eq!(CameraMode::Follow.select(&input), CameraMode::Follow);
  }
}
