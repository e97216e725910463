//! Drone pose and kinematics integration.
//!
//! Direct integration of position and attitude from held keys, no physics:
//! no velocity state, no damping, no collision. Angles are not clamped or
//! wrapped; the view builder only ever feeds them into rotation matrices,
//! which are periodic anyway.

use glam::{Mat3, Vec3};

use crate::input::{InputTracker, bindings};

/// Attitude rate, 45 degrees per second in radians.
pub const ROT_SPEED: f32 = 45.0 * std::f32::consts::PI / 180.0;
/// Translation rate, world units per second.
pub const MOVE_SPEED: f32 = 4.0;

/// Position plus yaw/pitch/roll of the simulated vehicle. The only
/// simulation state carried across frames besides the clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DronePose {
  pub position: Vec3,
  pub yaw: f32,
  pub pitch: f32,
  pub roll: f32,
}

impl DronePose {
  pub fn new() -> Self {
    Self {
      position: Vec3::new(0.0, 1.0, 0.0),
      yaw: 0.0,
      pitch: 0.0,
      roll: 0.0,
    }
  }

  /// Horizontal forward direction. Translation follows yaw only; pitch and
  /// roll tilt the airframe without leaving the horizontal plane.
  pub fn forward(&self) -> Vec3 {
    Mat3::from_rotation_y(self.yaw) * Vec3::NEG_Z
  }

  /// Horizontal right direction, yaw only.
  pub fn right(&self) -> Vec3 {
    Mat3::from_rotation_y(self.yaw) * Vec3::X
  }

  /// Advances the pose by `dt` seconds of held input. `dt` is assumed
  /// non-negative and finite.
  pub fn integrate(&mut self, input: &InputTracker, dt: f32) {
    if input.is_held(bindings::TURN_LEFT) {
      self.yaw += ROT_SPEED * dt;
    }
    if input.is_held(bindings::TURN_RIGHT) {
      self.yaw -= ROT_SPEED * dt;
    }
    if input.is_held(bindings::PITCH_UP) {
      self.pitch += ROT_SPEED * dt;
    }
    if input.is_held(bindings::PITCH_DOWN) {
      self.pitch -= ROT_SPEED * dt;
    }
    if input.is_held(bindings::ROLL_LEFT) {
      self.roll -= ROT_SPEED * dt;
    }
    if input.is_held(bindings::ROLL_RIGHT) {
      self.roll += ROT_SPEED * dt;
    }

    let step = MOVE_SPEED * dt;
    if input.is_held(bindings::FORWARD) {
      self.position += self.forward() * step;
    }
    if input.is_held(bindings::BACKWARD) {
      self.position -= self.forward() * step;
    }
    if input.is_held(bindings::STRAFE_RIGHT) {
      self.position += self.right() * step;
    }
    if input.is_held(bindings::STRAFE_LEFT) {
      self.position -= self.right() * step;
    }
    if input.is_held(bindings::ASCEND) {
      self.position += Vec3::Y * step;
    }
    if input.is_held(bindings::DESCEND) {
      self.position -= Vec3::Y * step;
    }
  }
}

impl Default for DronePose {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use winit::{event::ElementState, keyboard::KeyCode};

  use super::*;

  const EPS: f32 = 1e-5;

  fn hold(keys: &[KeyCode]) -> InputTracker {
    let mut input = InputTracker::new();
    for &key in keys {
      input.record(key, ElementState::Pressed);
    }
    input
  }

  fn assert_vec3_eq(a: Vec3, b: Vec3) {
    assert!((a - b).length() < EPS, "{a:?} != {b:?}");
  }

  #[test]
  fn forward_key_moves_along_the_yaw_direction() {
    let mut pose = DronePose::new();
    pose.yaw = 0.7;
    let start = pose.position;
    let forward = pose.forward();

    pose.integrate(&hold(&[KeyCode::KeyW]), 0.5);
    assert_vec3_eq(pose.position, start + forward * (MOVE_SPEED * 0.5));
  }

  #[test]
  fn ascend_moves_along_world_up_regardless_of_attitude() {
    let mut pose = DronePose::new();
    pose.yaw = 1.2;
    pose.pitch = 0.8;
    pose.roll = -0.4;
    let start = pose.position;

    pose.integrate(&hold(&[KeyCode::Space]), 0.25);
    assert_vec3_eq(pose.position, start + Vec3::Y * MOVE_SPEED * 0.25);
  }

  #[test]
  fn attitude_rates_are_rot_speed() {
    let mut pose = DronePose::new();
    pose.integrate(
      &hold(&[KeyCode::ArrowLeft, KeyCode::ArrowUp, KeyCode::KeyE]),
      2.0,
    );
    assert!((pose.yaw - ROT_SPEED * 2.0).abs() < EPS);
    assert!((pose.pitch - ROT_SPEED * 2.0).abs() < EPS);
    assert!((pose.roll - ROT_SPEED * 2.0).abs() < EPS);

    pose.integrate(
      &hold(&[KeyCode::ArrowRight, KeyCode::ArrowDown, KeyCode::KeyQ]),
      2.0,
    );
    assert!(pose.yaw.abs() < EPS);
    assert!(pose.pitch.abs() < EPS);
    assert!(pose.roll.abs() < EPS);
  }

  #[test]
  fn translation_ignores_pitch_and_roll() {
    let mut pose = DronePose::new();
    pose.pitch = 1.3;
    pose.roll = -0.9;
    let start_y = pose.position.y;

    pose.integrate(&hold(&[KeyCode::KeyW]), 1.0);
    assert!((pose.position.y - start_y).abs() < EPS);
  }

  #[test]
  fn two_half_steps_equal_one_full_step() {
    // Pure translation is linear in dt as long as yaw is not changing.
    let input = hold(&[KeyCode::KeyW, KeyCode::KeyD, KeyCode::Space]);

    let mut single = DronePose::new();
    single.yaw = 0.3;
    let mut halved = single;

    single.integrate(&input, 0.8);
    halved.integrate(&input, 0.4);
    halved.integrate(&input, 0.4);

    assert_vec3_eq(single.position, halved.position);
  }

  #[test]
  fn zero_dt_is_the_identity() {
    let mut pose = DronePose::new();
    pose.yaw = 0.5;
    pose.pitch = -0.2;
    pose.position = Vec3::new(3.0, 2.0, -1.0);
    let before = pose;

    pose.integrate(
      &hold(&[KeyCode::KeyW, KeyCode::ArrowLeft, KeyCode::KeyQ]),
      0.0,
    );
    assert_eq!(pose, before);
  }
}
