//! Keyboard state tracking with per-frame edge detection.
//!
//! Winit delivers keyboard input as discrete press/release events; the
//! simulation wants two different views of that stream each frame:
//! * level-triggered held keys, for continuous motion (kinematics)
//! * edge-triggered "just pressed" keys, for one-shot actions (menu
//!   transitions, camera-mode switches) that must not repeat-fire while a
//!   key stays held
//!
//! `InputTracker` owns both sets explicitly, so the edge detector is plain
//! per-frame state rather than something hidden in statics, and the
//! simulation modules can be driven directly from tests.

use std::collections::HashSet;

use winit::{event::ElementState, keyboard::KeyCode};

/// Key assignments for the whole application.
pub mod bindings {
  use winit::keyboard::KeyCode;

  // Menu navigation
  pub const CONFIRM: KeyCode = KeyCode::Enter;
  pub const CANCEL: KeyCode = KeyCode::Escape;
  pub const HELP: KeyCode = KeyCode::KeyH;

  // Drone translation
  pub const FORWARD: KeyCode = KeyCode::KeyW;
  pub const BACKWARD: KeyCode = KeyCode::KeyS;
  pub const STRAFE_LEFT: KeyCode = KeyCode::KeyA;
  pub const STRAFE_RIGHT: KeyCode = KeyCode::KeyD;
  pub const ASCEND: KeyCode = KeyCode::Space;
  pub const DESCEND: KeyCode = KeyCode::ShiftLeft;

  // Drone attitude
  pub const TURN_LEFT: KeyCode = KeyCode::ArrowLeft;
  pub const TURN_RIGHT: KeyCode = KeyCode::ArrowRight;
  pub const PITCH_UP: KeyCode = KeyCode::ArrowUp;
  pub const PITCH_DOWN: KeyCode = KeyCode::ArrowDown;
  pub const ROLL_LEFT: KeyCode = KeyCode::KeyQ;
  pub const ROLL_RIGHT: KeyCode = KeyCode::KeyE;

  // Camera modes
  pub const CAMERA_CENTER: KeyCode = KeyCode::KeyI;
  pub const CAMERA_FOLLOW: KeyCode = KeyCode::KeyO;
  pub const CAMERA_COCKPIT: KeyCode = KeyCode::KeyP;
}

/// Tracks held keys across frames and released→pressed edges within the
/// current frame.
#[derive(Default)]
pub struct InputTracker {
  held: HashSet<KeyCode>,
  just_pressed: HashSet<KeyCode>,
}

impl InputTracker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Records one keyboard event. OS key-repeat shows up as repeated
  /// `Pressed` events for a key that is already held; those do not count as
  /// new edges.
  pub fn record(&mut self, key: KeyCode, state: ElementState) {
    match state {
      ElementState::Pressed => {
        if self.held.insert(key) {
          self.just_pressed.insert(key);
        }
      }
      ElementState::Released => {
        self.held.remove(&key);
      }
    }
  }

  /// Level-triggered: true while the key is down.
  pub fn is_held(&self, key: KeyCode) -> bool {
    self.held.contains(&key)
  }

  /// Edge-triggered: true only on the frame the key went down.
  pub fn was_just_pressed(&self, key: KeyCode) -> bool {
    self.just_pressed.contains(&key)
  }

  /// Clears the edge set. Call once per frame, after the simulation has
  /// consumed the snapshot.
  pub fn end_frame(&mut self) {
    self.just_pressed.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn press_is_an_edge_only_on_its_first_frame() {
    let mut input = InputTracker::new();
    input.record(KeyCode::Enter, ElementState::Pressed);
    assert!(input.is_held(KeyCode::Enter));
    assert!(input.was_just_pressed(KeyCode::Enter));

    input.end_frame();
    assert!(input.is_held(KeyCode::Enter));
    assert!(!input.was_just_pressed(KeyCode::Enter));
  }

  #[test]
  fn key_repeat_does_not_retrigger_the_edge() {
    let mut input = InputTracker::new();
    input.record(KeyCode::KeyW, ElementState::Pressed);
    input.end_frame();

    // OS auto-repeat while held
    input.record(KeyCode::KeyW, ElementState::Pressed);
    assert!(!input.was_just_pressed(KeyCode::KeyW));
  }

  #[test]
  fn release_then_press_triggers_a_new_edge() {
    let mut input = InputTracker::new();
    input.record(KeyCode::KeyP, ElementState::Pressed);
    input.end_frame();

    input.record(KeyCode::KeyP, ElementState::Released);
    input.record(KeyCode::KeyP, ElementState::Pressed);
    assert!(input.was_just_pressed(KeyCode::KeyP));
  }
}
