//! Menu / help / flight state machine.
//!
//! Transitions fire on key edges (not held keys), once per frame, before any
//! simulation work. Every transition changes which overlay is visible, so
//! the frame loop is told to rebuild its pipeline/overlay state whenever one
//! fires.

use crate::input::{InputTracker, bindings};

/// Which screen the application is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppState {
  Menu,
  Help,
  Playing,
}

/// Outcome of one state-machine step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateOutcome {
  /// A transition fired; the overlay topology changed and the rendering
  /// layer should rebuild.
  pub transitioned: bool,
}

pub struct StateMachine {
  state: AppState,
  should_close: bool,
}

impl StateMachine {
  pub fn new() -> Self {
    Self {
      state: AppState::Menu,
      should_close: false,
    }
  }

  pub fn current(&self) -> AppState {
    self.state
  }

  /// Quit requested from the menu; observed by the host loop.
  pub fn should_close(&self) -> bool {
    self.should_close
  }

  /// Evaluates at most one transition from the current frame's key edges.
  /// Unbound keys are no-ops.
  pub fn update(&mut self, input: &InputTracker) -> StateOutcome {
    let next = match self.state {
      AppState::Menu => {
        if input.was_just_pressed(bindings::CONFIRM) {
          Some(AppState::Playing)
        } else if input.was_just_pressed(bindings::HELP) {
          Some(AppState::Help)
        } else if input.was_just_pressed(bindings::CANCEL) {
          self.should_close = true;
          None
        } else {
          None
        }
      }
      AppState::Help => input
        .was_just_pressed(bindings::CANCEL)
        .then_some(AppState::Menu),
      AppState::Playing => input
        .was_just_pressed(bindings::CANCEL)
        .then_some(AppState::Menu),
    };

    match next {
      Some(state) => {
        self.state = state;
        StateOutcome { transitioned: true }
      }
      None => StateOutcome::default(),
    }
  }
}

impl Default for StateMachine {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use winit::{event::ElementState, keyboard::KeyCode};

  use super::*;

  fn press(key: KeyCode) -> InputTracker {
    let mut input = InputTracker::new();
    input.record(key, ElementState::Pressed);
    input
  }

  #[test]
  fn menu_confirm_starts_flying() {
    let mut sm = StateMachine::new();
    let outcome = sm.update(&press(KeyCode::Enter));
    assert_eq!(sm.current(), AppState::Playing);
    assert!(outcome.transitioned);
  }

  #[test]
  fn menu_help_and_back() {
    let mut sm = StateMachine::new();
    sm.update(&press(KeyCode::KeyH));
    assert_eq!(sm.current(), AppState::Help);

    sm.update(&press(KeyCode::Escape));
    assert_eq!(sm.current(), AppState::Menu);
  }

  #[test]
  fn playing_cancel_returns_to_menu() {
    let mut sm = StateMachine::new();
    sm.update(&press(KeyCode::Enter));
    let outcome = sm.update(&press(KeyCode::Escape));
    assert_eq!(sm.current(), AppState::Menu);
    assert!(outcome.transitioned);
    assert!(!sm.should_close());
  }

  #[test]
  fn menu_cancel_requests_quit_without_changing_state() {
    let mut sm = StateMachine::new();
    let outcome = sm.update(&press(KeyCode::Escape));
    assert_eq!(sm.current(), AppState::Menu);
    assert!(sm.should_close());
    assert!(!outcome.transitioned);
  }

  #[test]
  fn unbound_keys_are_noops_in_every_state() {
    for (state, setup_key) in [
      (AppState::Menu, None),
      (AppState::Help, Some(KeyCode::KeyH)),
      (AppState::Playing, Some(KeyCode::Enter)),
    ] {
      let mut sm = StateMachine::new();
      if let Some(key) = setup_key {
        sm.update(&press(key));
      }
      assert_eq!(sm.current(), state);

      let outcome = sm.update(&press(KeyCode::KeyZ));
      assert_eq!(sm.current(), state);
      assert!(!outcome.transitioned);
    }
  }

  #[test]
  fn held_keys_do_not_fire_transitions() {
    let mut sm = StateMachine::new();
    let mut input = press(KeyCode::Enter);
    sm.update(&input);
    assert_eq!(sm.current(), AppState::Playing);

    // Still held on the next frame, but no longer an edge.
    input.end_frame();
    let outcome = sm.update(&input);
    assert_eq!(sm.current(), AppState::Playing);
    assert!(!outcome.transitioned);
  }
}
