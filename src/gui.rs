//! Overlay text drawn with egui.
//!
//! The state machine decides which of the three overlays is visible: the
//! main menu, the help screen, or the in-flight HUD.

use std::time::Instant;

use egui_winit_vulkano::Gui;
use glam::Vec3;

use crate::{camera::CameraMode, drone::DronePose, lighting::CYCLE_PERIOD, state::AppState};

/// Frame-time bookkeeping for the HUD.
pub struct HudState {
  pub fps: f32,
  pub avg_fps: f32,
  frame_count: u32,
  frame_time_accumulator: f32,
  last_frame_time: Instant,
  last_avg_update: Instant,
}

impl Default for HudState {
  fn default() -> Self {
    Self {
      fps: 0.0,
      avg_fps: 0.0,
      frame_count: 0,
      frame_time_accumulator: 0.0,
      last_frame_time: Instant::now(),
      last_avg_update: Instant::now(),
    }
  }
}

impl HudState {
  fn tick(&mut self) -> f32 {
    let now = Instant::now();
    let frame_time = now.duration_since(self.last_frame_time).as_secs_f32();
    self.fps = 1.0 / frame_time.max(1e-6);
    self.frame_time_accumulator += frame_time;
    self.frame_count += 1;

    // Refresh the average once per second.
    if now.duration_since(self.last_avg_update).as_secs_f32() >= 1.0 {
      self.avg_fps = self.frame_count as f32 / self.frame_time_accumulator;
      self.frame_count = 0;
      self.frame_time_accumulator = 0.0;
      self.last_avg_update = now;
    }

    self.last_frame_time = now;
    frame_time
  }
}

/// Rough label for where the sun currently is in its cycle.
fn time_of_day(sim_time: f32) -> &'static str {
  let t = sim_time.rem_euclid(CYCLE_PERIOD);
  if t < CYCLE_PERIOD / 3.0 {
    "morning"
  } else if t < 2.0 * CYCLE_PERIOD / 3.0 {
    "afternoon"
  } else {
    "evening"
  }
}

fn mode_label(mode: CameraMode) -> &'static str {
  match mode {
    CameraMode::Center => "center",
    CameraMode::Follow => "follow",
    CameraMode::Cockpit => "cockpit",
  }
}

/// Draws the overlay for the current application state.
pub fn draw_overlay(
  gui: &mut Gui,
  hud: &mut HudState,
  state: AppState,
  pose: &DronePose,
  camera_mode: CameraMode,
  sim_time: f32,
) {
  let frame_time = hud.tick();

  gui.immediate_ui(|gui| {
    let ctx = gui.context();

    match state {
      AppState::Menu => {
        egui::Window::new("Drone Simulator")
          .collapsible(false)
          .resizable(false)
          .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
          .show(&ctx, |ui| {
            ui.label("Enter - start flying");
            ui.label("H - help");
            ui.label("Esc - quit");
          });
      }
      AppState::Help => {
        egui::Window::new("Help")
          .collapsible(false)
          .resizable(false)
          .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
          .show(&ctx, |ui| {
            ui.heading("Flight");
            ui.label("W/S - forward / backward");
            ui.label("A/D - strafe left / right");
            ui.label("Space/LShift - ascend / descend");
            ui.label("Arrows - yaw and pitch");
            ui.label("Q/E - roll");
            ui.separator();
            ui.heading("Camera");
            ui.label("I - center view");
            ui.label("O - follow view");
            ui.label("P - cockpit view");
            ui.separator();
            ui.label("Esc - back to menu");
          });
      }
      AppState::Playing => {
        egui::Window::new("HUD")
          .collapsible(false)
          .resizable(false)
          .default_pos([10.0, 10.0])
          .show(&ctx, |ui| {
            ui.label(format!("FPS: {:.1} (avg {:.1})", hud.fps, hud.avg_fps));
            ui.label(format!("Frame: {:.2}ms", frame_time * 1000.0));
            ui.separator();
            let Vec3 { x, y, z } = pose.position;
            ui.label(format!("Position: {x:.1}, {y:.1}, {z:.1}"));
            ui.label(format!(
              "Yaw {:.0}  Pitch {:.0}  Roll {:.0}",
              pose.yaw.to_degrees(),
              pose.pitch.to_degrees(),
              pose.roll.to_degrees()
            ));
            ui.separator();
            ui.label(format!("Camera: {}", mode_label(camera_mode)));
            ui.label(format!("Time of day: {}", time_of_day(sim_time)));
            ui.separator();
            ui.label("Esc - menu");
          });
      }
    }
  });
}
