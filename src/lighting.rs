//! Day/night lighting cycle.
//!
//! A pure function of the simulation clock: the sun sweeps a full circle
//! every [`CYCLE_PERIOD`] seconds while the light colour blends through
//! dawn, noon and sunset anchors, one 60-second phase each. Each phase uses
//! a cubic Hermite blend factor instead of a linear one so the colour rate
//! is continuous at the phase boundaries.

use glam::Vec3;

/// Full day length in simulation seconds.
pub const CYCLE_PERIOD: f32 = 180.0;
/// Length of each of the three colour phases.
const PHASE: f32 = CYCLE_PERIOD / 3.0;

pub const DAWN_COLOR: Vec3 = Vec3::new(1.0, 0.55, 0.35);
pub const NOON_COLOR: Vec3 = Vec3::new(1.0, 0.98, 0.92);
pub const SUNSET_COLOR: Vec3 = Vec3::new(0.95, 0.45, 0.30);

/// Never let the scene go fully dark.
const MIN_INTENSITY: f32 = 0.3;

/// Directional light for one frame. No identity is carried across frames;
/// this is recomputed from the clock every time.
#[derive(Clone, Copy, Debug)]
pub struct LightState {
  pub color: Vec3,
  /// Unit direction toward the sun.
  pub direction: Vec3,
  /// In `[MIN_INTENSITY, 1.0]`.
  pub intensity: f32,
}

/// Zero-derivative-at-endpoints cubic blend.
fn smooth(x: f32) -> f32 {
  x * x * (3.0 - 2.0 * x)
}

/// Evaluates the cycle at simulation time `t` (seconds, any non-negative
/// value; wrapped modulo the period).
pub fn light_at(t: f32) -> LightState {
  let t = t.rem_euclid(CYCLE_PERIOD);

  let (from, to) = if t < PHASE {
    (DAWN_COLOR, NOON_COLOR)
  } else if t < 2.0 * PHASE {
    (NOON_COLOR, SUNSET_COLOR)
  } else {
    (SUNSET_COLOR, DAWN_COLOR)
  };
  let color = from.lerp(to, smooth((t % PHASE) / PHASE));

  // Simplified circular sweep with a fixed elevation bias, not real
  // astronomy.
  let angle = t / CYCLE_PERIOD * std::f32::consts::TAU;
  let direction = Vec3::new(angle.cos(), angle.sin(), 0.3).normalize();

  let intensity = direction.dot(Vec3::Y).clamp(MIN_INTENSITY, 1.0);

  LightState {
    color,
    direction,
    intensity,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const EPS: f32 = 1e-4;

  #[test]
  fn cycle_is_periodic() {
    for t in [0.0, 13.7, 59.9, 60.0, 90.0, 179.5] {
      let a = light_at(t);
      let b = light_at(t + CYCLE_PERIOD);
      assert!((a.color - b.color).length() < EPS);
      assert!((a.direction - b.direction).length() < EPS);
      assert!((a.intensity - b.intensity).abs() < EPS);
    }
  }

  #[test]
  fn intensity_stays_within_bounds() {
    let mut t = 0.0;
    while t < CYCLE_PERIOD {
      let light = light_at(t);
      assert!(light.intensity >= 0.3 - EPS);
      assert!(light.intensity <= 1.0 + EPS);
      t += 0.5;
    }
  }

  #[test]
  fn direction_is_unit_length() {
    for t in [0.0, 45.0, 90.0, 135.0] {
      assert!((light_at(t).direction.length() - 1.0).abs() < EPS);
    }
  }

  #[test]
  fn dawn_at_the_start_of_the_cycle() {
    let light = light_at(0.0);
    assert!((light.color - DAWN_COLOR).length() < EPS);
  }

  #[test]
  fn mid_phase_is_the_half_blend() {
    // smooth(0.5) == 0.5, so t = 30 is exactly the dawn/noon midpoint.
    let light = light_at(30.0);
    let expected = DAWN_COLOR.lerp(NOON_COLOR, 0.5);
    assert!((light.color - expected).length() < EPS);
  }

  #[test]
  fn color_is_continuous_at_phase_boundaries() {
    for boundary in [60.0, 120.0, 180.0] {
      let before = light_at(boundary - 1e-3);
      let after = light_at(boundary + 1e-3);
      assert!((before.color - after.color).length() < 1e-2);
    }
  }
}
