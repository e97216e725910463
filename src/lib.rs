pub mod app;
pub mod camera;
pub mod core;
pub mod drone;
pub mod frame;
pub mod gui;
pub mod input;
pub mod lighting;
pub mod render;
pub mod shaders;
pub mod state;

// Re-export commonly used items
pub use app::App;
pub use camera::{CameraMode, ViewState};
pub use drone::DronePose;
pub use input::InputTracker;
pub use lighting::{LightState, light_at};
pub use state::{AppState, StateMachine};
