//! GLSL shader compilation and loading.
//!
//! Shaders are compiled from the GLSL sources in `src/shaders/` at build
//! time via the vulkano_shaders macro, which also generates the Rust structs
//! matching each uniform block (`ObjectData`, `GlobalData`, `SkyData`).

/// Scene vertex shader: applies the per-object mvp and forwards world-space
/// normal/position for lighting.
pub mod scene_vs {
  vulkano_shaders::shader! {
    ty: "vertex",
    path: "src/shaders/scene.vert.glsl",
  }
}

/// Scene fragment shader: textured lambertian shading driven by the global
/// light block.
pub mod scene_fs {
  vulkano_shaders::shader! {
    ty: "fragment",
    path: "src/shaders/scene.frag.glsl",
  }
}

/// Skybox vertex shader: mvp only, depth pinned to the far plane.
pub mod sky_vs {
  vulkano_shaders::shader! {
    ty: "vertex",
    path: "src/shaders/sky.vert.glsl",
  }
}

/// Skybox fragment shader: unlit texture sample.
pub mod sky_fs {
  vulkano_shaders::shader! {
    ty: "fragment",
    path: "src/shaders/sky.frag.glsl",
  }
}
