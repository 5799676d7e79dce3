//! wgpu render backend for cascade viewing.
//!
//! Each composed object is drawn with the appearance program: diffuse and
//! specular feature textures are sampled at the fragment's UV and the
//! specular features, together with the view direction, are fed through the
//! packed two-layer network. The orbit camera circles a target with Z up.
//!
//! # Invariants
//! - The renderer never mutates scene state; it only caches GPU uploads.
//! - One pipeline per hidden dimension; the program is specialized by
//!   substituting the dimension into the WGSL template.
//! - Camera motion is not part of the composed scene.

mod camera;
mod context;
mod gpu;
mod shaders;

pub use camera::OrbitCamera;
pub use context::{GpuContext, RenderError};
pub use gpu::{WgpuRenderer, DEPTH_FORMAT};
pub use shaders::appearance_shader;
