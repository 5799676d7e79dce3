//! Rendering adapter: renderer-agnostic interface over the scene composer.
//!
//! # Invariants
//! - Renderers never mutate the composer; render state derives from the
//!   composer and the view.
//! - Per-draw render modes are read from mesh leaves each frame.

mod renderer;
mod stats;

pub use renderer::{DebugTextRenderer, RenderView, Renderer};
pub use stats::FrameStats;
