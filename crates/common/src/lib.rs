//! Shared types: object identity, rigid transforms, per-scene parameters.

mod types;

pub use types::{ObjectId, RenderMode, RenderModeError, SceneTransform, Transform};
