//! Scene composition: named scenes, their attached cascade objects, and the
//! interactive parameters applied to them.
//!
//! # Invariants
//! - Each `(scene, cascade)` object is attached at most once.
//! - A scene's parameters are applied to an object when it attaches and on
//!   every later edit; there is no live binding in between.
//! - Mesh leaves are reached through an exhaustive match on [`SceneNode`].

mod composer;
mod edit;
mod graph;
mod material;

pub use composer::{ComposeError, SceneComposer, SceneObject};
pub use edit::{Axis, ControlRange, SceneEdit, POSITION_RANGE, ROTATION_RANGE, SCALE_RANGE};
pub use graph::{MeshNode, SceneNode};
pub use material::AppearanceMaterial;
