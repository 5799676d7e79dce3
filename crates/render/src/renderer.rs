use std::fmt::Write as _;

use cascadeview_scene::SceneComposer;
use glam::{Mat4, Vec3};

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
    /// Clear colour, linear RGB.
    pub background: [f32; 3],
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 2.0, 3.464),
            target: Vec3::ZERO,
            up: Vec3::Z,
            fovy: 60.0,
            near: 0.01,
            far: 100.0,
            background: [1.0, 1.0, 1.0],
        }
    }
}

impl RenderView {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Right-handed projection with wgpu's `0..1` depth range.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fovy.to_radians(), aspect.max(1e-6), self.near, self.far)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }

    /// Direction from the eye to a world point, as the fragment program
    /// receives it (unnormalized).
    pub fn ray_to(&self, world: Vec3) -> Vec3 {
        world - self.eye
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// Renderers read the composer and a view, then produce output. They may
/// keep private caches (GPU uploads) but never change scene state.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&mut self, composer: &SceneComposer, view: &RenderView) -> Self::Output;
}

/// Produces a human-readable listing of the composed scenes.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, composer: &SceneComposer, view: &RenderView) -> String {
        tracing::trace!(objects = composer.object_count(), "text frame");
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Scenes: {} / objects: {} ===",
            composer.scene_names().count(),
            composer.object_count()
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) fovy={:.0}",
            view.eye.x, view.eye.y, view.eye.z, view.target.x, view.target.y, view.target.z, view.fovy
        );

        for (name, params) in composer.scene_params() {
            let p = params.position;
            let _ = writeln!(
                out,
                "scene {name}: pos=({:.2}, {:.2}, {:.2}) mode={}",
                p.x,
                p.y,
                p.z,
                params.render_mode.label()
            );
            for object in composer.objects(&name) {
                let hidden = object
                    .root
                    .first_material()
                    .map(|m| m.network.spec().hidden_dim)
                    .unwrap_or(0);
                let mut triangles = 0;
                object
                    .root
                    .visit_meshes(&mut |m| triangles += m.mesh.triangle_count());
                let _ = writeln!(
                    out,
                    "  [{}] cascade={} meshes={} triangles={} hidden={}",
                    object.id.short(),
                    object.cascade,
                    object.root.mesh_count(),
                    triangles,
                    hidden
                );
            }
        }

        out
    }
}
