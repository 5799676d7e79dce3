use cascadeview_common::{RenderMode, SceneTransform};

/// Closed numeric range of one interactive control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlRange {
    pub min: f32,
    pub max: f32,
}

impl ControlRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, v: f32) -> f32 {
        v.clamp(self.min, self.max)
    }

    pub fn as_range(&self) -> std::ops::RangeInclusive<f32> {
        self.min..=self.max
    }
}

pub const POSITION_RANGE: ControlRange = ControlRange::new(-10.0, 10.0);
pub const SCALE_RANGE: ControlRange = ControlRange::new(0.0, 5.0);
pub const ROTATION_RANGE: ControlRange = ControlRange::new(0.0, 360.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }

    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// One interactive change to a scene's parameters.
///
/// Controls produce edits; the composer applies them to the stored
/// parameters and to every currently attached object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneEdit {
    Position(Axis, f32),
    Scale(Axis, f32),
    /// Degrees.
    Rotation(Axis, f32),
    RenderMode(RenderMode),
}

impl SceneEdit {
    /// Apply to `params`, clamping to the control's range.
    pub fn apply_to(&self, params: &mut SceneTransform) {
        match *self {
            SceneEdit::Position(axis, v) => params.position[axis.index()] = POSITION_RANGE.clamp(v),
            SceneEdit::Scale(axis, v) => params.scale[axis.index()] = SCALE_RANGE.clamp(v),
            SceneEdit::Rotation(axis, v) => {
                params.rotation_deg[axis.index()] = ROTATION_RANGE.clamp(v)
            }
            SceneEdit::RenderMode(mode) => params.render_mode = mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn edits_touch_one_component() {
        let mut p = SceneTransform::default();
        SceneEdit::Position(Axis::Y, 2.5).apply_to(&mut p);
        SceneEdit::Scale(Axis::Z, 3.0).apply_to(&mut p);
        SceneEdit::Rotation(Axis::X, 45.0).apply_to(&mut p);
        SceneEdit::RenderMode(RenderMode::DiffuseOnly).apply_to(&mut p);

        assert_eq!(p.position, Vec3::new(0.0, 2.5, 0.0));
        assert_eq!(p.scale, Vec3::new(1.0, 1.0, 3.0));
        assert_eq!(p.rotation_deg, Vec3::new(45.0, 0.0, 0.0));
        assert_eq!(p.render_mode, RenderMode::DiffuseOnly);
    }

    #[test]
    fn edits_clamp_to_control_ranges() {
        let mut p = SceneTransform::default();
        SceneEdit::Position(Axis::X, -50.0).apply_to(&mut p);
        SceneEdit::Scale(Axis::X, -1.0).apply_to(&mut p);
        SceneEdit::Rotation(Axis::Z, 720.0).apply_to(&mut p);

        assert_eq!(p.position.x, -10.0);
        assert_eq!(p.scale.x, 0.0);
        assert_eq!(p.rotation_deg.z, 360.0);
    }

    #[test]
    fn range_helpers() {
        assert_eq!(SCALE_RANGE.as_range(), 0.0..=5.0);
        assert_eq!(POSITION_RANGE.clamp(3.0), 3.0);
    }
}
