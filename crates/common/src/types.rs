use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an object attached to the live scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, for logs and readouts.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Spatial transform of an attached object: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Model matrix `T * R * S`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Per-scene output selector pushed into every mesh program of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RenderMode {
    /// Diffuse plus network output, clamped to `[0, 1]`.
    #[default]
    Normal,
    /// Diffuse texture only.
    DiffuseOnly,
    /// Network output only.
    SpecularOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("render mode index {0} out of range (expected 0, 1 or 2)")]
pub struct RenderModeError(pub i64);

impl RenderMode {
    pub const ALL: [RenderMode; 3] = [Self::Normal, Self::DiffuseOnly, Self::SpecularOnly];

    /// Index used by the shader uniform and the query string.
    pub fn index(self) -> u32 {
        match self {
            Self::Normal => 0,
            Self::DiffuseOnly => 1,
            Self::SpecularOnly => 2,
        }
    }

    pub fn from_index(index: i64) -> Result<Self, RenderModeError> {
        match index {
            0 => Ok(Self::Normal),
            1 => Ok(Self::DiffuseOnly),
            2 => Ok(Self::SpecularOnly),
            other => Err(RenderModeError(other)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::DiffuseOnly => "diffuse",
            Self::SpecularOnly => "specular",
        }
    }
}

/// Interactive parameters of one named scene.
///
/// Rotation is kept in degrees, the unit the controls and the query string
/// use; it is converted to radians only when applied to objects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneTransform {
    pub position: Vec3,
    pub scale: Vec3,
    pub rotation_deg: Vec3,
    pub render_mode: RenderMode,
}

impl Default for SceneTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation_deg: Vec3::ZERO,
            render_mode: RenderMode::Normal,
        }
    }
}

impl SceneTransform {
    /// Rigid transform with XYZ Euler rotation (`Rx * Ry * Rz`).
    pub fn to_transform(&self) -> Transform {
        let r = self.rotation_deg * (std::f32::consts::PI / 180.0);
        Transform {
            position: self.position,
            rotation: Quat::from_rotation_x(r.x)
                * Quat::from_rotation_y(r.y)
                * Quat::from_rotation_z(r.z),
            scale: self.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_uniqueness() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 8);
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn render_mode_index_round_trip() {
        for mode in RenderMode::ALL {
            assert_eq!(RenderMode::from_index(mode.index() as i64), Ok(mode));
        }
        assert_eq!(RenderMode::from_index(3), Err(RenderModeError(3)));
        assert_eq!(RenderMode::from_index(-1), Err(RenderModeError(-1)));
    }

    #[test]
    fn scene_transform_converts_degrees() {
        let st = SceneTransform {
            rotation_deg: Vec3::new(0.0, 0.0, 90.0),
            ..SceneTransform::default()
        };
        let t = st.to_transform();
        let rotated = t.rotation * Vec3::X;
        assert!((rotated - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn scene_transform_applies_translation_and_scale() {
        let st = SceneTransform {
            position: Vec3::new(2.0, 0.0, -1.0),
            scale: Vec3::new(2.0, 2.0, 2.0),
            ..SceneTransform::default()
        };
        let p = st.to_transform().matrix().transform_point3(Vec3::ONE);
        assert!((p - Vec3::new(4.0, 2.0, 1.0)).length() < 1e-6);
    }
}
