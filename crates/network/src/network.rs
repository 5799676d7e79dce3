use cascadeview_common::RenderMode;
use glam::{Vec3, Vec4};

use crate::{pack, NetworkError, PackedWeightTexture, WeightMatrix};

/// View direction (3) plus auxiliary features (3).
pub const INPUT_DIM: usize = 6;
/// RGB radiance.
pub const OUTPUT_DIM: usize = 3;

/// Layer shapes of one appearance network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkSpec {
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub output_dim: usize,
}

impl NetworkSpec {
    /// Derive the shape from layer 0 (`6 x hidden`) and layer 1 (`hidden x 3`).
    pub fn from_layers(layer0: &WeightMatrix, layer1: &WeightMatrix) -> Result<Self, NetworkError> {
        if layer0.outer() != INPUT_DIM {
            return Err(NetworkError::InputDim(layer0.outer()));
        }
        let hidden_dim = layer0.inner();
        if hidden_dim == 0 || hidden_dim % 4 != 0 {
            return Err(NetworkError::HiddenDim(hidden_dim));
        }
        if layer1.outer() != hidden_dim {
            return Err(NetworkError::LayerMismatch {
                hidden: hidden_dim,
                layer1: layer1.outer(),
            });
        }
        if layer1.inner() != OUTPUT_DIM {
            return Err(NetworkError::OutputDim(layer1.inner()));
        }
        Ok(Self {
            input_dim: INPUT_DIM,
            hidden_dim,
            output_dim: OUTPUT_DIM,
        })
    }
}

/// A two-layer appearance network backed by its packed weight textures.
///
/// This is the CPU twin of the per-pixel GPU program: every weight is read
/// with [`PackedWeightTexture::texel`] at the coordinates the shader fetches.
/// A `spec` that disagrees with the texture extents is not detected; the
/// missing texels read as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct AppearanceNetwork {
    spec: NetworkSpec,
    layer0: PackedWeightTexture,
    layer1: PackedWeightTexture,
}

impl AppearanceNetwork {
    /// Validate shapes and pack both layers.
    pub fn from_layers(layer0: &WeightMatrix, layer1: &WeightMatrix) -> Result<Self, NetworkError> {
        let spec = NetworkSpec::from_layers(layer0, layer1)?;
        Ok(Self {
            spec,
            layer0: pack(layer0)?,
            layer1: pack(layer1)?,
        })
    }

    /// Assemble from already packed textures without checking their extents.
    pub fn from_packed(
        spec: NetworkSpec,
        layer0: PackedWeightTexture,
        layer1: PackedWeightTexture,
    ) -> Self {
        Self {
            spec,
            layer0,
            layer1,
        }
    }

    pub fn spec(&self) -> NetworkSpec {
        self.spec
    }

    pub fn layer0(&self) -> &PackedWeightTexture {
        &self.layer0
    }

    pub fn layer1(&self) -> &PackedWeightTexture {
        &self.layer1
    }

    /// Evaluate the network for one pixel.
    ///
    /// `features` are the first three channels of the specular texel.
    /// `view_dir` need not be normalized; a zero direction stays zero.
    pub fn evaluate(&self, features: [f32; 3], view_dir: Vec3) -> Vec3 {
        let d = view_dir.normalize_or_zero();
        let hidden = self.spec.hidden_dim;
        let mut acc = vec![Vec4::ZERO; hidden / 4];

        // first layer: two 4-wide input groups against texel groups 0 and 1
        let v = Vec4::new(d.x, d.y, d.z, features[0]);
        for i in (0..hidden).step_by(4) {
            acc[i / 4] += row_times_mat(v, |k| self.layer0.texel(i + k));
        }
        let v = Vec4::new(features[1], features[2], 0.0, 0.0);
        for i in (0..hidden).step_by(4) {
            acc[i / 4] += row_times_mat(v, |k| self.layer0.texel(hidden + i + k));
        }

        // second layer: relu(hidden) against three texels per hidden group
        let mut result = Vec3::ZERO;
        for (g, h) in acc.iter().enumerate() {
            let h = h.max(Vec4::ZERO);
            let out = row_times_mat(h, |k| {
                if k < OUTPUT_DIM {
                    self.layer1.texel(g * OUTPUT_DIM + k)
                } else {
                    [0.0; 4]
                }
            });
            result += out.truncate();
        }

        Vec3::ONE / (Vec3::ONE + (-result).exp())
    }

    /// Combine the network output with the diffuse sample under `mode`.
    pub fn shade(&self, mode: RenderMode, diffuse: Vec3, specular: Vec4, view_dir: Vec3) -> Vec3 {
        match mode {
            RenderMode::DiffuseOnly => diffuse,
            RenderMode::SpecularOnly => self.evaluate(specular.truncate().to_array(), view_dir),
            RenderMode::Normal => {
                let net = self.evaluate(specular.truncate().to_array(), view_dir);
                (diffuse + net).clamp(Vec3::ZERO, Vec3::ONE)
            }
        }
    }
}

/// `v * mat4(c0, c1, c2, c3)`: component `k` is `dot(v, column k)`.
fn row_times_mat(v: Vec4, column: impl Fn(usize) -> [f32; 4]) -> Vec4 {
    Vec4::new(
        v.dot(Vec4::from_array(column(0))),
        v.dot(Vec4::from_array(column(1))),
        v.dot(Vec4::from_array(column(2))),
        v.dot(Vec4::from_array(column(3))),
    )
}
