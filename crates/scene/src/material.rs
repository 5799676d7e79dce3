use std::sync::Arc;

use cascadeview_assets::TextureData;
use cascadeview_common::RenderMode;
use cascadeview_network::AppearanceNetwork;
use glam::{Vec3, Vec4};

/// Render program state bound to a mesh leaf: the cascade's network, its two
/// feature textures, and the live render-mode uniform.
///
/// Resources are shared (`Arc`) between every leaf of one cascade object and
/// freed with the last of them.
#[derive(Debug, Clone)]
pub struct AppearanceMaterial {
    pub network: Arc<AppearanceNetwork>,
    pub diffuse: Arc<TextureData>,
    pub specular: Arc<TextureData>,
    pub mode: RenderMode,
}

impl AppearanceMaterial {
    pub fn new(
        network: Arc<AppearanceNetwork>,
        diffuse: Arc<TextureData>,
        specular: Arc<TextureData>,
    ) -> Self {
        Self {
            network,
            diffuse,
            specular,
            mode: RenderMode::Normal,
        }
    }

    /// CPU shading of one surface point, as the fragment program would.
    pub fn shade_uv(&self, uv: [f32; 2], view_dir: Vec3) -> Vec3 {
        let diffuse = Vec4::from_array(self.diffuse.sample_nearest(uv));
        let specular = Vec4::from_array(self.specular.sample_nearest(uv));
        self.network
            .shade(self.mode, diffuse.truncate(), specular, view_dir)
    }

    /// Whether two materials use the same cascade resources.
    pub fn shares_resources(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.network, &other.network)
            && Arc::ptr_eq(&self.diffuse, &other.diffuse)
            && Arc::ptr_eq(&self.specular, &other.specular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascadeview_network::WeightMatrix;

    fn material() -> AppearanceMaterial {
        let l0 = WeightMatrix::from_fn(6, 4, |_, _| 0.0).unwrap();
        let l1 = WeightMatrix::from_fn(4, 3, |_, _| 0.0).unwrap();
        AppearanceMaterial::new(
            Arc::new(AppearanceNetwork::from_layers(&l0, &l1).unwrap()),
            Arc::new(TextureData::solid(2, 2, [51, 102, 0, 255])),
            Arc::new(TextureData::solid(2, 2, [0, 0, 0, 255])),
        )
    }

    #[test]
    fn shade_uv_follows_mode() {
        let mut m = material();
        let diffuse = Vec3::new(0.2, 0.4, 0.0);

        m.mode = RenderMode::DiffuseOnly;
        assert!((m.shade_uv([0.5, 0.5], Vec3::Z) - diffuse).length() < 1e-6);

        m.mode = RenderMode::SpecularOnly;
        assert_eq!(m.shade_uv([0.5, 0.5], Vec3::Z), Vec3::splat(0.5));

        m.mode = RenderMode::Normal;
        let full = m.shade_uv([0.5, 0.5], Vec3::Z);
        assert!((full - Vec3::new(0.7, 0.9, 0.5)).length() < 1e-6);
    }

    #[test]
    fn clones_share_resources() {
        let a = material();
        let b = a.clone();
        assert!(a.shares_resources(&b));
        assert!(!a.shares_resources(&material()));
    }
}
