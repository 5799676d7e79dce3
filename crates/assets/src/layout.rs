/// The three sub-assets every cascade consists of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    Mesh,
    Diffuse,
    Specular,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [Self::Mesh, Self::Diffuse, Self::Specular];

    /// Position of this sub-asset within its cascade's three progress markers.
    pub fn marker_offset(self) -> usize {
        match self {
            Self::Mesh => 0,
            Self::Diffuse => 1,
            Self::Specular => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::Diffuse => "diffuse tex",
            Self::Specular => "specular tex",
        }
    }
}

/// File naming of a scene directory, relative to the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    /// File name of the per-scene manifest.
    pub manifest_name: String,
    /// Extension of both feature images, without the dot.
    pub image_extension: String,
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self {
            manifest_name: "mlp.json".into(),
            image_extension: "jpg".into(),
        }
    }
}

impl AssetLayout {
    pub fn with_image_extension(extension: impl Into<String>) -> Self {
        Self {
            image_extension: extension.into().trim_start_matches('.').to_string(),
            ..Self::default()
        }
    }

    pub fn manifest(&self, scene: &str) -> String {
        format!("{}/{}", scene_dir(scene), self.manifest_name)
    }

    pub fn asset(&self, scene: &str, cascade: usize, kind: AssetKind) -> String {
        let dir = scene_dir(scene);
        match kind {
            AssetKind::Mesh => format!("{dir}/mesh_{cascade}.obj"),
            AssetKind::Diffuse => format!("{dir}/feat0_{cascade}.{}", self.image_extension),
            AssetKind::Specular => format!("{dir}/feat1_{cascade}.{}", self.image_extension),
        }
    }
}

/// Scene names may carry a trailing slash (`trial_lego/mesh_stage1/`).
fn scene_dir(scene: &str) -> &str {
    scene.trim_end_matches('/')
}
