use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use cascadeview_assets::{AssetError, ObjModel, SceneManifest, TextureData};
use cascadeview_network::AppearanceNetwork;
use cascadeview_scene::{AppearanceMaterial, SceneNode};

use crate::LoadedAsset;

/// A cascade with every sub-asset present and its network packed.
#[derive(Debug, Clone)]
pub struct AssembledCascade {
    pub scene: String,
    pub cascade: usize,
    pub model: ObjModel,
    pub network: Arc<AppearanceNetwork>,
    pub diffuse: Arc<TextureData>,
    pub specular: Arc<TextureData>,
}

impl AssembledCascade {
    /// Graph for the composer: one mesh leaf per OBJ group, all sharing the
    /// cascade's material.
    pub fn into_node(self) -> SceneNode {
        let material = AppearanceMaterial::new(self.network, self.diffuse, self.specular);
        SceneNode::from_obj(format!("mesh_{}", self.cascade), &self.model, &material)
    }
}

#[derive(Debug, Default)]
struct Partial {
    mesh: Option<ObjModel>,
    diffuse: Option<TextureData>,
    specular: Option<TextureData>,
}

impl Partial {
    fn is_complete(&self) -> bool {
        self.mesh.is_some() && self.diffuse.is_some() && self.specular.is_some()
    }
}

/// Collects sub-assets per cascade of one scene.
#[derive(Debug)]
pub struct CascadeAssembler {
    scene: String,
    manifest: Arc<SceneManifest>,
    partial: BTreeMap<usize, Partial>,
    suppressed: BTreeSet<usize>,
    assembled: BTreeSet<usize>,
}

impl CascadeAssembler {
    pub fn new(scene: impl Into<String>, manifest: Arc<SceneManifest>) -> Self {
        Self {
            scene: scene.into(),
            manifest,
            partial: BTreeMap::new(),
            suppressed: BTreeSet::new(),
            assembled: BTreeSet::new(),
        }
    }

    pub fn manifest(&self) -> &SceneManifest {
        &self.manifest
    }

    /// Store a sub-asset; returns the cascade once its third part arrives.
    ///
    /// Parts for suppressed, already assembled or out-of-range cascades are
    /// dropped.
    pub fn accept(
        &mut self,
        cascade: usize,
        asset: LoadedAsset,
    ) -> Result<Option<AssembledCascade>, AssetError> {
        if cascade >= self.manifest.cascade
            || self.suppressed.contains(&cascade)
            || self.assembled.contains(&cascade)
        {
            tracing::debug!(scene = %self.scene, cascade, "sub-asset dropped");
            return Ok(None);
        }
        let part = self.partial.entry(cascade).or_default();
        match asset {
            LoadedAsset::Mesh(m) => part.mesh = Some(m),
            LoadedAsset::Diffuse(t) => part.diffuse = Some(t),
            LoadedAsset::Specular(t) => part.specular = Some(t),
        }
        if !part.is_complete() {
            return Ok(None);
        }
        let Some(Partial {
            mesh: Some(model),
            diffuse: Some(diffuse),
            specular: Some(specular),
        }) = self.partial.remove(&cascade)
        else {
            return Ok(None);
        };
        self.assembled.insert(cascade);
        let network = self.manifest.build_network()?;
        Ok(Some(AssembledCascade {
            scene: self.scene.clone(),
            cascade,
            model,
            network: Arc::new(network),
            diffuse: Arc::new(diffuse),
            specular: Arc::new(specular),
        }))
    }

    /// A sub-asset of `cascade` failed: the cascade will never attach.
    pub fn suppress(&mut self, cascade: usize) {
        self.partial.remove(&cascade);
        self.suppressed.insert(cascade);
    }

    pub fn is_suppressed(&self, cascade: usize) -> bool {
        self.suppressed.contains(&cascade)
    }

    pub fn assembled_count(&self) -> usize {
        self.assembled.len()
    }
}
