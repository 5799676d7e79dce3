use cascadeview_network::{AppearanceNetwork, NetworkSpec, WeightMatrix};
use serde::Deserialize;

use crate::AssetError;

/// Per-scene manifest: cascade count plus the two network layers.
///
/// The same network serves every cascade of the scene.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneManifest {
    /// Scene bounds, carried through untouched.
    #[serde(default)]
    pub bound: Option<serde_json::Value>,
    /// Number of cascades to load.
    pub cascade: usize,
    #[serde(rename = "net.0.weight")]
    pub layer0: WeightMatrix,
    #[serde(rename = "net.1.weight")]
    pub layer1: WeightMatrix,
}

impl SceneManifest {
    /// Upper bound on `cascade`; the loader spawns three fetches per cascade.
    pub const MAX_CASCADES: usize = 1024;

    /// Parse and validate the cascade count and network shapes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AssetError> {
        let manifest: Self = serde_json::from_slice(bytes)?;
        if manifest.cascade > Self::MAX_CASCADES {
            return Err(AssetError::TooManyCascades {
                count: manifest.cascade,
                max: Self::MAX_CASCADES,
            });
        }
        manifest.spec()?;
        Ok(manifest)
    }

    pub fn spec(&self) -> Result<NetworkSpec, AssetError> {
        Ok(NetworkSpec::from_layers(&self.layer0, &self.layer1)?)
    }

    /// Pack both layers into a fresh network instance.
    pub fn build_network(&self) -> Result<AppearanceNetwork, AssetError> {
        Ok(AppearanceNetwork::from_layers(&self.layer0, &self.layer1)?)
    }

    /// Serialize a manifest body, used by tools and tests to fabricate scenes.
    pub fn to_json(cascade: usize, layer0: &[Vec<f32>], layer1: &[Vec<f32>]) -> String {
        serde_json::json!({
            "bound": 1.0,
            "cascade": cascade,
            "net.0.weight": layer0,
            "net.1.weight": layer1,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascadeview_network::NetworkError;

    fn layer(outer: usize, inner: usize, value: f32) -> Vec<Vec<f32>> {
        vec![vec![value; inner]; outer]
    }

    #[test]
    fn parses_manifest_fields() {
        let json = SceneManifest::to_json(2, &layer(6, 32, 0.1), &layer(32, 3, -0.2));
        let manifest = SceneManifest::from_slice(json.as_bytes()).unwrap();
        assert_eq!(manifest.cascade, 2);
        assert!(manifest.bound.is_some());
        let spec = manifest.spec().unwrap();
        assert_eq!(spec.hidden_dim, 32);
        assert_eq!(manifest.build_network().unwrap().spec(), spec);
    }

    #[test]
    fn bound_is_optional() {
        let json = serde_json::json!({
            "cascade": 1,
            "net.0.weight": layer(6, 8, 0.0),
            "net.1.weight": layer(8, 3, 0.0),
        })
        .to_string();
        let manifest = SceneManifest::from_slice(json.as_bytes()).unwrap();
        assert!(manifest.bound.is_none());
    }

    #[test]
    fn rejects_inconsistent_layers() {
        let json = SceneManifest::to_json(1, &layer(6, 8, 0.0), &layer(16, 3, 0.0));
        let err = SceneManifest::from_slice(json.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            AssetError::Network(NetworkError::LayerMismatch { .. })
        ));
    }

    #[test]
    fn rejects_missing_cascade_count() {
        let json = serde_json::json!({
            "net.0.weight": layer(6, 8, 0.0),
            "net.1.weight": layer(8, 3, 0.0),
        })
        .to_string();
        assert!(matches!(
            SceneManifest::from_slice(json.as_bytes()),
            Err(AssetError::Json(_))
        ));
    }

    #[test]
    fn rejects_excessive_cascade_count() {
        let layer0 = layer(6, 8, 0.0);
        let layer1 = layer(8, 3, 0.0);
        let at_cap = SceneManifest::to_json(SceneManifest::MAX_CASCADES, &layer0, &layer1);
        assert!(SceneManifest::from_slice(at_cap.as_bytes()).is_ok());

        let json = SceneManifest::to_json(usize::MAX / 2, &layer0, &layer1);
        let err = SceneManifest::from_slice(json.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            AssetError::TooManyCascades { max: SceneManifest::MAX_CASCADES, .. }
        ));
    }
}
