//! Scene assets: the per-scene manifest, per-cascade OBJ meshes and feature
//! textures, and the sources they are fetched from.
//!
//! # Layout
//! A scene lives under `<base>/<scene>/` and holds `mlp.json` plus, for every
//! cascade `i`, `mesh_<i>.obj`, `feat0_<i>.<ext>` (diffuse) and
//! `feat1_<i>.<ext>` (specular features). See [`AssetLayout`].

mod layout;
mod manifest;
mod obj;
mod source;
mod texture;

pub use layout::{AssetKind, AssetLayout};
pub use manifest::SceneManifest;
pub use obj::{MeshData, ObjModel};
pub use source::{AnySource, AssetSource, FsSource, HttpSource, MemorySource};
pub use texture::TextureData;

use cascadeview_network::NetworkError;

/// Errors from fetching and decoding assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("manifest network error: {0}")]
    Network(#[from] NetworkError),
    #[error("manifest declares {count} cascades (max {max})")]
    TooManyCascades { count: usize, max: usize },
    #[error("OBJ parse error: {0}")]
    ObjParse(String),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
}
