use std::sync::Arc;

use cascadeview_assets::{
    AssetError, AssetKind, AssetLayout, AssetSource, ObjModel, SceneManifest, TextureData,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::Instrument;

/// A decoded sub-asset of one cascade.
#[derive(Debug, Clone)]
pub enum LoadedAsset {
    Mesh(ObjModel),
    Diffuse(TextureData),
    Specular(TextureData),
}

impl LoadedAsset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Mesh(_) => AssetKind::Mesh,
            Self::Diffuse(_) => AssetKind::Diffuse,
            Self::Specular(_) => AssetKind::Specular,
        }
    }
}

/// Everything a scene load reports, in arrival order.
#[derive(Debug)]
pub enum LoadEvent {
    ManifestLoaded {
        scene: String,
        manifest: Arc<SceneManifest>,
    },
    ManifestFailed {
        scene: String,
        error: AssetError,
    },
    AssetLoaded {
        scene: String,
        cascade: usize,
        asset: LoadedAsset,
    },
    AssetFailed {
        scene: String,
        cascade: usize,
        kind: AssetKind,
        error: AssetError,
    },
}

impl LoadEvent {
    pub fn scene(&self) -> &str {
        match self {
            Self::ManifestLoaded { scene, .. }
            | Self::ManifestFailed { scene, .. }
            | Self::AssetLoaded { scene, .. }
            | Self::AssetFailed { scene, .. } => scene,
        }
    }
}

/// Result of a non-blocking poll of a [`SceneLoad`].
#[derive(Debug)]
pub enum LoadPoll {
    Ready(LoadEvent),
    /// Nothing yet; more may follow.
    Pending,
    /// Every task has reported.
    Finished,
}

/// Event stream of one scene load.
///
/// Ends once the manifest fails or every sub-asset task has reported.
/// Dropping it makes the remaining tasks' reports no-ops.
#[derive(Debug)]
pub struct SceneLoad {
    scene: String,
    rx: mpsc::UnboundedReceiver<LoadEvent>,
}

impl SceneLoad {
    pub fn scene(&self) -> &str {
        &self.scene
    }

    /// Wait for the next event; `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<LoadEvent> {
        self.rx.recv().await
    }

    pub fn try_next(&mut self) -> LoadPoll {
        match self.rx.try_recv() {
            Ok(event) => LoadPoll::Ready(event),
            Err(mpsc::error::TryRecvError::Empty) => LoadPoll::Pending,
            Err(mpsc::error::TryRecvError::Disconnected) => LoadPoll::Finished,
        }
    }

    /// Drain the whole stream.
    pub async fn collect(mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event);
        }
        events
    }
}

/// Fetch and decode of one sub-asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeTask {
    pub scene: String,
    pub cascade: usize,
    pub kind: AssetKind,
}

impl CascadeTask {
    pub async fn run<S: AssetSource>(self, source: &S, layout: &AssetLayout) -> LoadEvent {
        let path = layout.asset(&self.scene, self.cascade, self.kind);
        match fetch_asset(source, &path, self.kind).await {
            Ok(asset) => {
                tracing::debug!(
                    cascade = self.cascade,
                    kind = self.kind.label(),
                    %path,
                    "asset loaded"
                );
                LoadEvent::AssetLoaded {
                    scene: self.scene,
                    cascade: self.cascade,
                    asset,
                }
            }
            Err(error) => {
                tracing::warn!(
                    cascade = self.cascade,
                    kind = self.kind.label(),
                    %path,
                    %error,
                    "asset failed"
                );
                LoadEvent::AssetFailed {
                    scene: self.scene,
                    cascade: self.cascade,
                    kind: self.kind,
                    error,
                }
            }
        }
    }
}

async fn fetch_asset<S: AssetSource>(
    source: &S,
    path: &str,
    kind: AssetKind,
) -> Result<LoadedAsset, AssetError> {
    let bytes = source.fetch(path).await?;
    Ok(match kind {
        AssetKind::Mesh => LoadedAsset::Mesh(ObjModel::parse(&bytes)?),
        AssetKind::Diffuse => LoadedAsset::Diffuse(TextureData::decode(&bytes)?),
        AssetKind::Specular => LoadedAsset::Specular(TextureData::decode(&bytes)?),
    })
}

/// Starts scene loads on the application's runtime.
pub struct CascadeLoader<S: AssetSource> {
    source: Arc<S>,
    layout: AssetLayout,
    runtime: Handle,
}

impl<S: AssetSource> Clone for CascadeLoader<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            layout: self.layout.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<S: AssetSource> CascadeLoader<S> {
    pub fn new(source: S, layout: AssetLayout, runtime: Handle) -> Self {
        Self {
            source: Arc::new(source),
            layout,
            runtime,
        }
    }

    pub fn layout(&self) -> &AssetLayout {
        &self.layout
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Start loading `scene`: manifest first, then `3 × cascade` concurrent
    /// sub-asset tasks. Returns immediately.
    pub fn load_scene(&self, scene: &str) -> SceneLoad {
        let (tx, rx) = mpsc::unbounded_channel();
        let span = tracing::info_span!("scene_load", scene = %scene);
        self.runtime.spawn(
            run_scene(
                Arc::clone(&self.source),
                self.layout.clone(),
                scene.to_string(),
                tx,
            )
            .instrument(span),
        );
        SceneLoad {
            scene: scene.to_string(),
            rx,
        }
    }
}

async fn run_scene<S: AssetSource>(
    source: Arc<S>,
    layout: AssetLayout,
    scene: String,
    tx: mpsc::UnboundedSender<LoadEvent>,
) {
    let path = layout.manifest(&scene);
    let manifest = match fetch_manifest(source.as_ref(), &path).await {
        Ok(manifest) => Arc::new(manifest),
        Err(error) => {
            tracing::warn!(%path, %error, "manifest failed, scene abandoned");
            let _ = tx.send(LoadEvent::ManifestFailed { scene, error });
            return;
        }
    };
    tracing::info!(
        cascades = manifest.cascade,
        hidden = manifest.layer0.inner(),
        "manifest loaded"
    );
    let cascades = manifest.cascade;
    if tx
        .send(LoadEvent::ManifestLoaded {
            scene: scene.clone(),
            manifest,
        })
        .is_err()
    {
        tracing::debug!("scene dropped before manifest delivery");
        return;
    }

    for cascade in 0..cascades {
        for kind in AssetKind::ALL {
            let task = CascadeTask {
                scene: scene.clone(),
                cascade,
                kind,
            };
            let source = Arc::clone(&source);
            let layout = layout.clone();
            let tx = tx.clone();
            tokio::spawn(
                async move {
                    let event = task.run(source.as_ref(), &layout).await;
                    let _ = tx.send(event);
                }
                .in_current_span(),
            );
        }
    }
}

async fn fetch_manifest<S: AssetSource>(source: &S, path: &str) -> Result<SceneManifest, AssetError> {
    let bytes = source.fetch(path).await?;
    SceneManifest::from_slice(&bytes)
}
