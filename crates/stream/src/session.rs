use std::time::{Duration, Instant};

use cascadeview_assets::AssetSource;
use cascadeview_scene::SceneComposer;

use crate::{CascadeAssembler, CascadeLoader, LoadEvent, LoadPoll, ProgressBoard, SceneLoad};

/// Per-frame limits on how much loader output is applied.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Maximum number of load events handled per [`LoadSession::poll`].
    pub event_budget: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { event_budget: 32 }
    }
}

/// Per-frame streaming statistics for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub events_this_frame: usize,
    pub attached_this_frame: usize,
    pub attached_total: usize,
    pub failures_total: usize,
    pub poll_time: Duration,
}

struct PendingScene {
    load: SceneLoad,
    assembler: Option<CascadeAssembler>,
}

/// Drives every scene load from the frame loop and hands finished cascades
/// to the composer.
pub struct LoadSession<S: AssetSource> {
    loader: CascadeLoader<S>,
    pub config: StreamConfig,
    pending: Vec<PendingScene>,
    progress: ProgressBoard,
    stats: StreamStats,
}

impl<S: AssetSource> LoadSession<S> {
    pub fn new(loader: CascadeLoader<S>, config: StreamConfig) -> Self {
        Self {
            loader,
            config,
            pending: Vec::new(),
            progress: ProgressBoard::new(),
            stats: StreamStats::default(),
        }
    }

    pub fn loader(&self) -> &CascadeLoader<S> {
        &self.loader
    }

    /// Start loading `scene` unless it was already requested.
    pub fn request(&mut self, scene: &str) {
        if self.progress.contains(scene) {
            return;
        }
        self.progress.request(scene);
        self.pending.push(PendingScene {
            load: self.loader.load_scene(scene),
            assembler: None,
        });
    }

    /// Stop tracking `scene` and remove it from the composer. Its remaining
    /// events are never applied.
    pub fn unload(&mut self, scene: &str, composer: &mut SceneComposer) {
        self.pending.retain(|p| p.load.scene() != scene);
        self.progress.remove(scene);
        composer.unload_scene(scene);
    }

    /// Apply whatever the loaders produced since the last frame, within the
    /// event budget. Never blocks.
    pub fn poll(&mut self, composer: &mut SceneComposer) -> &StreamStats {
        let _span = tracing::trace_span!("stream_poll").entered();
        let start = Instant::now();
        self.stats.events_this_frame = 0;
        self.stats.attached_this_frame = 0;

        let mut budget = self.config.event_budget;
        let mut index = 0;
        while index < self.pending.len() {
            let mut finished = false;
            while budget > 0 {
                match self.pending[index].load.try_next() {
                    LoadPoll::Ready(event) => {
                        budget -= 1;
                        apply_event(
                            &mut self.pending[index],
                            &mut self.progress,
                            &mut self.stats,
                            composer,
                            event,
                        );
                    }
                    LoadPoll::Pending => break,
                    LoadPoll::Finished => {
                        finished = true;
                        break;
                    }
                }
            }
            if finished {
                let done = self.pending.remove(index);
                tracing::debug!(scene = done.load.scene(), "scene stream finished");
            } else {
                index += 1;
            }
        }

        self.stats.poll_time = start.elapsed();
        &self.stats
    }

    /// Await every outstanding load and apply it. For headless use.
    pub async fn finish(&mut self, composer: &mut SceneComposer) {
        while let Some(mut pending) = self.pending.pop() {
            while let Some(event) = pending.load.next().await {
                apply_event(&mut pending, &mut self.progress, &mut self.stats, composer, event);
            }
        }
    }

    /// True when no scene stream is still open.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn progress(&self) -> &ProgressBoard {
        &self.progress
    }

    pub fn progress_readout(&self) -> String {
        self.progress.readout()
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }
}

fn apply_event(
    pending: &mut PendingScene,
    progress: &mut ProgressBoard,
    stats: &mut StreamStats,
    composer: &mut SceneComposer,
    event: LoadEvent,
) {
    stats.events_this_frame += 1;
    match event {
        LoadEvent::ManifestLoaded { scene, manifest } => {
            if !progress.resolve(&scene, manifest.cascade) {
                tracing::warn!(%scene, cascades = manifest.cascade, "progress markers unavailable");
            }
            pending.assembler = Some(CascadeAssembler::new(scene, manifest));
        }
        LoadEvent::ManifestFailed { scene, error } => {
            stats.failures_total += 1;
            tracing::warn!(%scene, %error, "scene abandoned");
            progress.remove(&scene);
        }
        LoadEvent::AssetLoaded {
            scene,
            cascade,
            asset,
        } => {
            let kind = asset.kind();
            progress.mark(&scene, cascade, kind);
            let Some(assembler) = pending.assembler.as_mut() else {
                return;
            };
            let assembled = match assembler.accept(cascade, asset) {
                Ok(Some(assembled)) => assembled,
                Ok(None) => return,
                Err(error) => {
                    stats.failures_total += 1;
                    tracing::warn!(%scene, cascade, %error, "cascade assembly failed");
                    return;
                }
            };
            match composer.attach(&scene, cascade, assembled.into_node()) {
                Ok(_) => {
                    stats.attached_this_frame += 1;
                    stats.attached_total += 1;
                }
                Err(error) => tracing::warn!(%scene, cascade, %error, "cascade not attached"),
            }
        }
        LoadEvent::AssetFailed {
            scene,
            cascade,
            kind,
            error,
        } => {
            stats.failures_total += 1;
            tracing::warn!(%scene, cascade, kind = kind.label(), %error, "cascade suppressed");
            if let Some(assembler) = pending.assembler.as_mut() {
                assembler.suppress(cascade);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{scene_source, TestScene};
    use cascadeview_assets::{AssetKind, AssetLayout, MemorySource};
    use cascadeview_common::SceneTransform;
    use glam::Vec3;
    use tokio::runtime::Handle;

    fn session(source: MemorySource) -> LoadSession<MemorySource> {
        let loader = CascadeLoader::new(source, AssetLayout::default(), Handle::current());
        LoadSession::new(loader, StreamConfig::default())
    }

    async fn poll_until_idle(session: &mut LoadSession<MemorySource>, composer: &mut SceneComposer) {
        while !session.is_idle() {
            session.poll(composer);
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn failed_asset_suppresses_only_its_cascade() {
        let mut source = scene_source(&[TestScene::new("a", 3, 8), TestScene::new("b", 1, 4)]);
        source.fail("a/feat1_1.jpg");
        let mut session = session(source);
        let mut composer = SceneComposer::new();
        for name in ["a", "b"] {
            composer.configure(name, SceneTransform::default());
            session.request(name);
        }
        poll_until_idle(&mut session, &mut composer).await;

        let mut cascades: Vec<usize> = composer.objects("a").iter().map(|o| o.cascade).collect();
        cascades.sort();
        assert_eq!(cascades, vec![0, 2]);
        assert_eq!(composer.objects("b").len(), 1);

        let a = session.progress().get("a").unwrap();
        assert!(!a.is_loaded(1, AssetKind::Specular));
        assert_eq!(a.loaded_count(), 8);
        assert!(session.progress().get("b").unwrap().is_complete());
        assert_eq!(session.stats().failures_total, 1);
    }

    #[tokio::test]
    async fn manifest_failure_abandons_one_scene() {
        let source = scene_source(&[TestScene::new("b", 2, 4)]);
        let mut session = session(source);
        let mut composer = SceneComposer::new();
        for name in ["missing", "b"] {
            composer.configure(name, SceneTransform::default());
            session.request(name);
        }
        session.finish(&mut composer).await;

        assert!(composer.objects("missing").is_empty());
        assert_eq!(composer.objects("b").len(), 2);
        assert_eq!(session.progress_readout(), "🟢🟢🟢🟢🟢🟢");
    }

    #[tokio::test]
    async fn late_attach_uses_params_at_attach_time() {
        let source = scene_source(&[TestScene::new("a", 1, 4)]);
        let mut session = session(source);
        let mut composer = SceneComposer::new();
        composer.configure("a", SceneTransform::default());
        session.request("a");

        let moved = SceneTransform {
            position: Vec3::new(0.0, 0.0, 4.0),
            ..Default::default()
        };
        composer.set_transform("a", moved).unwrap();
        session.finish(&mut composer).await;

        assert_eq!(composer.objects("a")[0].transform.position, Vec3::new(0.0, 0.0, 4.0));
    }

    #[tokio::test]
    async fn unloaded_scene_ignores_late_events() {
        let source = scene_source(&[TestScene::new("a", 2, 4), TestScene::new("b", 1, 4)]);
        let mut session = session(source);
        let mut composer = SceneComposer::new();
        for name in ["a", "b"] {
            composer.configure(name, SceneTransform::default());
            session.request(name);
        }
        session.unload("a", &mut composer);
        poll_until_idle(&mut session, &mut composer).await;

        assert!(!composer.is_configured("a"));
        assert!(session.progress().get("a").is_none());
        assert_eq!(composer.object_count(), 1);
    }

    #[tokio::test]
    async fn event_budget_spreads_work_over_frames() {
        let source = scene_source(&[TestScene::new("a", 2, 4)]);
        let mut session = session(source);
        session.config.event_budget = 1;
        let mut composer = SceneComposer::new();
        composer.configure("a", SceneTransform::default());
        session.request("a");

        let mut frames = 0;
        while !session.is_idle() {
            let stats = session.poll(&mut composer);
            assert!(stats.events_this_frame <= 1);
            frames += 1;
            tokio::task::yield_now().await;
        }
        assert!(frames >= 7);
        assert_eq!(composer.object_count(), 2);
    }

    #[tokio::test]
    async fn repeated_request_loads_once() {
        let source = scene_source(&[TestScene::new("a", 1, 4)]);
        let mut session = session(source);
        let mut composer = SceneComposer::new();
        composer.configure("a", SceneTransform::default());
        session.request("a");
        session.request("a");
        session.finish(&mut composer).await;
        assert_eq!(composer.object_count(), 1);
        assert_eq!(session.stats().attached_total, 1);
    }

    #[tokio::test]
    async fn query_string_to_attached_scene() {
        let state = cascadeview_viewstate::decode("?scene=room&H=800&W=1200");
        assert_eq!(state.global.height, Some(800));
        assert_eq!(state.global.width, Some(1200));

        let source = scene_source(&[TestScene::new("room", 2, 32)]);
        let mut session = session(source);
        let mut composer = SceneComposer::new();
        for (name, params) in state.scenes.iter() {
            composer.configure(name, *params);
            session.request(name);
        }
        session.finish(&mut composer).await;

        let progress = session.progress().get("room").unwrap();
        assert_eq!(progress.markers(), &[true; 6]);
        let objects = composer.objects("room");
        assert_eq!(objects.len(), 2);
        for object in objects {
            assert_eq!(object.transform, cascadeview_common::Transform::default());
            let material = object.root.first_material().unwrap();
            assert_eq!(material.network.spec().hidden_dim, 32);
        }
    }
}
