use std::time::Duration;

use cascadeview_assets::{AnySource, AssetLayout, AssetSource};
use cascadeview_render::{FrameStats, RenderView};
use cascadeview_render_wgpu::OrbitCamera;
use cascadeview_scene::{ComposeError, SceneComposer, SceneEdit};
use cascadeview_stream::{CascadeLoader, LoadSession, StreamConfig};
use cascadeview_viewstate::ViewState;
use tokio::runtime::Handle;

/// Launch settings that do not travel in the query string.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Asset root used when the query carries no `path`.
    pub base_path: String,
    pub image_extension: String,
    /// Prefix of exported configuration links.
    pub share_base: String,
    pub stream: StreamConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_path: ".".into(),
            image_extension: AssetLayout::default().image_extension,
            share_base: "index.html".into(),
            stream: StreamConfig::default(),
        }
    }
}

/// Everything the frame loop and the control panel work on.
pub struct ViewerState<S: AssetSource = AnySource> {
    pub view: ViewState,
    pub composer: SceneComposer,
    pub session: LoadSession<S>,
    pub camera: OrbitCamera,
    pub stats: FrameStats,
    pub share_base: String,
    pub share_dialog: Option<String>,
    /// Upper bounds of the W / H sliders, fixed on first use.
    viewport_limits: Option<[u32; 2]>,
}

impl ViewerState<AnySource> {
    /// Source root comes from the query's `path`, else the launch config.
    pub fn new(config: &ViewerConfig, view: ViewState, runtime: Handle) -> Self {
        let base = view
            .global
            .base_path
            .clone()
            .unwrap_or_else(|| config.base_path.clone());
        tracing::info!(base = %base, "asset source");
        Self::with_source(config, view, AnySource::from_base(&base), runtime)
    }
}

impl<S: AssetSource> ViewerState<S> {
    pub fn with_source(config: &ViewerConfig, view: ViewState, source: S, runtime: Handle) -> Self {
        let layout = AssetLayout::with_image_extension(config.image_extension.clone());
        let loader = CascadeLoader::new(source, layout, runtime);
        let mut session = LoadSession::new(loader, config.stream.clone());
        let mut composer = SceneComposer::new();

        for (name, params) in view.scenes.iter() {
            composer.configure(name, *params);
            session.request(name);
        }

        let mut camera = OrbitCamera::default();
        camera.set_lens(view.global.fovy, view.global.near, view.global.far);
        if let Some(pose) = &view.camera {
            camera.restore_pose(pose);
        }

        Self {
            view,
            composer,
            session,
            camera,
            stats: FrameStats::default(),
            share_base: config.share_base.clone(),
            share_dialog: None,
            viewport_limits: None,
        }
    }

    pub fn has_scenes(&self) -> bool {
        !self.view.scenes.is_empty()
    }

    /// Per-frame work: apply loader output and record the frame time.
    pub fn frame(&mut self, dt: Duration) {
        let stats = self.session.poll(&mut self.composer);
        if stats.attached_this_frame > 0 {
            tracing::debug!(
                attached = stats.attached_this_frame,
                total = self.composer.object_count(),
                "cascades attached"
            );
        }
        self.stats.record(dt);
    }

    pub fn apply_edit(&mut self, scene: &str, edit: SceneEdit) -> Result<(), ComposeError> {
        self.composer.apply_edit(scene, edit)?;
        if let Some(params) = self.composer.params(scene) {
            self.view.scenes.set(scene, params);
        }
        Ok(())
    }

    pub fn set_background(&mut self, rgb: [u8; 3]) {
        let [r, g, b] = rgb.map(u32::from);
        self.view.global.bg_color = (r << 16) | (g << 8) | b;
    }

    pub fn background_rgb(&self) -> [u8; 3] {
        let c = self.view.global.bg_color;
        [(c >> 16) as u8, (c >> 8) as u8, c as u8]
    }

    /// `[max_width, max_height]` for the viewport sliders: the initial
    /// viewport or 1024, whichever is larger.
    pub fn viewport_limits(&mut self, window: [u32; 2]) -> [u32; 2] {
        if let Some(limits) = self.viewport_limits {
            return limits;
        }
        let (width, height) = self.view.global.viewport(window[0], window[1]);
        let limits = [width.max(1024), height.max(1024)];
        self.viewport_limits = Some(limits);
        limits
    }

    pub fn set_viewport_width(&mut self, width: u32) {
        self.view.global.width = Some(width);
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.view.global.height = Some(height);
    }

    pub fn set_lens(&mut self, fovy: f32, near: f32, far: f32) {
        self.view.global.fovy = fovy;
        self.view.global.near = near;
        self.view.global.far = far;
        self.camera.set_lens(fovy, near, far);
    }

    pub fn render_view(&self) -> RenderView {
        self.camera.render_view(self.view.global.bg_rgb())
    }

    /// Current state including the live camera pose.
    pub fn snapshot(&self) -> ViewState {
        let mut view = self.view.clone();
        view.camera = Some(self.camera.pose());
        view
    }

    pub fn share_url(&self) -> String {
        self.snapshot().share_url(&self.share_base)
    }

    pub fn open_share_dialog(&mut self) {
        let url = self.share_url();
        tracing::info!(url = %url, "configuration exported");
        self.share_dialog = Some(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascadeview_assets::{AssetKind, MemorySource, SceneManifest, TextureData};
    use cascadeview_common::RenderMode;
    use cascadeview_scene::Axis;

    const TRIANGLE_OBJ: &[u8] =
        b"o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n";

    fn room_source(cascades: usize) -> MemorySource {
        let layout = AssetLayout::default();
        let layer0 = vec![vec![0.1; 4]; 6];
        let layer1 = vec![vec![0.2; 3]; 4];
        let png = TextureData::solid(2, 2, [10, 20, 30, 255]).encode_png().unwrap();
        let mut source = MemorySource::new();
        source.insert(
            layout.manifest("room"),
            SceneManifest::to_json(cascades, &layer0, &layer1).into_bytes(),
        );
        for i in 0..cascades {
            source.insert(layout.asset("room", i, AssetKind::Mesh), TRIANGLE_OBJ);
            source.insert(layout.asset("room", i, AssetKind::Diffuse), png.clone());
            source.insert(layout.asset("room", i, AssetKind::Specular), png.clone());
        }
        source
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn query_configures_scenes_and_lens() {
        let rt = runtime();
        let view = cascadeview_viewstate::decode("scene=room&room.pos_x=2&fovy=45&far=50");
        let state = ViewerState::with_source(
            &ViewerConfig::default(),
            view,
            MemorySource::new(),
            rt.handle().clone(),
        );
        assert!(state.has_scenes());
        assert_eq!(state.composer.params("room").unwrap().position.x, 2.0);
        assert_eq!(state.camera.fovy, 45.0);
        assert_eq!(state.camera.far, 50.0);
    }

    #[test]
    fn streams_cascades_into_composer() {
        let rt = runtime();
        let view = cascadeview_viewstate::decode("scene=room");
        let mut state = ViewerState::with_source(
            &ViewerConfig::default(),
            view,
            room_source(2),
            rt.handle().clone(),
        );
        for _ in 0..500 {
            state.frame(Duration::from_millis(16));
            if state.session.is_idle() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(state.session.is_idle());
        assert_eq!(state.composer.object_count(), 2);
        assert_eq!(state.session.progress_readout(), "🟢🟢🟢🟢🟢🟢");
        assert!(state.stats.frames() > 0);
    }

    #[test]
    fn edits_are_clamped_and_exported() {
        let rt = runtime();
        let view = cascadeview_viewstate::decode("scene=room");
        let mut state = ViewerState::with_source(
            &ViewerConfig::default(),
            view,
            MemorySource::new(),
            rt.handle().clone(),
        );
        state.apply_edit("room", SceneEdit::Position(Axis::Y, 42.0)).unwrap();
        state
            .apply_edit("room", SceneEdit::RenderMode(RenderMode::SpecularOnly))
            .unwrap();
        assert!(state.apply_edit("other", SceneEdit::Scale(Axis::X, 1.0)).is_err());

        let url = state.share_url();
        assert!(url.starts_with("index.html?"));
        let restored = cascadeview_viewstate::decode(url.split_once('?').unwrap().1);
        let params = restored.scenes.get("room").unwrap();
        assert_eq!(params.position.y, 10.0);
        assert_eq!(params.render_mode, RenderMode::SpecularOnly);
        assert!(restored.camera.is_some());
    }

    #[test]
    fn background_round_trips_through_rgb() {
        let rt = runtime();
        let mut state = ViewerState::with_source(
            &ViewerConfig::default(),
            ViewState::default(),
            MemorySource::new(),
            rt.handle().clone(),
        );
        assert!(!state.has_scenes());
        state.set_background([0x12, 0x34, 0x56]);
        assert_eq!(state.view.global.bg_color, 0x123456);
        assert_eq!(state.background_rgb(), [0x12, 0x34, 0x56]);
    }

    #[test]
    fn viewport_axes_are_set_independently() {
        let rt = runtime();
        let mut state = ViewerState::with_source(
            &ViewerConfig::default(),
            cascadeview_viewstate::decode("scene=room"),
            MemorySource::new(),
            rt.handle().clone(),
        );
        state.set_viewport_height(300);
        assert_eq!(state.view.global.height, Some(300));
        assert_eq!(state.view.global.width, None);

        let url = state.share_url();
        let restored = cascadeview_viewstate::decode(url.split_once('?').unwrap().1);
        assert_eq!(restored.global.height, Some(300));
        assert_eq!(restored.global.width, None);

        state.set_viewport_width(640);
        assert_eq!(state.view.global.width, Some(640));
        assert_eq!(state.view.global.height, Some(300));
    }

    #[test]
    fn viewport_limits_stay_fixed() {
        let rt = runtime();
        let mut state = ViewerState::with_source(
            &ViewerConfig::default(),
            cascadeview_viewstate::decode("scene=room&W=2000"),
            MemorySource::new(),
            rt.handle().clone(),
        );
        let limits = state.viewport_limits([1280, 720]);
        assert_eq!(limits, [2000, 1024]);

        state.set_viewport_width(64);
        state.set_viewport_height(4000);
        assert_eq!(state.viewport_limits([3000, 3000]), limits);
    }
}
