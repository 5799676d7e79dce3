use cascadeview_common::SceneTransform;

/// Viewer-wide settings carried in the query string.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalConfig {
    /// Clear colour as `0xRRGGBB`.
    pub bg_color: u32,
    /// Viewport height; `None` derives it from the window.
    pub height: Option<u32>,
    /// Viewport width; `None` derives it from the window.
    pub width: Option<u32>,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
    /// Root that scene folders are fetched from.
    pub base_path: Option<String>,
}

impl GlobalConfig {
    pub const DEFAULT_BG_COLOR: u32 = 0xffffff;
    pub const DEFAULT_FOVY: f32 = 60.0;
    pub const DEFAULT_NEAR: f32 = 0.01;
    pub const DEFAULT_FAR: f32 = 100.0;

    /// Viewport size for a window, `(width, height)`.
    pub fn viewport(&self, window_width: u32, window_height: u32) -> (u32, u32) {
        let width = self
            .width
            .unwrap_or_else(|| (u64::from(window_width) * 99 / 100) as u32);
        let height = self
            .height
            .unwrap_or_else(|| (u64::from(window_height) * 95 / 100) as u32);
        (width, height)
    }

    /// Background as linear `[r, g, b]` in `0..=1`.
    pub fn bg_rgb(&self) -> [f32; 3] {
        let c = self.bg_color;
        [(c >> 16) & 0xff, (c >> 8) & 0xff, c & 0xff].map(|v| v as f32 / 255.0)
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            bg_color: Self::DEFAULT_BG_COLOR,
            height: None,
            width: None,
            fovy: Self::DEFAULT_FOVY,
            near: Self::DEFAULT_NEAR,
            far: Self::DEFAULT_FAR,
            base_path: None,
        }
    }
}

/// Scene parameters by name, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneParams {
    entries: Vec<(String, SceneTransform)>,
}

impl SceneParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name` unless present. Returns whether it was added.
    pub fn insert(&mut self, name: impl Into<String>, params: SceneTransform) -> bool {
        let name = name.into();
        if self.get(&name).is_some() {
            return false;
        }
        self.entries.push((name, params));
        true
    }

    /// Replace or add.
    pub fn set(&mut self, name: &str, params: SceneTransform) {
        match self.get_mut(name) {
            Some(p) => *p = params,
            None => self.entries.push((name.to_string(), params)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SceneTransform> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SceneTransform> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SceneTransform)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, SceneTransform)> for SceneParams {
    fn from_iter<I: IntoIterator<Item = (String, SceneTransform)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, p) in iter {
            params.insert(name, p);
        }
        params
    }
}

/// Everything a shareable link restores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub global: GlobalConfig,
    /// Column-major camera world matrix.
    pub camera: Option<[f32; 16]>,
    pub scenes: SceneParams,
}

impl ViewState {
    /// `<base>?<query>`, or just `base` when every field is default.
    pub fn share_url(&self, base: &str) -> String {
        let query = crate::encode(self);
        let base = base.split('?').next().unwrap_or(base);
        if query.is_empty() {
            base.to_string()
        } else {
            format!("{base}?{query}")
        }
    }
}
