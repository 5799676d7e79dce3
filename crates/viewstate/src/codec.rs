use cascadeview_common::{RenderMode, SceneTransform};
use url::form_urlencoded;

use crate::{GlobalConfig, SceneParams, ViewState, ViewStateError};

/// Query keys. Per-scene keys are prefixed with `<scene>.`.
pub mod keys {
    pub const BG_COLOR: &str = "bg_color";
    pub const HEIGHT: &str = "H";
    pub const WIDTH: &str = "W";
    pub const FOVY: &str = "fovy";
    pub const NEAR: &str = "near";
    pub const FAR: &str = "far";
    pub const CAMERA: &str = "cameraState";
    pub const PATH: &str = "path";
    pub const SCENE: &str = "scene";

    pub const RENDER_MODE: &str = "renderMode";
    pub const POSITION: [&str; 3] = ["pos_x", "pos_y", "pos_z"];
    pub const SCALE: [&str; 3] = ["scale_x", "scale_y", "scale_z"];
    pub const ROTATION: [&str; 3] = ["rot_x", "rot_y", "rot_z"];
}

struct Pairs(Vec<(String, String)>);

impl Pairs {
    fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self(form_urlencoded::parse(query.as_bytes()).into_owned().collect())
    }

    /// First value for `key`.
    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn all(&self, key: &str) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parse `key` with `parse`, logging and dropping rejected values.
    fn field<T>(&self, key: &str, parse: impl Fn(&str, &str) -> Result<T, ViewStateError>) -> Option<T> {
        let raw = self.get(key)?;
        match parse(key, raw) {
            Ok(v) => Some(v),
            Err(error) => {
                tracing::debug!(%error, "query field ignored");
                None
            }
        }
    }
}

fn unparsable(key: &str, value: &str) -> ViewStateError {
    ViewStateError::Unparsable {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn out_of_range(key: &str, value: &str) -> ViewStateError {
    ViewStateError::OutOfRange {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ViewStateError> {
    let v: f32 = value.trim().parse().map_err(|_| unparsable(key, value))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(unparsable(key, value))
    }
}

fn parse_positive_f32(key: &str, value: &str) -> Result<f32, ViewStateError> {
    let v = parse_f32(key, value)?;
    if v > 0.0 { Ok(v) } else { Err(out_of_range(key, value)) }
}

fn parse_non_negative_f32(key: &str, value: &str) -> Result<f32, ViewStateError> {
    let v = parse_f32(key, value)?;
    if v >= 0.0 { Ok(v) } else { Err(out_of_range(key, value)) }
}

fn parse_extent(key: &str, value: &str) -> Result<u32, ViewStateError> {
    let v: u32 = value.trim().parse().map_err(|_| unparsable(key, value))?;
    if v > 0 { Ok(v) } else { Err(out_of_range(key, value)) }
}

/// Decimal or `0x`-prefixed hex, at most `0xffffff`.
fn parse_color(key: &str, value: &str) -> Result<u32, ViewStateError> {
    let trimmed = value.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .or_else(|| trimmed.strip_prefix('#'))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => trimmed.parse(),
    };
    let v = parsed.map_err(|_| unparsable(key, value))?;
    if v <= 0xffffff { Ok(v) } else { Err(out_of_range(key, value)) }
}

fn parse_camera(_key: &str, value: &str) -> Result<[f32; 16], ViewStateError> {
    let values: Vec<f32> =
        serde_json::from_str(value).map_err(|e| ViewStateError::Camera(e.to_string()))?;
    let matrix: [f32; 16] = values
        .try_into()
        .map_err(|v: Vec<f32>| ViewStateError::Camera(format!("expected 16 values, got {}", v.len())))?;
    if matrix.iter().all(|v| v.is_finite()) {
        Ok(matrix)
    } else {
        Err(ViewStateError::Camera("non-finite value".into()))
    }
}

fn parse_mode(key: &str, value: &str) -> Result<RenderMode, ViewStateError> {
    let index: i64 = value.trim().parse().map_err(|_| unparsable(key, value))?;
    RenderMode::from_index(index).map_err(|_| out_of_range(key, value))
}

fn decode_scene(pairs: &Pairs, name: &str) -> SceneTransform {
    let key = |field: &str| format!("{name}.{field}");
    let mut params = SceneTransform::default();
    if let Some(mode) = pairs.field(&key(keys::RENDER_MODE), parse_mode) {
        params.render_mode = mode;
    }
    for axis in 0..3 {
        if let Some(v) = pairs.field(&key(keys::POSITION[axis]), parse_f32) {
            params.position[axis] = v;
        }
        if let Some(v) = pairs.field(&key(keys::SCALE[axis]), parse_non_negative_f32) {
            params.scale[axis] = v;
        }
        if let Some(v) = pairs.field(&key(keys::ROTATION[axis]), parse_f32) {
            params.rotation_deg[axis] = v;
        }
    }
    params
}

/// Decode a query string (with or without the leading `?`).
pub fn decode(query: &str) -> ViewState {
    let pairs = Pairs::parse(query);
    let defaults = GlobalConfig::default();

    let global = GlobalConfig {
        bg_color: pairs
            .field(keys::BG_COLOR, parse_color)
            .unwrap_or(defaults.bg_color),
        height: pairs.field(keys::HEIGHT, parse_extent),
        width: pairs.field(keys::WIDTH, parse_extent),
        fovy: pairs
            .field(keys::FOVY, parse_positive_f32)
            .unwrap_or(defaults.fovy),
        near: pairs
            .field(keys::NEAR, parse_positive_f32)
            .unwrap_or(defaults.near),
        far: pairs
            .field(keys::FAR, parse_positive_f32)
            .unwrap_or(defaults.far),
        base_path: pairs
            .get(keys::PATH)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
    };

    let mut scenes = SceneParams::new();
    for name in pairs.all(keys::SCENE).filter(|n| !n.is_empty()) {
        if scenes.get(name).is_none() {
            scenes.insert(name, decode_scene(&pairs, name));
        }
    }

    ViewState {
        global,
        camera: pairs.field(keys::CAMERA, parse_camera),
        scenes,
    }
}

/// Encode as a query string without the leading `?`, omitting defaults.
pub fn encode(state: &ViewState) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());
    let defaults = GlobalConfig::default();
    let g = &state.global;

    if g.bg_color != defaults.bg_color {
        out.append_pair(keys::BG_COLOR, &g.bg_color.to_string());
    }
    if let Some(h) = g.height {
        out.append_pair(keys::HEIGHT, &h.to_string());
    }
    if let Some(w) = g.width {
        out.append_pair(keys::WIDTH, &w.to_string());
    }
    for (key, value, default) in [
        (keys::FOVY, g.fovy, defaults.fovy),
        (keys::NEAR, g.near, defaults.near),
        (keys::FAR, g.far, defaults.far),
    ] {
        if value != default {
            out.append_pair(key, &value.to_string());
        }
    }
    if let Some(json) = state.camera.and_then(|c| serde_json::to_string(&c).ok()) {
        out.append_pair(keys::CAMERA, &json);
    }
    if let Some(path) = &g.base_path {
        out.append_pair(keys::PATH, path);
    }

    let default_scene = SceneTransform::default();
    for (name, params) in state.scenes.iter() {
        out.append_pair(keys::SCENE, name);
        if params.render_mode != default_scene.render_mode {
            out.append_pair(
                &format!("{name}.{}", keys::RENDER_MODE),
                &params.render_mode.index().to_string(),
            );
        }
        for axis in 0..3 {
            for (field, value, default) in [
                (keys::POSITION[axis], params.position[axis], default_scene.position[axis]),
                (keys::SCALE[axis], params.scale[axis], default_scene.scale[axis]),
                (keys::ROTATION[axis], params.rotation_deg[axis], default_scene.rotation_deg[axis]),
            ] {
                if value != default {
                    out.append_pair(&format!("{name}.{field}"), &value.to_string());
                }
            }
        }
    }
    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn empty_query_is_all_defaults() {
        assert_eq!(decode(""), ViewState::default());
        assert_eq!(decode("?"), ViewState::default());
        assert_eq!(encode(&ViewState::default()), "");
    }

    #[test]
    fn scene_field_defaults_are_omitted() {
        let mut state = ViewState::default();
        state.scenes.insert(
            "alpha",
            SceneTransform {
                position: Vec3::new(2.0, 0.0, 0.0),
                ..Default::default()
            },
        );
        let query = encode(&state);
        assert_eq!(query, "scene=alpha&alpha.pos_x=2");

        let decoded = decode(&query);
        let alpha = decoded.scenes.get("alpha").unwrap();
        assert_eq!(alpha.position.x, 2.0);
        assert_eq!(alpha.scale.y, 1.0);
        assert_eq!(alpha.rotation_deg.z, 0.0);
        assert_eq!(decoded, state);
    }

    #[test]
    fn global_fields_decode() {
        let s = decode("?bg_color=0x000000&H=800&W=1200&fovy=45&near=0.1&far=50&path=https%3A%2F%2Fcdn.test%2Fdata");
        assert_eq!(s.global.bg_color, 0);
        assert_eq!(s.global.height, Some(800));
        assert_eq!(s.global.width, Some(1200));
        assert_eq!(s.global.fovy, 45.0);
        assert_eq!(s.global.near, 0.1);
        assert_eq!(s.global.far, 50.0);
        assert_eq!(s.global.base_path.as_deref(), Some("https://cdn.test/data"));
        assert!(s.scenes.is_empty());
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let s = decode(
            "bg_color=zzz&H=0&W=-5&fovy=NaN&near=abc&far=inf&cameraState=[1,2]\
             &scene=a&a.renderMode=7&a.scale_x=-1&a.pos_y=oops",
        );
        let defaults = GlobalConfig::default();
        assert_eq!(s.global, defaults);
        assert_eq!(s.camera, None);
        assert_eq!(s.scenes.get("a"), Some(&SceneTransform::default()));
    }

    #[test]
    fn zero_scale_is_kept() {
        let s = decode("scene=a&a.scale_x=0");
        assert_eq!(s.scenes.get("a").unwrap().scale.x, 0.0);
    }

    #[test]
    fn decimal_and_hex_colours() {
        assert_eq!(decode("bg_color=255").global.bg_color, 255);
        assert_eq!(decode("bg_color=0xff00ff").global.bg_color, 0xff00ff);
        assert_eq!(decode("bg_color=16777216").global.bg_color, 0xffffff);
    }

    #[test]
    fn scene_names_are_percent_decoded_and_deduped() {
        let s = decode("scene=trial%2Fmesh_stage1%2F&scene=b&scene=trial/mesh_stage1/&trial%2Fmesh_stage1%2F.rot_z=90");
        assert_eq!(s.scenes.names().collect::<Vec<_>>(), vec!["trial/mesh_stage1/", "b"]);
        assert_eq!(s.scenes.get("trial/mesh_stage1/").unwrap().rotation_deg.z, 90.0);
    }

    #[test]
    fn full_round_trip() {
        let mut state = ViewState {
            global: GlobalConfig {
                bg_color: 0x336699,
                height: Some(720),
                width: Some(1280),
                fovy: 35.5,
                near: 0.001,
                far: 1000.0,
                base_path: Some("data/scenes".into()),
            },
            camera: Some([
                1.0, 0.0, 0.0, 0.0, 0.0, 0.866_025_4, -0.5, 0.0, 0.0, 0.5, 0.866_025_4, 0.0, 0.0,
                2.0, 3.464, 1.0,
            ]),
            scenes: SceneParams::new(),
        };
        state.scenes.insert(
            "room one",
            SceneTransform {
                position: Vec3::new(0.1, -3.25, 10.0),
                scale: Vec3::new(0.0, 2.5, 1.0),
                rotation_deg: Vec3::new(45.0, 0.0, 359.9),
                render_mode: RenderMode::SpecularOnly,
            },
        );
        state.scenes.insert("lego", SceneTransform::default());

        let query = encode(&state);
        assert!(query.contains("scene=room+one"));
        assert_eq!(decode(&query), state);
        assert_eq!(decode(&format!("?{query}")), state);
    }
}
