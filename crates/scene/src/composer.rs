use cascadeview_common::{ObjectId, RenderMode, SceneTransform, Transform};

use crate::{SceneEdit, SceneNode};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("scene `{0}` is not configured")]
    UnknownScene(String),
    #[error("cascade {cascade} of scene `{scene}` is already attached")]
    AlreadyAttached { scene: String, cascade: usize },
}

/// One attached cascade: the renderable tree plus its world transform.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: ObjectId,
    pub scene: String,
    pub cascade: usize,
    pub root: SceneNode,
    pub transform: Transform,
}

#[derive(Debug, Clone)]
struct SceneEntry {
    name: String,
    params: SceneTransform,
    objects: Vec<SceneObject>,
}

impl SceneEntry {
    /// Store `params` and push them to every attached object.
    fn apply(&mut self, params: SceneTransform) {
        let mode_changed = self.params.render_mode != params.render_mode;
        self.params = params;
        let transform = params.to_transform();
        for object in &mut self.objects {
            object.transform = transform;
            if mode_changed {
                object
                    .root
                    .visit_meshes_mut(&mut |m| m.material.mode = params.render_mode);
            }
        }
    }
}

/// Owns every configured scene and the objects attached to it.
///
/// Scenes keep configuration order. All mutations happen on the thread that
/// owns the composer; loaders hand results over instead of touching it.
#[derive(Debug, Clone, Default)]
pub struct SceneComposer {
    scenes: Vec<SceneEntry>,
}

impl SceneComposer {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, name: &str) -> Option<&SceneEntry> {
        self.scenes.iter().find(|s| s.name == name)
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut SceneEntry, ComposeError> {
        self.scenes
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| ComposeError::UnknownScene(name.to_string()))
    }

    /// Register `name` with initial parameters, or replace the parameters of
    /// an already configured scene (re-applied to its objects).
    pub fn configure(&mut self, name: &str, params: SceneTransform) {
        if let Some(entry) = self.scenes.iter_mut().find(|s| s.name == name) {
            entry.apply(params);
            return;
        }
        tracing::debug!(scene = name, "scene configured");
        self.scenes.push(SceneEntry {
            name: name.to_string(),
            params,
            objects: Vec::new(),
        });
    }

    pub fn is_configured(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Current parameters of a scene.
    pub fn params(&self, name: &str) -> Option<SceneTransform> {
        self.entry(name).map(|s| s.params)
    }

    /// Configured scene names, in configuration order.
    pub fn scene_names(&self) -> impl Iterator<Item = &str> {
        self.scenes.iter().map(|s| s.name.as_str())
    }

    /// `(name, params)` for every scene, in configuration order.
    pub fn scene_params(&self) -> Vec<(String, SceneTransform)> {
        self.scenes
            .iter()
            .map(|s| (s.name.clone(), s.params))
            .collect()
    }

    /// Attach a loaded cascade under `name`.
    ///
    /// The object starts with a snapshot of the scene's current parameters:
    /// transform on the root, render mode on every mesh leaf.
    pub fn attach(
        &mut self,
        name: &str,
        cascade: usize,
        mut root: SceneNode,
    ) -> Result<ObjectId, ComposeError> {
        let entry = self.entry_mut(name)?;
        if entry.objects.iter().any(|o| o.cascade == cascade) {
            return Err(ComposeError::AlreadyAttached {
                scene: name.to_string(),
                cascade,
            });
        }
        let mode = entry.params.render_mode;
        root.visit_meshes_mut(&mut |m| m.material.mode = mode);
        let id = ObjectId::new();
        entry.objects.push(SceneObject {
            id,
            scene: name.to_string(),
            cascade,
            root,
            transform: entry.params.to_transform(),
        });
        tracing::info!(
            scene = name,
            cascade,
            object = %id.short(),
            mode = mode.label(),
            "cascade attached"
        );
        Ok(id)
    }

    /// Replace a scene's parameters and apply them to every attached
    /// object. Returns the number of objects updated.
    pub fn set_transform(&mut self, name: &str, params: SceneTransform) -> Result<usize, ComposeError> {
        let entry = self.entry_mut(name)?;
        entry.apply(params);
        Ok(entry.objects.len())
    }

    /// Push a render mode to every mesh leaf of the scene's objects.
    pub fn set_render_mode(&mut self, name: &str, mode: RenderMode) -> Result<usize, ComposeError> {
        let entry = self.entry_mut(name)?;
        entry.params.render_mode = mode;
        let mut leaves = 0;
        for object in &mut entry.objects {
            object.root.visit_meshes_mut(&mut |m| {
                m.material.mode = mode;
                leaves += 1;
            });
        }
        tracing::debug!(scene = name, mode = mode.label(), leaves, "render mode set");
        Ok(leaves)
    }

    /// Apply one control edit to a scene and its objects.
    pub fn apply_edit(&mut self, name: &str, edit: SceneEdit) -> Result<(), ComposeError> {
        let mut params = self
            .params(name)
            .ok_or_else(|| ComposeError::UnknownScene(name.to_string()))?;
        match edit {
            SceneEdit::RenderMode(mode) => {
                self.set_render_mode(name, mode)?;
            }
            _ => {
                edit.apply_to(&mut params);
                self.set_transform(name, params)?;
            }
        }
        Ok(())
    }

    /// Objects attached under a scene, in attach order.
    pub fn objects(&self, name: &str) -> &[SceneObject] {
        self.entry(name).map(|s| s.objects.as_slice()).unwrap_or(&[])
    }

    /// Every attached object across all scenes.
    pub fn all_objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.scenes.iter().flat_map(|s| s.objects.iter())
    }

    pub fn object_count(&self) -> usize {
        self.scenes.iter().map(|s| s.objects.len()).sum()
    }

    /// Remove a scene and drop its objects. Resources shared only with those
    /// objects are released with them.
    pub fn unload_scene(&mut self, name: &str) -> bool {
        let Some(index) = self.scenes.iter().position(|s| s.name == name) else {
            return false;
        };
        let entry = self.scenes.remove(index);
        tracing::info!(scene = name, objects = entry.objects.len(), "scene unloaded");
        true
    }
}
