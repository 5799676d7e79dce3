use cascadeview_assets::AssetKind;

pub const LOADED_MARKER: char = '🟢';
pub const PENDING_MARKER: char = '🔴';

/// Per-scene markers, three per cascade: mesh, diffuse, specular.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProgress {
    markers: Vec<bool>,
}

impl LoadProgress {
    /// `None` when the marker count overflows.
    pub fn new(cascades: usize) -> Option<Self> {
        let len = cascades.checked_mul(AssetKind::ALL.len())?;
        Some(Self {
            markers: vec![false; len],
        })
    }

    fn index(cascade: usize, kind: AssetKind) -> Option<usize> {
        cascade
            .checked_mul(AssetKind::ALL.len())
            .map(|base| base + kind.marker_offset())
    }

    /// Flip a marker to loaded. Returns false when out of range.
    pub fn mark(&mut self, cascade: usize, kind: AssetKind) -> bool {
        match Self::index(cascade, kind).and_then(|i| self.markers.get_mut(i)) {
            Some(m) => {
                *m = true;
                true
            }
            None => false,
        }
    }

    pub fn is_loaded(&self, cascade: usize, kind: AssetKind) -> bool {
        Self::index(cascade, kind)
            .and_then(|i| self.markers.get(i))
            .copied()
            .unwrap_or(false)
    }

    pub fn markers(&self) -> &[bool] {
        &self.markers
    }

    pub fn cascades(&self) -> usize {
        self.markers.len() / 3
    }

    pub fn loaded_count(&self) -> usize {
        self.markers.iter().filter(|m| **m).count()
    }

    pub fn is_complete(&self) -> bool {
        self.markers.iter().all(|m| *m)
    }

    pub fn readout(&self) -> String {
        self.markers
            .iter()
            .map(|m| if *m { LOADED_MARKER } else { PENDING_MARKER })
            .collect()
    }
}

/// Progress of every requested scene, in request order.
///
/// A scene has no markers until its manifest resolves.
#[derive(Debug, Clone, Default)]
pub struct ProgressBoard {
    scenes: Vec<(String, Option<LoadProgress>)>,
}

impl ProgressBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, scene: &str) -> bool {
        self.scenes.iter().any(|(name, _)| name == scene)
    }

    /// Record a request. Repeated requests keep the first position.
    pub fn request(&mut self, scene: &str) {
        if !self.contains(scene) {
            self.scenes.push((scene.to_string(), None));
        }
    }

    /// Size the scene's markers once its manifest is known. Returns false
    /// for an unknown scene or an unrepresentable cascade count.
    pub fn resolve(&mut self, scene: &str, cascades: usize) -> bool {
        let Some((_, progress)) = self.scenes.iter_mut().find(|(name, _)| name == scene) else {
            return false;
        };
        *progress = LoadProgress::new(cascades);
        progress.is_some()
    }

    pub fn mark(&mut self, scene: &str, cascade: usize, kind: AssetKind) -> bool {
        self.scenes
            .iter_mut()
            .find(|(name, _)| name == scene)
            .and_then(|(_, p)| p.as_mut())
            .is_some_and(|p| p.mark(cascade, kind))
    }

    pub fn remove(&mut self, scene: &str) {
        self.scenes.retain(|(name, _)| name != scene);
    }

    pub fn get(&self, scene: &str) -> Option<&LoadProgress> {
        self.scenes
            .iter()
            .find(|(name, _)| name == scene)
            .and_then(|(_, p)| p.as_ref())
    }

    /// Resolved scenes' readouts joined by `|`.
    pub fn readout(&self) -> String {
        self.scenes
            .iter()
            .filter_map(|(_, p)| p.as_ref().map(LoadProgress::readout))
            .collect::<Vec<_>>()
            .join("|")
    }
}
