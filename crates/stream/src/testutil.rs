use cascadeview_assets::{AssetKind, AssetLayout, MemorySource, SceneManifest, TextureData};

pub struct TestScene {
    pub name: String,
    pub cascades: usize,
    pub hidden: usize,
}

impl TestScene {
    pub fn new(name: &str, cascades: usize, hidden: usize) -> Self {
        Self {
            name: name.to_string(),
            cascades,
            hidden,
        }
    }
}

pub const TRIANGLE_OBJ: &[u8] = b"o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n";

pub fn manifest_json(cascades: usize, hidden: usize) -> String {
    let layer0: Vec<Vec<f32>> = (0..6)
        .map(|a| (0..hidden).map(|b| ((a * hidden + b) % 7) as f32 * 0.1 - 0.3).collect())
        .collect();
    let layer1: Vec<Vec<f32>> = (0..hidden)
        .map(|a| (0..3).map(|b| ((a + b) % 5) as f32 * 0.05).collect())
        .collect();
    SceneManifest::to_json(cascades, &layer0, &layer1)
}

/// Memory source holding complete scene folders (PNG bytes under the
/// default `.jpg` names; decoding sniffs the format).
pub fn scene_source(scenes: &[TestScene]) -> MemorySource {
    let layout = AssetLayout::default();
    let png = TextureData::solid(2, 2, [128, 64, 32, 255])
        .encode_png()
        .unwrap();
    let mut source = MemorySource::new();
    for scene in scenes {
        source.insert(
            layout.manifest(&scene.name),
            manifest_json(scene.cascades, scene.hidden).into_bytes(),
        );
        for cascade in 0..scene.cascades {
            source.insert(layout.asset(&scene.name, cascade, AssetKind::Mesh), TRIANGLE_OBJ);
            source.insert(layout.asset(&scene.name, cascade, AssetKind::Diffuse), png.clone());
            source.insert(layout.asset(&scene.name, cascade, AssetKind::Specular), png.clone());
        }
    }
    source
}
