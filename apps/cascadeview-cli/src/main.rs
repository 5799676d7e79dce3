use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use cascadeview_assets::{AnySource, AssetKind, AssetLayout, AssetSource, SceneManifest};
use cascadeview_common::RenderMode;
use cascadeview_render::{DebugTextRenderer, RenderView, Renderer};
use cascadeview_scene::SceneComposer;
use cascadeview_stream::{CascadeLoader, LoadSession, StreamConfig};
use clap::{Parser, Subcommand};
use glam::Vec3;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cascadeview-cli", about = "CLI tool for cascade scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default asset layout
    Info,
    /// Fetch a scene manifest and list the files its cascades need
    Inspect {
        /// Scene folder name
        scene: String,
        /// Asset root (directory or http(s) URL)
        #[arg(long, default_value = ".")]
        base_path: String,
        /// Extension of the feature images
        #[arg(long, default_value = "jpg")]
        image_ext: String,
    },
    /// Pack a manifest's layers and print the weight textures
    Pack {
        /// Path to an `mlp.json`
        manifest: PathBuf,
        /// Texels printed per layer
        #[arg(short, long, default_value = "4")]
        texels: usize,
    },
    /// Evaluate the appearance network for one pixel
    Eval {
        /// Path to an `mlp.json`
        manifest: PathBuf,
        /// Specular features `r,g,b`
        #[arg(long, value_parser = parse_vec3, default_value = "0.5,0.5,0.5")]
        features: Vec3,
        /// View direction `x,y,z`
        #[arg(long, value_parser = parse_vec3, default_value = "0,0,-1")]
        dir: Vec3,
        /// Diffuse sample `r,g,b`
        #[arg(long, value_parser = parse_vec3, default_value = "0,0,0")]
        diffuse: Vec3,
        /// Render mode index (0 normal, 1 diffuse, 2 specular)
        #[arg(long, default_value = "0")]
        mode: i64,
    },
    /// Decode a view-state query string and print its canonical form
    Url {
        query: String,
        /// Prefix the canonical query with this link base
        #[arg(long)]
        base: Option<String>,
    },
    /// Load every scene of a query headlessly and print the composed result
    Load {
        query: String,
        /// Asset root used when the query carries no `path`
        #[arg(long, default_value = ".")]
        base_path: String,
        #[arg(long, default_value = "jpg")]
        image_ext: String,
    },
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("`{p}`: {e}")))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("expected three comma-separated numbers, got `{s}`")),
    }
}

fn read_manifest(path: &Path) -> Result<SceneManifest> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(SceneManifest::from_slice(&bytes)?)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start runtime")
}

fn info() -> String {
    let layout = AssetLayout::default();
    let mut out = String::new();
    let _ = writeln!(out, "cascadeview-cli v{}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(out, "manifest: <scene>/{}", layout.manifest_name);
    for kind in AssetKind::ALL {
        let _ = writeln!(out, "{}: {}", kind.label(), layout.asset("<scene>", 0, kind));
    }
    let _ = writeln!(
        out,
        "events per frame: {}",
        StreamConfig::default().event_budget
    );
    out
}

async fn inspect(source: &impl AssetSource, layout: &AssetLayout, scene: &str) -> Result<String> {
    let path = layout.manifest(scene);
    let bytes = source
        .fetch(&path)
        .await
        .with_context(|| format!("fetch {path} from {}", source.describe()))?;
    let manifest = SceneManifest::from_slice(&bytes)?;
    let spec = manifest.spec()?;

    let mut out = String::new();
    let _ = writeln!(out, "scene {scene}: {} cascades", manifest.cascade);
    let _ = writeln!(
        out,
        "network: {} -> {} -> {}",
        spec.input_dim, spec.hidden_dim, spec.output_dim
    );
    for cascade in 0..manifest.cascade {
        let files: Vec<String> = AssetKind::ALL
            .iter()
            .map(|kind| layout.asset(scene, cascade, *kind))
            .collect();
        let _ = writeln!(out, "  [{cascade}] {}", files.join(" "));
    }
    Ok(out)
}

fn pack(manifest: &SceneManifest, texels: usize) -> Result<String> {
    let network = manifest.build_network()?;
    let mut out = String::new();
    for (name, layer) in [("layer0", network.layer0()), ("layer1", network.layer1())] {
        let _ = writeln!(
            out,
            "{name}: {}x{} (padded {}) -> {}x{} texels",
            layer.rows(),
            layer.cols(),
            layer.cols_padded(),
            layer.width(),
            layer.height()
        );
        for (k, texel) in layer.texels().iter().take(texels).enumerate() {
            let _ = writeln!(
                out,
                "  ({k}) [{:.4}, {:.4}, {:.4}, {:.4}]",
                texel[0], texel[1], texel[2], texel[3]
            );
        }
    }
    Ok(out)
}

fn eval(
    manifest: &SceneManifest,
    features: Vec3,
    dir: Vec3,
    diffuse: Vec3,
    mode: RenderMode,
) -> Result<Vec3> {
    let network = manifest.build_network()?;
    Ok(network.shade(mode, diffuse, features.extend(1.0), dir))
}

fn canonical_url(query: &str, base: Option<&str>) -> String {
    let state = cascadeview_viewstate::decode(query);
    match base {
        Some(base) => state.share_url(base),
        None => cascadeview_viewstate::encode(&state),
    }
}

async fn load<S: AssetSource>(mut session: LoadSession<S>, query: &str) -> Result<String> {
    let view = cascadeview_viewstate::decode(query);
    if view.scenes.is_empty() {
        bail!("no scenes requested; add `scene=<name>` to the query");
    }

    let mut composer = SceneComposer::new();
    for (name, params) in view.scenes.iter() {
        composer.configure(name, *params);
        session.request(name);
    }
    session.finish(&mut composer).await;

    let render_view = RenderView {
        fovy: view.global.fovy,
        near: view.global.near,
        far: view.global.far,
        background: view.global.bg_rgb(),
        ..RenderView::default()
    };
    let mut out = DebugTextRenderer::new().render(&composer, &render_view);
    let _ = writeln!(out, "progress: {}", session.progress_readout());
    let _ = writeln!(
        out,
        "attached: {} failures: {}",
        session.stats().attached_total,
        session.stats().failures_total
    );
    Ok(out)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => print!("{}", info()),
        Commands::Inspect {
            scene,
            base_path,
            image_ext,
        } => {
            let source = AnySource::from_base(&base_path);
            let layout = AssetLayout::with_image_extension(image_ext);
            let out = runtime()?.block_on(inspect(&source, &layout, &scene))?;
            print!("{out}");
        }
        Commands::Pack { manifest, texels } => {
            print!("{}", pack(&read_manifest(&manifest)?, texels)?);
        }
        Commands::Eval {
            manifest,
            features,
            dir,
            diffuse,
            mode,
        } => {
            let mode = RenderMode::from_index(mode)?;
            let rgb = eval(&read_manifest(&manifest)?, features, dir, diffuse, mode)?;
            println!("{:.6} {:.6} {:.6}", rgb.x, rgb.y, rgb.z);
        }
        Commands::Url { query, base } => {
            println!("{}", canonical_url(&query, base.as_deref()));
        }
        Commands::Load {
            query,
            base_path,
            image_ext,
        } => {
            let rt = runtime()?;
            let view = cascadeview_viewstate::decode(&query);
            let base = view.global.base_path.unwrap_or(base_path);
            let loader = CascadeLoader::new(
                AnySource::from_base(&base),
                AssetLayout::with_image_extension(image_ext),
                rt.handle().clone(),
            );
            let session = LoadSession::new(loader, StreamConfig::default());
            let out = rt.block_on(load(session, &query))?;
            print!("{out}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascadeview_assets::{FsSource, MemorySource, TextureData};

    const TRIANGLE_OBJ: &str = "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n";

    fn manifest_json(cascades: usize) -> String {
        let layer0 = vec![vec![0.0; 8]; 6];
        let layer1 = vec![vec![0.0; 3]; 8];
        SceneManifest::to_json(cascades, &layer0, &layer1)
    }

    fn write_scene(root: &std::path::Path, scene: &str, cascades: usize) {
        let layout = AssetLayout::default();
        let png = TextureData::solid(1, 1, [255, 0, 0, 255]).encode_png().unwrap();
        std::fs::create_dir_all(root.join(scene)).unwrap();
        std::fs::write(root.join(layout.manifest(scene)), manifest_json(cascades)).unwrap();
        for i in 0..cascades {
            std::fs::write(root.join(layout.asset(scene, i, AssetKind::Mesh)), TRIANGLE_OBJ).unwrap();
            std::fs::write(root.join(layout.asset(scene, i, AssetKind::Diffuse)), &png).unwrap();
            std::fs::write(root.join(layout.asset(scene, i, AssetKind::Specular)), &png).unwrap();
        }
    }

    #[test]
    fn parse_vec3_accepts_triples_only() {
        assert_eq!(parse_vec3("1, 2,3").unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("a,b,c").is_err());
    }

    #[tokio::test]
    async fn inspect_lists_cascade_files() {
        let mut source = MemorySource::new();
        source.insert("room/mlp.json", manifest_json(2).into_bytes());
        let out = inspect(&source, &AssetLayout::default(), "room").await.unwrap();
        assert!(out.contains("scene room: 2 cascades"));
        assert!(out.contains("network: 6 -> 8 -> 3"));
        assert!(out.contains("[1] room/mesh_1.obj room/feat0_1.jpg room/feat1_1.jpg"));
    }

    #[test]
    fn pack_reports_texture_shapes() {
        let manifest = SceneManifest::from_slice(manifest_json(1).as_bytes()).unwrap();
        let out = pack(&manifest, 1).unwrap();
        assert!(out.contains("layer0: 8x6 (padded 8) -> 1x16 texels"));
        assert!(out.contains("layer1: 3x8 (padded 8) -> 1x6 texels"));
    }

    #[test]
    fn zero_weights_evaluate_to_half() {
        let manifest = SceneManifest::from_slice(manifest_json(1).as_bytes()).unwrap();
        let rgb = eval(&manifest, Vec3::ONE, Vec3::Z, Vec3::ZERO, RenderMode::SpecularOnly).unwrap();
        assert!((rgb - Vec3::splat(0.5)).length() < 1e-6);
        let rgb = eval(&manifest, Vec3::ONE, Vec3::Z, Vec3::splat(0.7), RenderMode::Normal).unwrap();
        assert!((rgb - Vec3::ONE).length() < 1e-6);
    }

    #[test]
    fn url_is_canonicalized() {
        assert_eq!(
            canonical_url("?scene=a&a.pos_x=2&fovy=60&scene=a", None),
            "scene=a&a.pos_x=2"
        );
        assert_eq!(canonical_url("scene=a", Some("view.html?old=1")), "view.html?scene=a");
    }

    #[test]
    fn load_composes_scenes_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_scene(dir.path(), "room", 2);

        let rt = runtime().unwrap();
        let loader = CascadeLoader::new(
            FsSource::new(dir.path()),
            AssetLayout::default(),
            rt.handle().clone(),
        );
        let session = LoadSession::new(loader, StreamConfig::default());
        let out = rt.block_on(load(session, "scene=room&scene=missing")).unwrap();
        assert!(out.contains("Scenes: 2 / objects: 2"));
        assert!(out.contains("progress: 🟢🟢🟢🟢🟢🟢"));
        assert!(out.contains("attached: 2"));
    }

    #[test]
    fn load_without_scenes_is_an_error() {
        let rt = runtime().unwrap();
        let loader = CascadeLoader::new(MemorySource::new(), AssetLayout::default(), rt.handle().clone());
        let session = LoadSession::new(loader, StreamConfig::default());
        assert!(rt.block_on(load(session, "bg_color=0")).is_err());
    }
}
