//! Headless frame loop: load a JSON scene, run it for a few seconds of scene time on the null
//! backend and report what the backend saw.
//!
//! Usage: `frame_loop [scene.json] [engine-config.json]`

use std::path::PathBuf;

use scenegl_core::{init_tracing, load_engine_config_from, EngineConfig};
use scenegl_graph::{EngineError, NullBackend, ParamValue, Scene, SoftwareStateDriver};
use scenegl_runtime::builtin_registry;
use scenegl_runtime::scene_json::load_scene_json;
use tracing::info;

const FPS: f64 = 30.0;
const FRAMES: u32 = 90;

fn main() {
    if let Err(e) = run() {
        eprintln!("[scenegl frame_loop] error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), EngineError> {
    let mut args = std::env::args().skip(1);
    let scene_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scene.json"));
    let config = match args.next() {
        Some(path) => load_engine_config_from(path)?,
        None => EngineConfig::default(),
    };
    init_tracing(&config.log_filter)?;

    let mut scene = Scene::with_config(builtin_registry()?, config);
    let ctx = scene.create_context(
        Box::new(NullBackend::new()),
        Box::new(SoftwareStateDriver::new()),
    );
    let root = load_scene_json(&mut scene, &scene_path)?;
    info!("loaded {} nodes from {}", scene.len(), scene_path.display());

    scene.attach(root, ctx)?;
    // Flip the first Select found under the root halfway through.
    let switch = scene
        .node(root)?
        .children()
        .into_iter()
        .find(|id| scene.node(*id).map_or(false, |n| n.class().name() == "Select"));

    for frame in 0..FRAMES {
        let t = f64::from(frame) / FPS;
        if frame == FRAMES / 2 {
            if let Some(switch) = switch {
                scene.set_param(switch, "index", ParamValue::Int(1))?;
            }
        }
        scene.render_frame(root, t)?;
    }

    let stats = scene.context(ctx)?.backend().stats();
    info!(
        "{FRAMES} frames: {} draws, {} render passes, {} pipelines created, {} alive",
        stats.draws,
        stats.render_passes,
        stats.pipelines_created,
        stats.live_pipelines()
    );

    scene.detach(root)?;
    scene.unref_node(root)?;
    scene.release_context(ctx)?;
    info!("scene torn down, {} nodes left", scene.len());
    Ok(())
}
