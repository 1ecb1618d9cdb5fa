use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use gpu_bvh::buffers::FileSink;
use gpu_bvh::SceneContext;
use log::info;

const DEFAULT_OUT_DIR: &str = "./buffers";

fn main() -> Result<()> {
    pretty_env_logger::init();

    let mut args = env::args().skip(1);
    let Some(scene_path) = args.next().map(PathBuf::from) else {
        bail!("usage: gpu-bvh <scene.yaml|scene.json> [out-dir]");
    };
    let out_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));

    let mut scene = SceneContext::from_path(&scene_path)
        .with_context(|| format!("loading {}", scene_path.display()))?;
    match scene.options().seed {
        Some(seed) => info!("building with seed {seed}"),
        None => info!("building unseeded, split axes will vary between runs"),
    }
    let buffers = scene.gpu_buffers().context("building scene buffers")?;

    let mut sink = FileSink::new(&out_dir);
    buffers
        .upload(&mut sink)
        .with_context(|| format!("writing buffers to {}", out_dir.display()))?;

    info!(
        "wrote {} nodes, {} primitives, {} materials, {} lights to {}",
        buffers.nodes.len(),
        buffers.primitives.len(),
        buffers.materials.len(),
        buffers.lights.len(),
        out_dir.display()
    );
    Ok(())
}
