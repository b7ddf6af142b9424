use anyhow::{Context, Result};
use clap::Parser;
use log::info;

mod config;
mod datasets;
mod error;
mod pipeline;
mod relief;
mod render;

use config::Config;

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::parse();
    let pipeline = config.pipeline();
    info!(
        "Rendering {} from {} ({} projection, {} fill, {} adjacency)",
        pipeline.output.display(),
        pipeline.data_dir.display(),
        config.projection,
        config.fill,
        config.adjacency
    );

    let artifact = pipeline::run(&pipeline)
        .with_context(|| format!("failed to render {}", pipeline.output.display()))?;

    info!(
        "Done: {} ({} regions, {} borders, {} colors, {} bytes)",
        artifact.path.display(),
        artifact.regions,
        artifact.edges,
        artifact.colors_used,
        artifact.bytes_written
    );
    Ok(())
}
