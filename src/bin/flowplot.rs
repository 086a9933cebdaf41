use anyhow::Context;
use cfd_flowplot::{batch, PlotOptions, RasterRenderer, ReshapePolicy};
use clap::Parser;
use std::{path::PathBuf, time::Instant};

/// Renders stream and magnitude plots of every `.bin` vector field in a directory
#[derive(Parser)]
#[command(name = "flowplot", version)]
struct Cli {
    /// Directory holding the `.bin` dumps [default: the executable's directory]
    #[arg(short, long)]
    input_dir: Option<PathBuf>,
    /// Directory the images are written to [default: <input-dir>/plots]
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// JSON file with plot options
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Reject dumps that are not exactly 2·S² samples instead of truncating them
    #[arg(long)]
    strict: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let input_dir = match cli.input_dir {
        Some(dir) => dir,
        None => std::env::current_exe()?
            .parent()
            .context("executable has no parent directory")?
            .to_path_buf(),
    };
    let output_dir = cli.output_dir.unwrap_or_else(|| input_dir.join("plots"));
    let options = match &cli.config {
        Some(path) => PlotOptions::from_json_file(path)
            .with_context(|| format!("failed to load plot options from {path:?}"))?,
        None => PlotOptions::default(),
    };
    let policy = if cli.strict {
        ReshapePolicy::Strict
    } else {
        ReshapePolicy::Truncate
    };
    let renderer = RasterRenderer::new(options)?;

    let now = Instant::now();
    let written = batch::run(&input_dir, &output_dir, policy, &renderer)
        .with_context(|| format!("failed to render {input_dir:?}"))?;
    for path in &written {
        println!("{:?}", path);
    }
    println!("{} image(s) in {}ms", written.len(), now.elapsed().as_millis());
    Ok(())
}
