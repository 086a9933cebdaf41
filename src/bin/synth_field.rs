use anyhow::Context;
use cfd_flowplot::{velocities, write_samples, write_text, Bound, Solver, Vector2, VectorGrid};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    /// Constant flow along the diagonal
    Uniform,
    /// Solid body rotation about the center
    Vortex,
    /// Radial outflow from the center
    Source,
    /// Hyperbolic stagnation point at the center
    Saddle,
    /// Potential flow through a channel around a cross shaped wall
    Poisson,
}

/// Writes a synthetic vector field dump and its text listing
#[derive(Parser)]
#[command(name = "synth_field")]
struct Cli {
    /// Grid side length
    #[arg(short, long, default_value_t = 64)]
    side: usize,
    #[arg(short, long, value_enum, default_value_t = Kind::Vortex)]
    kind: Kind,
    #[arg(short, long, default_value = "vec.bin")]
    output: PathBuf,
    /// Poisson solver convergence threshold
    #[arg(long, default_value_t = 1e-2)]
    epsilon: f64,
    /// Poisson solver iteration limit
    #[arg(long, default_value_t = 10_000)]
    max_iter: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let n = cli.side;
    let grid = match cli.kind {
        Kind::Poisson => {
            let solution = Solver::new(cli.epsilon, cli.max_iter).solve(n, &Bound::channel(n));
            println!(
                "{n}x{n} potential: {} iterations, residual {:e}",
                solution.iterations, solution.residual
            );
            velocities(&solution.phi)
        }
        kind => {
            let c = n.saturating_sub(1) as f64 / 2.0;
            // row is y, column is x
            VectorGrid::from_fn(n, |i, j| {
                let (x, y) = (j as f64 - c, i as f64 - c);
                let (u, v) = match kind {
                    Kind::Uniform => (1.0, 1.0),
                    Kind::Vortex => (-y, x),
                    Kind::Source => (x, y),
                    Kind::Saddle | Kind::Poisson => (x, -y),
                };
                Vector2::new(u, v)
            })
        }
    };
    write_samples(&cli.output, &grid.to_samples())
        .with_context(|| format!("failed to write {:?}", cli.output))?;
    let text = cli.output.with_extension("txt");
    write_text(&text, &grid).with_context(|| format!("failed to write {:?}", text))?;
    println!("{:?}: {n}x{n} {:?} field", cli.output, cli.kind);
    Ok(())
}
