use cfd_flowplot::{FlowField, FromBinary, ReshapePolicy, VectorGrid};
use nalgebra::DMatrix;
use serde::Serialize;
use std::{env, fs::File, path::Path};

/// Python friendly layout: nested row-major lists
#[derive(Serialize)]
struct Components {
    u: Vec<Vec<f64>>,
    v: Vec<Vec<f64>>,
    magnitude: Vec<Vec<f64>>,
}

fn rows(m: &DMatrix<f64>) -> Vec<Vec<f64>> {
    m.row_iter().map(|row| row.iter().cloned().collect()).collect()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    for arg in env::args().skip(1) {
        let path = Path::new(&arg);
        println!("{:?}", path);
        let grid = VectorGrid::from_bin(path, ReshapePolicy::Truncate)?;
        let field = FlowField::from_grid(&grid);
        let data = Components {
            u: rows(&field.u),
            v: rows(&field.v),
            magnitude: rows(&field.magnitude),
        };
        serde_pickle::to_writer(
            &mut File::create(path.with_extension("pkl"))?,
            &data,
            Default::default(),
        )?;
    }
    Ok(())
}
