use super::{Error, Result, VectorGrid};
use std::{
    io::{BufWriter, Write},
    path::Path,
};

const SAMPLE_SIZE: usize = std::mem::size_of::<f64>();

/// Decodes a little-endian `f64` buffer
///
/// The samples are copied out so the returned vector does not borrow from `bytes`.
pub fn samples_from_bytes(bytes: &[u8]) -> Result<Vec<f64>> {
    if bytes.len() % SAMPLE_SIZE != 0 {
        return Err(Error::Decode(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(SAMPLE_SIZE)
        .map(|chunk| {
            let mut raw = [0u8; SAMPLE_SIZE];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect())
}

/// Reads a whole vector field dump into memory
pub fn read_samples<P: AsRef<Path>>(path: P) -> Result<Vec<f64>> {
    let bytes = std::fs::read(path.as_ref())?;
    log::debug!("{:?}: {} bytes", path.as_ref(), bytes.len());
    samples_from_bytes(&bytes)
}

/// Writes samples in the same layout [read_samples] expects
pub fn write_samples<P: AsRef<Path>>(path: P, samples: &[f64]) -> Result<()> {
    let bytes: Vec<u8> = samples.iter().flat_map(|x| x.to_le_bytes()).collect();
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Writes one `column row dx dy` line per grid cell, rows first
pub fn write_text<P: AsRef<Path>>(path: P, grid: &VectorGrid) -> Result<()> {
    let mut writer = BufWriter::new(std::fs::File::create(path)?);
    for (i, row) in grid.rows().enumerate() {
        for (j, v) in row.iter().enumerate() {
            writeln!(writer, "{j} {i} {} {}", v.dx, v.dy)?;
        }
    }
    writer.flush()?;
    Ok(())
}
