use super::{FlowField, FromBinary, Renderer, ReshapePolicy, Result, VectorGrid};
use std::path::{Path, PathBuf};

/// Extension of the vector field dumps
pub const EXTENSION: &str = "bin";

/// Lists the `.bin` files in `dir`, sorted by name
pub fn bin_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Output path prefix for `input`: `output_dir/<file stem>`
pub fn output_base<P: AsRef<Path>>(output_dir: P, input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    output_dir.as_ref().join(stem)
}

/// Renders every vector field dump of `input_dir` into `output_dir`
///
/// Files are processed one at a time and the first failure aborts the run.
/// Returns the paths of the written images.
pub fn run<R: Renderer>(
    input_dir: &Path,
    output_dir: &Path,
    policy: ReshapePolicy,
    renderer: &R,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let files = bin_files(input_dir)?;
    log::info!("{} vector field(s) in {:?}", files.len(), input_dir);

    #[cfg(feature = "progress")]
    let mut progress = linya::Progress::new();
    #[cfg(feature = "progress")]
    let bar = progress.bar(files.len(), "Rendering");

    let mut written = Vec::with_capacity(2 * files.len());
    for file in &files {
        let grid = VectorGrid::from_bin(file, policy)?;
        if grid.side() < 2 {
            log::warn!("{:?}: {}x{} grid, nothing to plot", file, grid.side(), grid.side());
        } else {
            let field = FlowField::from_grid(&grid);
            written.extend(renderer.render(&field, &output_base(output_dir, file))?);
        }
        #[cfg(feature = "progress")]
        progress.inc_and_draw(&bar, 1);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_bin_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.bin", "a.bin", "notes.txt", "bin", "c.bin.bak"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("d.bin")).unwrap();
        let files = bin_files(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.bin"), dir.path().join("b.bin")]
        );
    }

    #[test]
    fn output_base_uses_stem() {
        let base = output_base("plots", Path::new("run/velocity.bin"));
        assert_eq!(base, Path::new("plots/velocity"));
    }
}
