use flate2::write::GzEncoder;
use flate2::Compression;
use pillprep_corpus::{StageError, StageResult};
use std::fs::{self, File};
use std::path::Path;

/// Writes `dir` as a gzip-compressed tarball whose entries live under
/// `root_name/`. The archive appears at `archive` only once complete.
pub fn create_tar_gz(dir: &Path, root_name: &str, archive: &Path) -> StageResult<()> {
    let partial = archive.with_extension("partial");
    let written = write_tar_gz(dir, root_name, &partial);
    if let Err(err) = written {
        let _ = fs::remove_file(&partial);
        return Err(err);
    }
    fs::rename(&partial, archive).map_err(|e| {
        let _ = fs::remove_file(&partial);
        StageError::io(archive, e)
    })
}

fn write_tar_gz(dir: &Path, root_name: &str, path: &Path) -> StageResult<()> {
    let file = File::create(path).map_err(|e| StageError::io(path, e))?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    builder
        .append_dir_all(root_name, dir)
        .map_err(|e| StageError::io(dir, e))?;
    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .map_err(|e| StageError::io(path, e))?;
    Ok(())
}

/// Entry paths of a `.tar.gz`, in archive order.
pub fn list_tar_gz(archive: &Path) -> StageResult<Vec<String>> {
    let file = File::open(archive).map_err(|e| StageError::io(archive, e))?;
    let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(file));
    let mut names = Vec::new();
    for entry in tar.entries().map_err(|e| StageError::io(archive, e))? {
        let entry = entry.map_err(|e| StageError::io(archive, e))?;
        let path = entry.path().map_err(|e| StageError::io(archive, e))?;
        names.push(path.to_string_lossy().into_owned());
    }
    Ok(names)
}
