use crate::error::{StageError, StageResult};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Files directly inside `dir` with the given extension, sorted by path.
/// A missing directory yields an empty list.
pub fn list_files(dir: &Path, ext: &str) -> StageResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    glob_sorted(dir, &format!("*.{ext}"))
}

/// Matches `pattern` below `dir`. The directory part is escaped, so only the
/// pattern itself is interpreted.
pub fn glob_sorted(dir: &Path, pattern: &str) -> StageResult<Vec<PathBuf>> {
    let full = format!(
        "{}/{pattern}",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let paths = glob::glob(&full).map_err(|source| StageError::Pattern {
        pattern: full.clone(),
        source,
    })?;
    let mut out = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            StageError::io(path, e.into())
        })?;
        if path.is_file() {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

pub fn require_dir(dir: &Path) -> StageResult<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(StageError::missing(dir))
    }
}

pub fn create_dir_all(dir: &Path) -> StageResult<()> {
    fs::create_dir_all(dir).map_err(|e| StageError::io(dir, e))
}

pub fn copy_file(src: &Path, dst: &Path) -> StageResult<()> {
    if let Some(parent) = dst.parent() {
        create_dir_all(parent)?;
    }
    fs::copy(src, dst).map_err(|e| StageError::io(src, e))?;
    Ok(())
}

pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> StageResult<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    fs::write(path, contents).map_err(|e| StageError::io(path, e))
}

pub fn read_to_string(path: &Path) -> StageResult<String> {
    fs::read_to_string(path).map_err(|e| StageError::io(path, e))
}

pub fn copy_dir_all(src: &Path, dst: &Path) -> StageResult<()> {
    create_dir_all(dst)?;
    for entry in fs::read_dir(src).map_err(|e| StageError::io(src, e))? {
        let entry = entry.map_err(|e| StageError::io(src, e))?;
        let path = entry.path();
        let target = dst.join(entry.file_name());
        if path.is_dir() {
            copy_dir_all(&path, &target)?;
        } else {
            fs::copy(&path, &target).map_err(|e| StageError::io(&path, e))?;
        }
    }
    Ok(())
}

/// Total byte size of every file below `dir`.
pub fn dir_size(dir: &Path) -> StageResult<u64> {
    let mut total = 0;
    for entry in fs::read_dir(dir).map_err(|e| StageError::io(dir, e))? {
        let entry = entry.map_err(|e| StageError::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            total += dir_size(&path)?;
        } else {
            total += entry.metadata().map_err(|e| StageError::io(&path, e))?.len();
        }
    }
    Ok(total)
}

pub fn absolute(path: &Path) -> StageResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| StageError::io(path, e))?;
    Ok(cwd.join(path))
}

/// A hidden sibling of a stage's output directory. The stage writes into it and
/// [`StagingDir::commit`] moves it onto the target in one rename; dropping it
/// uncommitted removes everything written so far.
#[derive(Debug)]
pub struct StagingDir {
    staging: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagingDir {
    pub fn new(target: &Path) -> StageResult<Self> {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stage".to_string());
        let parent = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        create_dir_all(parent)?;

        let staging = parent.join(format!(".{name}.partial"));
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| StageError::io(&staging, e))?;
        }
        create_dir_all(&staging)?;
        Ok(Self {
            staging,
            target: target.to_path_buf(),
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.staging
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Replaces the target directory with the staged contents.
    pub fn commit(mut self) -> StageResult<PathBuf> {
        if self.target.exists() {
            fs::remove_dir_all(&self.target).map_err(|e| StageError::io(&self.target, e))?;
        }
        fs::rename(&self.staging, &self.target).map_err(|e| StageError::io(&self.target, e))?;
        self.committed = true;
        debug!("committed {:?}", self.target);
        Ok(self.target.clone())
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if !self.committed && self.staging.exists() {
            debug!("discarding {:?}", self.staging);
            let _ = fs::remove_dir_all(&self.staging);
        }
    }
}
