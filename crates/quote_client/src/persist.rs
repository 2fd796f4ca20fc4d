use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use quote_logging::quote_debug;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Creates `dir` if needed and probes that a file can be created in it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let unusable = |err: io::Error| PersistError::OutputDir(format!("{}: {err}", dir.display()));
    match fs::metadata(dir) {
        Ok(meta) if !meta.is_dir() => {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )))
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(unusable)?;
        }
        Err(err) => return Err(unusable(err)),
    }
    tempfile::tempfile_in(dir).map(drop).map_err(unusable)
}

/// Stores exported PDFs and CSVs under their download names.
///
/// Every write lands in a sibling temp file and is renamed over the target, so an
/// interrupted export never leaves a truncated artifact behind.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        Self::write_to(&self.dir.join(filename), content)
    }

    /// Writes to an explicit path, creating its parent directory.
    pub fn write_to(path: &Path, content: &[u8]) -> Result<PathBuf, PersistError> {
        if path.file_name().is_none() {
            return Err(PersistError::OutputDir(format!(
                "{} has no file name",
                path.display()
            )));
        }
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        ensure_output_dir(dir)?;

        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(content)?;
        staged.as_file().sync_all()?;
        staged.persist(path).map_err(|err| PersistError::Io(err.error))?;

        quote_debug!("Stored {} bytes at {}", content.len(), path.display());
        Ok(path.to_path_buf())
    }
}
