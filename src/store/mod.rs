//! Buffer store: whole-file text load/save for the input region.

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use log::{debug, info};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no file name given")]
    EmptyPath,

    #[error("'{0}' is not a file")]
    NotAFile(PathBuf),

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct BufferStore {
    default_extension: String,
}

impl Default for BufferStore {
    fn default() -> Self {
        Self::new("txt")
    }
}

impl BufferStore {
    pub fn new(default_extension: impl Into<String>) -> Self {
        Self {
            default_extension: default_extension.into(),
        }
    }

    pub fn default_extension(&self) -> &str {
        &self.default_extension
    }

    /// Read the whole file as text.
    pub fn open(&self, path: &Path) -> Result<String, StoreError> {
        if path.as_os_str().is_empty() {
            return Err(StoreError::EmptyPath);
        }
        if path.is_dir() {
            return Err(StoreError::NotAFile(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        info!("opened {} ({} bytes)", path.display(), text.len());
        Ok(text)
    }

    /// Overwrite the target wholesale. Not atomic.
    pub fn save(&self, path: &Path, text: &str) -> Result<PathBuf, StoreError> {
        let target = self.resolve_save_path(path)?;
        if target.is_dir() {
            return Err(StoreError::NotAFile(target));
        }
        fs::write(&target, text).map_err(|source| StoreError::Write {
            path: target.clone(),
            source,
        })?;
        info!("saved {} ({} bytes)", target.display(), text.len());
        Ok(target)
    }

    /// Appends the default extension when the chosen name has none.
    pub fn resolve_save_path(&self, path: &Path) -> Result<PathBuf, StoreError> {
        if path.as_os_str().is_empty() {
            return Err(StoreError::EmptyPath);
        }
        if path.extension().is_some() || self.default_extension.is_empty() {
            return Ok(path.to_path_buf());
        }
        let resolved = path.with_extension(&self.default_extension);
        debug!("save path {} -> {}", path.display(), resolved.display());
        Ok(resolved)
    }
}
