use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Read access to the folder that holds the post files.
pub trait FileSystem {
    type Error: std::error::Error;

    /// Whether `file_name` exists as a file inside `folder`.
    fn file_exists(&self, folder: &Path, file_name: &str) -> bool;

    /// Reads `file_name` from `folder` as UTF-8. Fails if the file is absent.
    fn read_file(&self, folder: &Path, file_name: &str) -> Result<String, Self::Error>;

    /// Lists the names of the files directly inside `folder` that have the
    /// given extension. The order is whatever the underlying storage yields.
    fn list_files(&self, folder: &Path, extension: &str) -> Result<Vec<String>, Self::Error>;
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == extension)
}

/// A [`FileSystem`] backed by the local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskFileSystem;

#[derive(Error, Debug)]
pub enum DiskFileSystemError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to list {}: {source}", .folder.display())]
    List {
        folder: PathBuf,
        source: walkdir::Error,
    },
}

impl FileSystem for DiskFileSystem {
    type Error = DiskFileSystemError;

    fn file_exists(&self, folder: &Path, file_name: &str) -> bool {
        folder.join(file_name).is_file()
    }

    fn read_file(&self, folder: &Path, file_name: &str) -> Result<String, Self::Error> {
        let path = folder.join(file_name);
        debug!(path = %path.display(), "reading post file");

        fs::read_to_string(&path).map_err(|source| DiskFileSystemError::Read { path, source })
    }

    fn list_files(&self, folder: &Path, extension: &str) -> Result<Vec<String>, Self::Error> {
        let walker = WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter();

        let mut files = Vec::new();

        for entry in walker {
            let entry = entry.map_err(|source| DiskFileSystemError::List {
                folder: folder.to_owned(),
                source,
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(filename) = entry.file_name().to_str() else {
                continue;
            };

            if filename.starts_with('.') || !has_extension(entry.path(), extension) {
                continue;
            }

            files.push(filename.to_string());
        }

        Ok(files)
    }
}

/// A [`FileSystem`] held entirely in memory, keyed by full file path.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFileSystem {
    files: Arc<RwLock<HashMap<PathBuf, String>>>,
}

#[derive(Error, Debug)]
pub enum InMemoryFileSystemError {
    #[error("poisoned")]
    Poisoned,

    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },
}

impl InMemoryFileSystem {
    pub fn new(files: Arc<RwLock<HashMap<PathBuf, String>>>) -> Self {
        Self { files }
    }

    /// Adds or replaces the file at `path`.
    pub fn insert(
        &self,
        path: impl Into<PathBuf>,
        contents: impl Into<String>,
    ) -> Result<(), InMemoryFileSystemError> {
        self.files
            .write()
            .map_err(|_| InMemoryFileSystemError::Poisoned)?
            .insert(path.into(), contents.into());

        Ok(())
    }
}

impl FileSystem for InMemoryFileSystem {
    type Error = InMemoryFileSystemError;

    fn file_exists(&self, folder: &Path, file_name: &str) -> bool {
        self.files
            .read()
            .map(|files| files.contains_key(&folder.join(file_name)))
            .unwrap_or(false)
    }

    fn read_file(&self, folder: &Path, file_name: &str) -> Result<String, Self::Error> {
        let path = folder.join(file_name);

        self.files
            .read()
            .map_err(|_| InMemoryFileSystemError::Poisoned)?
            .get(&path)
            .cloned()
            .ok_or(InMemoryFileSystemError::NotFound { path })
    }

    fn list_files(&self, folder: &Path, extension: &str) -> Result<Vec<String>, Self::Error> {
        let files = self
            .files
            .read()
            .map_err(|_| InMemoryFileSystemError::Poisoned)?;

        Ok(files
            .keys()
            .filter(|path| path.parent() == Some(folder) && has_extension(path, extension))
            .filter_map(|path| path.file_name()?.to_str().map(ToString::to_string))
            .filter(|filename| !filename.starts_with('.'))
            .collect())
    }
}
