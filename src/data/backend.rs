//! Storage backends for product trees.
//!
//! A backend turns a path into a [`DataNode`] tree and back. Sessions never
//! touch files directly, so the same session logic runs against HDF5 files
//! on disk or against trees held in memory.

use super::{DataNode, DataReader, DataWriter};
use crate::config::CompressionConfig;
use crate::error::{OdimError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// How a product is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Reads only; every mutation is refused.
    ReadOnly,
    /// Reads and writes an existing product.
    ReadWrite,
}

impl AccessMode {
    /// Whether mutations are allowed.
    pub fn is_writable(self) -> bool {
        self == Self::ReadWrite
    }
}

/// Hierarchical attributed store.
pub trait StoreBackend {
    /// Load the full tree stored at `path`.
    ///
    /// `ReadWrite` must fail if the product cannot later be written.
    fn load(&self, path: &Path, mode: AccessMode) -> Result<DataNode>;

    /// Replace whatever is stored at `path` with `root`.
    fn save(&self, path: &Path, root: &DataNode, compression: &CompressionConfig) -> Result<()>;

    /// Copy the stored product at `source` to `target` unchanged.
    fn copy(&self, source: &Path, target: &Path) -> Result<()>;
}

/// HDF5 files on the local filesystem.
///
/// Products are read through netCDF-4 and written back as plain HDF5, so a
/// rewritten file holds only the groups, fields and attributes of the tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hdf5Backend;

impl StoreBackend for Hdf5Backend {
    fn load(&self, path: &Path, mode: AccessMode) -> Result<DataNode> {
        if let Err(source) = std::fs::metadata(path) {
            return Err(OdimError::file_open(path, source));
        }

        match mode {
            AccessMode::ReadOnly => {
                let file = netcdf::open(path)?;
                DataReader::read_tree(&file)
            },
            AccessMode::ReadWrite => {
                let file = netcdf::append(path)?;
                DataReader::read_tree(&file)
            },
        }
    }

    fn save(&self, path: &Path, root: &DataNode, compression: &CompressionConfig) -> Result<()> {
        // Write next to the target, then swap it in.
        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        if let Err(err) = DataWriter::write_tree(&tmp_path, root, compression) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(err);
        }
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    fn copy(&self, source: &Path, target: &Path) -> Result<()> {
        std::fs::copy(source, target).map_err(|e| OdimError::file_open(source, e))?;
        Ok(())
    }
}

/// Products held in memory, shared between clones.
///
/// Useful for synthetic products and for tests; paths are plain keys.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    files: Arc<Mutex<HashMap<PathBuf, DataNode>>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `root` under `path`, replacing any previous product.
    pub fn insert(&self, path: impl Into<PathBuf>, root: DataNode) {
        self.files().insert(path.into(), root);
    }

    /// Snapshot of the product stored under `path`.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<DataNode> {
        self.files().get(path.as_ref()).cloned()
    }

    fn files(&self) -> MutexGuard<'_, HashMap<PathBuf, DataNode>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn not_found(path: &Path) -> OdimError {
        OdimError::file_open(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such product in memory"),
        )
    }
}

impl StoreBackend for MemoryBackend {
    fn load(&self, path: &Path, _mode: AccessMode) -> Result<DataNode> {
        self.get(path).ok_or_else(|| Self::not_found(path))
    }

    fn save(&self, path: &Path, root: &DataNode, _compression: &CompressionConfig) -> Result<()> {
        self.insert(path, root.clone());
        Ok(())
    }

    fn copy(&self, source: &Path, target: &Path) -> Result<()> {
        let root = self.get(source).ok_or_else(|| Self::not_found(source))?;
        self.insert(target, root);
        Ok(())
    }
}
