// src/engine/io.rs
//
// Image byte sources: in-memory buffers, memory-mapped files, lazy paths.

use crate::error::ImgBatchError;
use memmap2::Mmap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Image source - in-memory data, a memory-mapped file, or a path for lazy loading.
#[derive(Clone, Debug)]
pub enum Source {
    /// In-memory image data
    Memory(Arc<Vec<u8>>),
    /// Memory-mapped file (zero-copy access)
    Mapped(Arc<Mmap>),
    /// File path, read only when needed
    Path(PathBuf),
}

impl Source {
    /// Open a file and memory-map it for zero-copy access.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ImgBatchError> {
        let path = path.as_ref();
        let display = path.to_string_lossy().to_string();
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ImgBatchError::file_not_found(display));
            }
            Err(e) => return Err(ImgBatchError::file_read_failed(display, e)),
        };

        // Safety: we assume the file is not modified externally while mapped.
        // If it is, decoding may fail or the OS may raise SIGBUS.
        let mmap =
            unsafe { Mmap::map(&file).map_err(|e| ImgBatchError::mmap_failed(display, e))? };
        Ok(Self::Mapped(Arc::new(mmap)))
    }

    /// Load the full bytes from the source.
    /// For Mapped sources this copies into a Vec; prefer as_bytes() when possible.
    pub fn load(&self) -> Result<Arc<Vec<u8>>, ImgBatchError> {
        match self {
            Source::Memory(data) => Ok(data.clone()),
            Source::Mapped(mmap) => Ok(Arc::new(mmap.as_ref().to_vec())),
            Source::Path(path) => {
                let data = std::fs::read(path).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        ImgBatchError::file_not_found(path.to_string_lossy().to_string())
                    } else {
                        ImgBatchError::file_read_failed(path.to_string_lossy().to_string(), e)
                    }
                })?;
                Ok(Arc::new(data))
            }
        }
    }

    /// Borrow the bytes directly. None for Path sources, which must be loaded first.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Source::Memory(data) => Some(data.as_slice()),
            Source::Mapped(mmap) => Some(mmap.as_ref()),
            Source::Path(_) => None,
        }
    }

    /// Byte length of the source. Zero for Path sources until loaded.
    pub fn len(&self) -> usize {
        match self {
            Source::Memory(data) => data.len(),
            Source::Mapped(mmap) => mmap.len(),
            Source::Path(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
