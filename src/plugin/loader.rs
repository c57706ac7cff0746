//! Dynamic backend loading using libloading.

use super::descriptor::{BackendDescriptor, BackendInfo, CAPDISPATCH_ABI_VERSION, ENTRY_POINT_SYMBOL};
use crate::backend::Backend;
use crate::caps::ImplDescription;
use libloading::{Library, Symbol};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading backend libraries.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Failed to load the shared library.
    #[error("failed to load library: {0}")]
    LoadFailed(String),

    /// The library doesn't export the entry point.
    #[error("missing backend entry point: capdispatch_backend_descriptor")]
    MissingEntryPoint,

    /// The entry point returned a null descriptor.
    #[error("backend returned null descriptor")]
    NullDescriptor,

    /// ABI version mismatch.
    #[error("ABI version mismatch: expected {expected}, got {actual}")]
    AbiMismatch {
        /// Expected ABI version.
        expected: u32,
        /// Actual ABI version found.
        actual: u32,
    },

    /// Descriptor validation failed.
    #[error("invalid backend descriptor: {0}")]
    InvalidDescriptor(&'static str),

    /// The create function returned null.
    #[error("backend '{0}' failed to create its instance")]
    CreateFailed(String),
}

/// Type of the library entry point function.
type BackendEntryPoint = unsafe extern "C" fn() -> *const BackendDescriptor;

/// A backend loaded from a shared library.
///
/// Field order matters: the backend object is dropped before the library
/// that contains its code is unloaded.
pub struct LoadedBackend {
    backend: Box<dyn Backend>,
    info: BackendInfo,
    path: PathBuf,
    _library: Library,
}

impl LoadedBackend {
    /// Metadata copied from the descriptor.
    pub fn info(&self) -> &BackendInfo {
        &self.info
    }

    /// Path the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build the capability descriptor.
    pub fn describe(&self) -> ImplDescription {
        self.backend.describe()
    }
}

impl std::fmt::Debug for LoadedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedBackend")
            .field("name", &self.info.name)
            .field("version", &self.info.version)
            .field("path", &self.path)
            .finish()
    }
}

/// Loader for backend shared libraries.
#[derive(Debug, Clone, Default)]
pub struct BackendLoader {
    search_paths: Vec<PathBuf>,
}

impl BackendLoader {
    /// Create a loader with the given search paths.
    pub fn new(search_paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            search_paths: search_paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a search path.
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    /// Configured search paths, in scan order.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Load a backend from a specific path.
    ///
    /// # Safety
    ///
    /// Loading a library executes arbitrary code. The library must:
    /// - Export a valid `capdispatch_backend_descriptor` function
    /// - Return a static descriptor that outlives the library handle
    /// - Create its backend with [`crate::plugin::backend_to_raw`]
    pub unsafe fn load_from_path(&self, path: impl AsRef<Path>) -> Result<LoadedBackend, BackendError> {
        let path = path.as_ref();

        // SAFETY: Caller ensures the library is trusted.
        let library =
            unsafe { Library::new(path).map_err(|e| BackendError::LoadFailed(e.to_string()))? };

        // SAFETY: The library was just loaded successfully.
        let entry_point: Symbol<BackendEntryPoint> = unsafe {
            library
                .get(ENTRY_POINT_SYMBOL)
                .map_err(|_| BackendError::MissingEntryPoint)?
        };

        // SAFETY: Caller guarantees the entry point honours the ABI.
        let descriptor = unsafe { entry_point() };
        if descriptor.is_null() {
            return Err(BackendError::NullDescriptor);
        }

        // SAFETY: Entry point returned non-null pointer to static data.
        let desc = unsafe { &*descriptor };
        if desc.abi_version != CAPDISPATCH_ABI_VERSION {
            return Err(BackendError::AbiMismatch {
                expected: CAPDISPATCH_ABI_VERSION,
                actual: desc.abi_version,
            });
        }

        // SAFETY: Caller guarantees the descriptor is properly formed.
        unsafe {
            desc.validate().map_err(BackendError::InvalidDescriptor)?;
        }

        // SAFETY: Descriptor validated above.
        let info = unsafe { BackendInfo::from_descriptor(desc) };

        // SAFETY: Validated descriptor; create follows the raw box contract.
        let backend = unsafe { desc.create_backend() }
            .ok_or_else(|| BackendError::CreateFailed(info.name.clone()))?;

        drop(entry_point);
        Ok(LoadedBackend {
            backend,
            info,
            path: path.to_path_buf(),
            _library: library,
        })
    }

    /// Scan a directory and load every shared library in it.
    ///
    /// Entries are visited in file name order so discovery is reproducible.
    ///
    /// # Safety
    ///
    /// See [`Self::load_from_path`].
    pub unsafe fn load_all_from_dir(
        &self,
        dir: impl AsRef<Path>,
    ) -> Vec<(PathBuf, Result<LoadedBackend, BackendError>)> {
        let mut candidates: Vec<PathBuf> = match std::fs::read_dir(dir.as_ref()) {
            Ok(entries) => entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| is_shared_library(path))
                .collect(),
            Err(_) => Vec::new(),
        };
        candidates.sort();

        candidates
            .into_iter()
            .map(|path| {
                // SAFETY: Caller guarantees all libraries in the directory are trusted.
                let result = unsafe { self.load_from_path(&path) };
                (path, result)
            })
            .collect()
    }

    /// Load every library found in the search paths, in order.
    ///
    /// # Safety
    ///
    /// See [`Self::load_from_path`].
    pub unsafe fn load_all(&self) -> Vec<(PathBuf, Result<LoadedBackend, BackendError>)> {
        self.search_paths
            .iter()
            // SAFETY: Caller guarantees the search paths are trusted.
            .flat_map(|dir| unsafe { self.load_all_from_dir(dir) })
            .collect()
    }
}

/// Whether a path has the platform's shared library extension.
pub fn is_shared_library(path: &Path) -> bool {
    path.is_file() && path.extension() == Some(OsStr::new(std::env::consts::DLL_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_loader_creation() {
        let loader = BackendLoader::new(["/opt/backends"]);
        assert_eq!(loader.search_paths().len(), 1);
    }

    #[test]
    fn test_backend_loader_add_search_path() {
        let mut loader = BackendLoader::default();
        loader.add_search_path("/custom/path");
        assert_eq!(loader.search_paths(), &[PathBuf::from("/custom/path")]);
    }

    #[test]
    fn test_load_nonexistent_library() {
        let loader = BackendLoader::default();
        let result = unsafe { loader.load_from_path("/nonexistent/libnothing_xyz.so") };
        assert!(matches!(result, Err(BackendError::LoadFailed(_))));
    }

    #[test]
    fn test_scan_skips_non_libraries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.txt"), b"not a backend").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let loader = BackendLoader::new([dir.path()]);
        let loaded = unsafe { loader.load_all() };
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_scan_reports_broken_library() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir
            .path()
            .join(format!("libbroken.{}", std::env::consts::DLL_EXTENSION));
        std::fs::write(&fake, b"garbage").unwrap();

        let loader = BackendLoader::new([dir.path()]);
        let loaded = unsafe { loader.load_all() };
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, fake);
        assert!(matches!(loaded[0].1, Err(BackendError::LoadFailed(_))));
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let loader = BackendLoader::new(["/definitely/not/here"]);
        assert!(unsafe { loader.load_all() }.is_empty());
    }
}
