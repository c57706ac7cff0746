//! Discovery configuration.

use std::path::PathBuf;

/// Environment variable with extra backend search paths (platform path list).
pub const BACKEND_PATH_ENV: &str = "CAPDISPATCH_BACKEND_PATH";

/// Environment variable disabling library scanning when set to `1`.
pub const DISABLE_LIBRARIES_ENV: &str = "CAPDISPATCH_DISABLE_LIBRARIES";

/// Configuration used to build an [`crate::registry::ImplementationRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Directories scanned for backend libraries, in order.
    pub search_paths: Vec<PathBuf>,
    /// Whether the built-in software backend is registered.
    pub include_builtin: bool,
    /// Whether backend libraries are loaded at all.
    pub load_libraries: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![
                PathBuf::from("/usr/lib/capdispatch/backends"),
                PathBuf::from("/usr/local/lib/capdispatch/backends"),
            ],
            include_builtin: true,
            load_libraries: true,
        }
    }
}

impl DispatcherConfig {
    /// Configuration with only the built-in backend.
    pub fn builtin_only() -> Self {
        Self::default().without_libraries()
    }

    /// Default configuration adjusted by the process environment.
    ///
    /// Paths from [`BACKEND_PATH_ENV`] are scanned before the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(paths) = std::env::var_os(BACKEND_PATH_ENV) {
            let mut extra: Vec<PathBuf> = std::env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            extra.append(&mut config.search_paths);
            config.search_paths = extra;
        }
        if std::env::var(DISABLE_LIBRARIES_ENV).is_ok_and(|v| v == "1") {
            config.load_libraries = false;
        }
        config
    }

    /// Append a search path.
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Do not register the built-in software backend.
    pub fn without_builtin(mut self) -> Self {
        self.include_builtin = false;
        self
    }

    /// Do not scan for backend libraries.
    pub fn without_libraries(mut self) -> Self {
        self.load_libraries = false;
        self
    }
}
