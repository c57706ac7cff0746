//! Registry of discoverable implementations.
//!
//! The registry is built once from a [`DispatcherConfig`] and never mutated
//! afterwards. Loaders and sessions share it through `Arc` and hold
//! descriptors by reference.

use crate::backend::{Backend, SoftwareBackend};
use crate::caps::{ApiVersion, ImplDescription, impl_type};
use crate::config::DispatcherConfig;
use crate::observability;
use crate::plugin::{BackendLoader, LoadedBackend};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// Where an implementation came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImplOrigin {
    /// Compiled into this crate.
    Builtin,
    /// Loaded from a backend library.
    Library(PathBuf),
    /// Supplied directly by the embedder.
    Injected,
}

impl ImplOrigin {
    /// Path reported for this origin by `ImplPath` enumeration.
    pub fn path(&self) -> PathBuf {
        match self {
            Self::Builtin => PathBuf::from("<builtin>"),
            Self::Library(path) => path.clone(),
            Self::Injected => PathBuf::from("<injected>"),
        }
    }
}

/// One registered implementation.
#[derive(Debug)]
pub struct RegistryEntry {
    description: Arc<ImplDescription>,
    origin: ImplOrigin,
    // Keeps the library mapped while its descriptor is in use.
    _library: Option<LoadedBackend>,
}

impl RegistryEntry {
    /// Shared descriptor.
    pub fn description(&self) -> &Arc<ImplDescription> {
        &self.description
    }

    /// Origin of the implementation.
    pub fn origin(&self) -> &ImplOrigin {
        &self.origin
    }
}

/// Legacy implementation selector used by [`ImplementationRegistry::select_legacy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyImpl {
    /// Prefer hardware, fall back to software.
    Auto,
    /// Software only.
    Software,
    /// Hardware only.
    Hardware,
}

/// Immutable set of discovered implementations.
#[derive(Debug, Default)]
pub struct ImplementationRegistry {
    entries: Vec<RegistryEntry>,
}

impl ImplementationRegistry {
    /// Discover implementations according to `config`.
    ///
    /// Libraries that fail to load are logged and skipped.
    pub fn discover(config: &DispatcherConfig) -> Self {
        let mut entries = Vec::new();

        if config.include_builtin {
            let backend = SoftwareBackend;
            tracing::debug!(backend = backend.name(), "registering built-in backend");
            entries.push(RegistryEntry {
                description: Arc::new(backend.describe()),
                origin: ImplOrigin::Builtin,
                _library: None,
            });
        }

        if config.load_libraries {
            let loader = BackendLoader::new(config.search_paths.iter().cloned());
            // SAFETY: Search paths are configured by the process owner and
            // trusted to contain conforming backend libraries.
            for (path, result) in unsafe { loader.load_all() } {
                match result {
                    Ok(loaded) => {
                        tracing::debug!(
                            backend = %loaded.info().name,
                            version = %loaded.info().version,
                            path = %path.display(),
                            "loaded backend library"
                        );
                        observability::record_backend_loaded(&loaded.info().name);
                        entries.push(RegistryEntry {
                            description: Arc::new(loaded.describe()),
                            origin: ImplOrigin::Library(path),
                            _library: Some(loaded),
                        });
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping backend library");
                        observability::record_backend_load_failure();
                    }
                }
            }
        }

        tracing::info!(implementations = entries.len(), "implementation discovery complete");
        observability::record_registry_size(entries.len());
        Self { entries }
    }

    /// Build a registry from explicit descriptors, in order.
    pub fn from_descriptions(descriptions: impl IntoIterator<Item = ImplDescription>) -> Self {
        let entries: Vec<RegistryEntry> = descriptions
            .into_iter()
            .map(|description| RegistryEntry {
                description: Arc::new(description),
                origin: ImplOrigin::Injected,
                _library: None,
            })
            .collect();
        observability::record_registry_size(entries.len());
        Self { entries }
    }

    /// Process-wide registry, built on first use from [`DispatcherConfig::from_env`].
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<ImplementationRegistry>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| {
                observability::init_metrics();
                Arc::new(Self::discover(&DispatcherConfig::from_env()))
            })
            .clone()
    }

    /// Registered entries in discovery order.
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Number of implementations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no implementation was discovered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`.
    pub fn get(&self, index: usize) -> Option<&RegistryEntry> {
        self.entries.get(index)
    }

    /// Pick an implementation the legacy way: by type and minimum version.
    ///
    /// Returns the registry index and descriptor of the first qualifying
    /// entry. An unspecified version accepts any implementation.
    pub fn select_legacy(
        &self,
        kind: LegacyImpl,
        version: ApiVersion,
    ) -> Option<(usize, &Arc<ImplDescription>)> {
        let wanted: &[u32] = match kind {
            LegacyImpl::Auto => &[impl_type::HARDWARE, impl_type::SOFTWARE],
            LegacyImpl::Software => &[impl_type::SOFTWARE],
            LegacyImpl::Hardware => &[impl_type::HARDWARE],
        };
        wanted.iter().find_map(|&ty| {
            self.entries.iter().enumerate().find_map(|(i, entry)| {
                let desc = &entry.description;
                let version_ok = version.is_unspecified() || desc.api_version >= version;
                (desc.impl_type == ty && version_ok).then_some((i, desc))
            })
        })
    }

    /// Origin path of the entry holding `desc`, if it is registered here.
    pub fn origin_of(&self, desc: &Arc<ImplDescription>) -> Option<&ImplOrigin> {
        self.entries
            .iter()
            .find(|e| Arc::ptr_eq(&e.description, desc))
            .map(|e| &e.origin)
    }
}
