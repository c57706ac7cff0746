//! Loaders: filter, enumerate and bind.

use super::config::{Config, ConfigId};
use crate::caps::ImplDescription;
use crate::error::{Error, Result, Status};
use crate::observability;
use crate::registry::{ImplementationRegistry, RegistryEntry};
use crate::session::Session;
use crate::variant::Variant;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LOADER_ID: AtomicU64 = AtomicU64::new(1);

/// What an enumeration request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImplCapsFormat {
    /// The capability descriptor.
    ImplDescStructure,
    /// The list of implemented functions. Not offered.
    ImplementedFunctions,
    /// Where the implementation was loaded from.
    ImplPath,
    /// Any other request kind.
    Other(u32),
}

impl ImplCapsFormat {
    /// Map a numeric request kind.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::ImplDescStructure,
            2 => Self::ImplementedFunctions,
            3 => Self::ImplPath,
            other => Self::Other(other),
        }
    }
}

/// Content vended by an enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum ImplCaps {
    /// Shared capability descriptor.
    Description(Arc<ImplDescription>),
    /// Origin path of the implementation.
    Path(PathBuf),
}

/// An enumeration result that must be released through its loader.
#[derive(Debug, Clone)]
pub struct VendedCaps {
    loader: u64,
    serial: u64,
    caps: ImplCaps,
}

impl VendedCaps {
    /// Id of the loader that vended this result.
    pub fn loader_id(&self) -> u64 {
        self.loader
    }

    /// Vended content.
    pub fn caps(&self) -> &ImplCaps {
        &self.caps
    }

    /// Descriptor, for `ImplDescStructure` requests.
    pub fn description(&self) -> Option<&Arc<ImplDescription>> {
        match &self.caps {
            ImplCaps::Description(desc) => Some(desc),
            ImplCaps::Path(_) => None,
        }
    }

    /// Path, for `ImplPath` requests.
    pub fn path(&self) -> Option<&Path> {
        match &self.caps {
            ImplCaps::Path(path) => Some(path),
            ImplCaps::Description(_) => None,
        }
    }
}

/// Entry point of the dispatcher.
///
/// A loader holds its own configs and sees the registry through a shared
/// reference. Loaders never observe each other's filters.
pub struct Loader {
    id: u64,
    registry: Arc<ImplementationRegistry>,
    configs: Vec<Config>,
    vended: HashSet<u64>,
    next_serial: u64,
}

impl Loader {
    /// Create a loader over the process-wide registry.
    pub fn new() -> Self {
        Self::with_registry(ImplementationRegistry::global())
    }

    /// Create a loader over an explicit registry.
    pub fn with_registry(registry: Arc<ImplementationRegistry>) -> Self {
        let id = NEXT_LOADER_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(loader = id, implementations = registry.len(), "loader created");
        observability::record_loader_created();
        Self {
            id,
            registry,
            configs: Vec::new(),
            vended: HashSet::new(),
            next_serial: 1,
        }
    }

    /// Process-unique loader id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Registry this loader dispatches over.
    pub fn registry(&self) -> &Arc<ImplementationRegistry> {
        &self.registry
    }

    /// Add an empty config.
    pub fn create_config(&mut self) -> ConfigId {
        self.configs.push(Config::new());
        let id = ConfigId {
            loader: self.id,
            index: self.configs.len() - 1,
        };
        tracing::debug!(loader = self.id, config = id.index, "config created");
        id
    }

    /// Config by id.
    pub fn config(&self, id: ConfigId) -> Result<&Config> {
        if id.loader != self.id {
            return Err(Error::InvalidHandle("config belongs to another loader"));
        }
        self.configs
            .get(id.index)
            .ok_or(Error::InvalidHandle("unknown config"))
    }

    /// Mutable config by id.
    pub fn config_mut(&mut self, id: ConfigId) -> Result<&mut Config> {
        if id.loader != self.id {
            return Err(Error::InvalidHandle("config belongs to another loader"));
        }
        self.configs
            .get_mut(id.index)
            .ok_or(Error::InvalidHandle("unknown config"))
    }

    /// Add a filter property to one of this loader's configs.
    pub fn set_filter_property(
        &mut self,
        id: ConfigId,
        path: &str,
        value: impl Into<Variant>,
    ) -> Result<()> {
        self.config_mut(id)?.set_filter_property(path, value)
    }

    /// Configs in creation order.
    pub fn configs(&self) -> &[Config] {
        &self.configs
    }

    /// Registry entries satisfying every config, with their registry index.
    pub fn matching(&self) -> impl Iterator<Item = (usize, &RegistryEntry)> {
        self.registry
            .entries()
            .iter()
            .enumerate()
            .filter(|(_, entry)| self.configs.iter().all(|c| c.matches(entry.description())))
    }

    fn nth_match(&self, index: u32) -> Result<(usize, &RegistryEntry)> {
        self.matching()
            .nth(index as usize)
            .ok_or(Error::NoMatch { index })
    }

    /// Return the `index`-th matching implementation in the requested form.
    ///
    /// The result stays registered with this loader until it is released.
    pub fn enum_implementations(&mut self, index: u32, format: ImplCapsFormat) -> Result<VendedCaps> {
        let span = observability::span_loader(self.id, "enum_implementations");
        let _guard = span.enter();

        let result = self.enumerate(index, format);
        observability::record_enumeration(Status::from_result(&result));
        result
    }

    fn enumerate(&mut self, index: u32, format: ImplCapsFormat) -> Result<VendedCaps> {
        let caps = {
            let (_, entry) = self.nth_match(index)?;
            match format {
                ImplCapsFormat::ImplDescStructure => {
                    ImplCaps::Description(entry.description().clone())
                }
                ImplCapsFormat::ImplPath => ImplCaps::Path(entry.origin().path()),
                other => {
                    return Err(Error::Unsupported(format!("capability format {other:?}")));
                }
            }
        };
        let serial = self.next_serial;
        self.next_serial += 1;
        self.vended.insert(serial);
        tracing::debug!(loader = self.id, index, serial, "implementation vended");
        Ok(VendedCaps {
            loader: self.id,
            serial,
            caps,
        })
    }

    /// Release a result vended by [`Loader::enum_implementations`].
    ///
    /// Fails with [`Error::InvalidHandle`] if another loader vended it or it
    /// was already released.
    pub fn release_impl_description(&mut self, caps: &VendedCaps) -> Result<()> {
        if caps.loader != self.id || !self.vended.remove(&caps.serial) {
            return Err(Error::InvalidHandle("description was not vended by this loader"));
        }
        Ok(())
    }

    /// Number of vended results not yet released.
    pub fn outstanding(&self) -> usize {
        self.vended.len()
    }

    /// Bind a session to the `index`-th matching implementation.
    pub fn create_session(&self, index: u32) -> Result<Session> {
        let span = observability::span_loader(self.id, "create_session");
        let _guard = span.enter();

        let (registry_index, entry) = self.nth_match(index).inspect_err(|e| {
            tracing::debug!(loader = self.id, index, error = %e, "no implementation to bind");
        })?;
        observability::record_session_created("dispatch");
        Ok(Session::bind(entry.description().clone(), registry_index))
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        tracing::debug!(
            loader = self.id,
            configs = self.configs.len(),
            outstanding = self.vended.len(),
            "loader unloaded"
        );
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("id", &self.id)
            .field("configs", &self.configs.len())
            .field("outstanding", &self.vended.len())
            .finish()
    }
}
