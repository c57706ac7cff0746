//! Stable call surface over opaque handles.
//!
//! Every call returns a [`Status`] and never panics. Objects live in
//! process-wide handle tables guarded by mutexes, each locked only for the
//! duration of one call. Absent handles and output slots are modelled with
//! `Option`.
//!
//! ```rust,ignore
//! use capdispatch::api;
//!
//! let loader = api::load();
//! let config = api::create_config(loader);
//! api::set_config_filter_property(config, Some("ImplDescription.Impl"), 1u32.into());
//! let mut session = None;
//! assert_eq!(api::create_session(loader, 0, Some(&mut session)), Status::None);
//! api::close(session);
//! api::unload(loader);
//! ```

use crate::caps::{ApiVersion, ImplDescription};
use crate::dispatcher::{ConfigId, ImplCapsFormat, Loader, VendedCaps};
use crate::error::{Result, Status};
use crate::handle::{Arena, ConfigHandle, ImplDescriptionHandle, LoaderHandle, SessionHandle};
use crate::registry::{ImplementationRegistry, LegacyImpl};
use crate::session::{Domain, Session, VideoParam};
use crate::variant::Variant;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct ConfigEntry {
    loader: LoaderHandle,
    id: ConfigId,
}

struct VendedEntry {
    loader: LoaderHandle,
    caps: VendedCaps,
}

// Lock order when more than one table is held: LOADERS, CONFIGS, DESCRIPTIONS.
static LOADERS: Mutex<Arena<LoaderHandle, Loader>> = Mutex::new(Arena::new());
static CONFIGS: Mutex<Arena<ConfigHandle, ConfigEntry>> = Mutex::new(Arena::new());
static DESCRIPTIONS: Mutex<Arena<ImplDescriptionHandle, VendedEntry>> = Mutex::new(Arena::new());
static SESSIONS: Mutex<Arena<SessionHandle, Session>> = Mutex::new(Arena::new());

fn lock<T>(table: &Mutex<T>) -> MutexGuard<'_, T> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

fn status_of(result: Result<Status>) -> Status {
    match result {
        Ok(status) => status,
        Err(e) => e.status(),
    }
}

fn unit_status(result: Result<()>) -> Status {
    status_of(result.map(|()| Status::None))
}

// ============================================================================
// Loader and config
// ============================================================================

/// Create a loader over the process-wide registry.
///
/// Returns `None` only when the loader table is exhausted.
pub fn load() -> Option<LoaderHandle> {
    let loader = Loader::new();
    lock(&LOADERS).insert(loader)
}

/// Create a loader over an explicit registry.
pub fn load_with_registry(registry: Arc<ImplementationRegistry>) -> Option<LoaderHandle> {
    let loader = Loader::with_registry(registry);
    lock(&LOADERS).insert(loader)
}

/// Destroy a loader with its configs and outstanding descriptor handles.
///
/// Sessions created through the loader stay open.
pub fn unload(loader: Option<LoaderHandle>) -> Status {
    let Some(handle) = loader else {
        return Status::InvalidHandle;
    };
    let mut loaders = lock(&LOADERS);
    let Some(removed) = loaders.remove(handle) else {
        return Status::InvalidHandle;
    };
    lock(&CONFIGS).retain(|entry| entry.loader != handle);
    lock(&DESCRIPTIONS).retain(|entry| entry.loader != handle);
    drop(loaders);
    drop(removed);
    Status::None
}

/// Add a config to a loader. Returns `None` for a null or stale loader.
pub fn create_config(loader: Option<LoaderHandle>) -> Option<ConfigHandle> {
    let handle = loader?;
    let mut loaders = lock(&LOADERS);
    let id = loaders.get_mut(handle)?.create_config();
    lock(&CONFIGS).insert(ConfigEntry { loader: handle, id })
}

/// Add a filter property to a config.
pub fn set_config_filter_property(
    config: Option<ConfigHandle>,
    name: Option<&str>,
    value: Variant,
) -> Status {
    let (Some(config), Some(name)) = (config, name) else {
        return Status::NullPtr;
    };
    let mut loaders = lock(&LOADERS);
    let Some((loader, id)) = lock(&CONFIGS).get(config).map(|e| (e.loader, e.id)) else {
        return Status::InvalidHandle;
    };
    let Some(loader) = loaders.get_mut(loader) else {
        return Status::InvalidHandle;
    };
    unit_status(loader.set_filter_property(id, name, value))
}

// ============================================================================
// Enumeration
// ============================================================================

/// Enumerate the `index`-th matching implementation.
pub fn enum_implementations(
    loader: Option<LoaderHandle>,
    index: u32,
    format: ImplCapsFormat,
    out: Option<&mut Option<ImplDescriptionHandle>>,
) -> Status {
    let (Some(handle), Some(out)) = (loader, out) else {
        return Status::NullPtr;
    };
    let mut loaders = lock(&LOADERS);
    let Some(loader) = loaders.get_mut(handle) else {
        return Status::InvalidHandle;
    };
    let caps = match loader.enum_implementations(index, format) {
        Ok(caps) => caps,
        Err(e) => return e.status(),
    };
    match lock(&DESCRIPTIONS).insert(VendedEntry {
        loader: handle,
        caps: caps.clone(),
    }) {
        Some(vended) => {
            *out = Some(vended);
            Status::None
        }
        None => {
            // Table full: hand the serial back so the loader stays consistent.
            let _ = loader.release_impl_description(&caps);
            Status::Unsupported
        }
    }
}

/// Descriptor behind a handle vended for `ImplDescStructure`.
pub fn query_impl_description(handle: ImplDescriptionHandle) -> Option<Arc<ImplDescription>> {
    lock(&DESCRIPTIONS)
        .get(handle)
        .and_then(|entry| entry.caps.description().cloned())
}

/// Path behind a handle vended for `ImplPath`.
pub fn query_impl_path(handle: ImplDescriptionHandle) -> Option<PathBuf> {
    lock(&DESCRIPTIONS)
        .get(handle)
        .and_then(|entry| entry.caps.path().map(|p| p.to_path_buf()))
}

/// Release an enumeration result through the loader that vended it.
pub fn disp_release_impl_description(
    loader: Option<LoaderHandle>,
    handle: Option<ImplDescriptionHandle>,
) -> Status {
    let (Some(loader), Some(handle)) = (loader, handle) else {
        return Status::NullPtr;
    };
    let mut loaders = lock(&LOADERS);
    let Some(loader) = loaders.get_mut(loader) else {
        return Status::InvalidHandle;
    };
    let mut descriptions = lock(&DESCRIPTIONS);
    let Some(entry) = descriptions.get(handle) else {
        return Status::InvalidHandle;
    };
    if let Err(e) = loader.release_impl_description(&entry.caps) {
        return e.status();
    }
    descriptions.remove(handle);
    Status::None
}

// ============================================================================
// Sessions
// ============================================================================

fn register_session(session: Session, out: &mut Option<SessionHandle>) -> Status {
    match lock(&SESSIONS).insert(session) {
        Some(handle) => {
            *out = Some(handle);
            Status::None
        }
        None => Status::Unsupported,
    }
}

/// Bind a session to the `index`-th matching implementation.
pub fn create_session(
    loader: Option<LoaderHandle>,
    index: u32,
    out: Option<&mut Option<SessionHandle>>,
) -> Status {
    let (Some(handle), Some(out)) = (loader, out) else {
        return Status::NullPtr;
    };
    let session = {
        let loaders = lock(&LOADERS);
        let Some(loader) = loaders.get(handle) else {
            return Status::InvalidHandle;
        };
        match loader.create_session(index) {
            Ok(session) => session,
            Err(e) => return e.status(),
        }
    };
    register_session(session, out)
}

/// Open a session by implementation type, without a loader.
pub fn init(kind: LegacyImpl, version: ApiVersion, out: Option<&mut Option<SessionHandle>>) -> Status {
    let Some(out) = out else {
        return Status::NullPtr;
    };
    let registry = ImplementationRegistry::global();
    match Session::open_legacy(&registry, kind, version) {
        Ok(session) => register_session(session, out),
        Err(e) => e.status(),
    }
}

/// Close every initialized domain and destroy the session.
pub fn close(session: Option<SessionHandle>) -> Status {
    let Some(handle) = session else {
        return Status::InvalidHandle;
    };
    // Remove under the lock, tear down outside it.
    let removed = lock(&SESSIONS).remove(handle);
    match removed {
        Some(session) => {
            session.close();
            Status::None
        }
        None => Status::InvalidHandle,
    }
}

/// Descriptor a session is bound to.
pub fn session_impl_description(session: Option<SessionHandle>) -> Option<Arc<ImplDescription>> {
    lock(&SESSIONS)
        .get(session?)
        .map(|s| s.description().clone())
}

// ============================================================================
// Domain lifecycle
// ============================================================================

fn with_session(session: Option<SessionHandle>, f: impl FnOnce(&mut Session) -> Status) -> Status {
    let Some(handle) = session else {
        return Status::InvalidHandle;
    };
    let mut sessions = lock(&SESSIONS);
    match sessions.get_mut(handle) {
        Some(session) => f(session),
        None => Status::InvalidHandle,
    }
}

fn domain_init(domain: Domain, session: Option<SessionHandle>, par: Option<&VideoParam>) -> Status {
    with_session(session, |s| match par {
        Some(par) => status_of(s.init(domain, par)),
        None => Status::NullPtr,
    })
}

fn domain_reset(domain: Domain, session: Option<SessionHandle>, par: Option<&VideoParam>) -> Status {
    with_session(session, |s| match par {
        Some(par) => status_of(s.reset(domain, par)),
        None => Status::NullPtr,
    })
}

fn domain_close(domain: Domain, session: Option<SessionHandle>) -> Status {
    with_session(session, |s| unit_status(s.close_domain(domain)))
}

fn domain_get_video_param(
    domain: Domain,
    session: Option<SessionHandle>,
    out: Option<&mut VideoParam>,
) -> Status {
    with_session(session, |s| {
        let Some(out) = out else {
            return Status::NullPtr;
        };
        match s.video_param(domain) {
            Ok(params) => {
                *out = *params;
                Status::None
            }
            Err(e) => e.status(),
        }
    })
}

macro_rules! domain_calls {
    ($domain:expr, $init:ident, $reset:ident, $close:ident, $get:ident, $label:literal) => {
        #[doc = concat!("Initialize ", $label, ".")]
        pub fn $init(session: Option<SessionHandle>, par: Option<&VideoParam>) -> Status {
            domain_init($domain, session, par)
        }

        #[doc = concat!("Reset an initialized ", $label, " with new parameters.")]
        pub fn $reset(session: Option<SessionHandle>, par: Option<&VideoParam>) -> Status {
            domain_reset($domain, session, par)
        }

        #[doc = concat!("Close ", $label, ".")]
        pub fn $close(session: Option<SessionHandle>) -> Status {
            domain_close($domain, session)
        }

        #[doc = concat!("Copy the effective ", $label, " parameters into `out`.")]
        pub fn $get(session: Option<SessionHandle>, out: Option<&mut VideoParam>) -> Status {
            domain_get_video_param($domain, session, out)
        }
    };
}

domain_calls!(
    Domain::Encode,
    encode_init,
    encode_reset,
    encode_close,
    encode_get_video_param,
    "encode"
);
domain_calls!(
    Domain::Decode,
    decode_init,
    decode_reset,
    decode_close,
    decode_get_video_param,
    "decode"
);
domain_calls!(
    Domain::Vpp,
    vpp_init,
    vpp_reset,
    vpp_close,
    vpp_get_video_param,
    "vpp"
);
