//! Backend libraries loaded at runtime.
//!
//! A backend library is a shared library (.so on Linux) exporting a single
//! symbol:
//!
//! ```c
//! const BackendDescriptor* capdispatch_backend_descriptor();
//! ```
//!
//! The descriptor carries the ABI version, metadata and a function creating
//! the [`crate::backend::Backend`] object whose capability descriptor is then
//! added to the registry.
//!
//! # Example Backend (Rust)
//!
//! ```ignore
//! use capdispatch::backend::Backend;
//! use capdispatch::caps::ImplDescription;
//!
//! struct VaapiBackend;
//!
//! impl Backend for VaapiBackend {
//!     fn name(&self) -> &str { "vaapi" }
//!     fn describe(&self) -> ImplDescription { probe_device() }
//! }
//!
//! capdispatch::define_backend! {
//!     name: "vaapi",
//!     version: "0.1.0",
//!     create: || Box::new(VaapiBackend),
//! }
//! ```

mod descriptor;
mod loader;

pub use descriptor::{
    BackendDescriptor, BackendInfo, CAPDISPATCH_ABI_VERSION, CreateBackendFn, ENTRY_POINT_SYMBOL,
    backend_from_raw, backend_to_raw,
};
pub use loader::{BackendError, BackendLoader, LoadedBackend, is_shared_library};
