//! Backend library descriptor for the C-compatible entry point.
//!
//! A backend library exports one symbol returning a static
//! [`BackendDescriptor`]. The descriptor carries metadata and a function that
//! creates the backend object.

use crate::backend::Backend;
use std::ffi::{CStr, c_char, c_void};

/// Current ABI version. Libraries must match this version to be loaded.
pub const CAPDISPATCH_ABI_VERSION: u32 = 1;

/// Name of the exported entry point symbol.
pub const ENTRY_POINT_SYMBOL: &[u8] = b"capdispatch_backend_descriptor\0";

/// Function pointer type for creating backend instances.
///
/// # Safety
///
/// The returned pointer must have been produced by [`backend_to_raw`].
pub type CreateBackendFn = unsafe extern "C" fn() -> *mut c_void;

/// Descriptor returned by `capdispatch_backend_descriptor()`.
///
/// This struct is `#[repr(C)]` for C ABI compatibility.
#[repr(C)]
pub struct BackendDescriptor {
    /// ABI version, must match [`CAPDISPATCH_ABI_VERSION`].
    pub abi_version: u32,
    /// Null-terminated backend name.
    pub name: *const c_char,
    /// Null-terminated version string.
    pub version: *const c_char,
    /// Function creating the backend object.
    pub create: CreateBackendFn,
}

// SAFETY: BackendDescriptor only holds pointers to static data and a
// function pointer.
unsafe impl Send for BackendDescriptor {}
unsafe impl Sync for BackendDescriptor {}

impl BackendDescriptor {
    /// Backend name as a Rust string.
    ///
    /// # Safety
    ///
    /// The `name` pointer must be valid and null-terminated.
    pub unsafe fn name_str(&self) -> &str {
        // SAFETY: Caller guarantees `name` is valid and null-terminated.
        unsafe { CStr::from_ptr(self.name).to_str().unwrap_or("unknown") }
    }

    /// Version as a Rust string.
    ///
    /// # Safety
    ///
    /// The `version` pointer must be valid and null-terminated.
    pub unsafe fn version_str(&self) -> &str {
        // SAFETY: Caller guarantees `version` is valid and null-terminated.
        unsafe { CStr::from_ptr(self.version).to_str().unwrap_or("0.0.0") }
    }

    /// Check that the descriptor can be used.
    ///
    /// # Safety
    ///
    /// All pointer fields must be valid or null.
    pub unsafe fn validate(&self) -> Result<(), &'static str> {
        if self.abi_version != CAPDISPATCH_ABI_VERSION {
            return Err("ABI version mismatch");
        }
        if self.name.is_null() {
            return Err("backend name is null");
        }
        if self.version.is_null() {
            return Err("backend version is null");
        }
        Ok(())
    }

    /// Create the backend object.
    ///
    /// # Safety
    ///
    /// `create` must return null or a pointer produced by [`backend_to_raw`].
    pub unsafe fn create_backend(&self) -> Option<Box<dyn Backend>> {
        // SAFETY: Caller guarantees the create function honours the contract.
        let ptr = unsafe { (self.create)() };
        if ptr.is_null() {
            None
        } else {
            // SAFETY: The pointer came from backend_to_raw.
            Some(unsafe { backend_from_raw(ptr) })
        }
    }
}

/// Safe copy of a descriptor's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendInfo {
    /// Backend name.
    pub name: String,
    /// Backend version.
    pub version: String,
}

impl BackendInfo {
    /// Copy metadata out of a raw descriptor.
    ///
    /// # Safety
    ///
    /// The descriptor must have passed [`BackendDescriptor::validate`].
    pub unsafe fn from_descriptor(desc: &BackendDescriptor) -> Self {
        // SAFETY: Caller guarantees descriptor is valid.
        unsafe {
            Self {
                name: desc.name_str().to_string(),
                version: desc.version_str().to_string(),
            }
        }
    }
}

/// Convert a backend box to a raw pointer for the C ABI.
///
/// The trait object is boxed a second time so a thin pointer crosses the
/// boundary.
pub fn backend_to_raw(backend: Box<dyn Backend>) -> *mut c_void {
    let boxed: Box<Box<dyn Backend>> = Box::new(backend);
    Box::into_raw(boxed) as *mut c_void
}

/// Convert a raw pointer back to a backend box.
///
/// # Safety
///
/// The pointer must have been created by [`backend_to_raw`] and not yet
/// converted back.
pub unsafe fn backend_from_raw(ptr: *mut c_void) -> Box<dyn Backend> {
    // SAFETY: Caller guarantees ptr was created by backend_to_raw.
    let boxed: Box<Box<dyn Backend>> = unsafe { Box::from_raw(ptr as *mut Box<dyn Backend>) };
    *boxed
}

/// Define the entry point of a backend library.
///
/// # Example
///
/// ```ignore
/// use capdispatch::define_backend;
///
/// define_backend! {
///     name: "vaapi",
///     version: "0.3.0",
///     create: || Box::new(VaapiBackend::probe()),
/// }
/// ```
#[macro_export]
macro_rules! define_backend {
    (
        name: $name:literal,
        version: $version:literal,
        create: $create:expr $(,)?
    ) => {
        static BACKEND_NAME: &[u8] = concat!($name, "\0").as_bytes();
        static BACKEND_VERSION: &[u8] = concat!($version, "\0").as_bytes();

        extern "C" fn capdispatch_create_backend() -> *mut std::ffi::c_void {
            let creator: fn() -> Box<dyn $crate::backend::Backend> = $create;
            $crate::plugin::backend_to_raw(creator())
        }

        static BACKEND_DESCRIPTOR: $crate::plugin::BackendDescriptor =
            $crate::plugin::BackendDescriptor {
                abi_version: $crate::plugin::CAPDISPATCH_ABI_VERSION,
                name: BACKEND_NAME.as_ptr() as *const std::ffi::c_char,
                version: BACKEND_VERSION.as_ptr() as *const std::ffi::c_char,
                create: capdispatch_create_backend,
            };

        /// Backend library entry point.
        #[unsafe(no_mangle)]
        pub extern "C" fn capdispatch_backend_descriptor() -> *const $crate::plugin::BackendDescriptor {
            &BACKEND_DESCRIPTOR
        }
    };
}
