//! Backend implementations and the trait they expose to the registry.
//!
//! A backend is only consulted for its capability descriptor. The processing
//! itself happens behind the session once a caller is bound to it.

mod software;

pub use software::SoftwareBackend;

use crate::caps::ImplDescription;

/// An implementation that can be discovered by the registry.
///
/// Built-in backends implement this directly; backend libraries return a
/// boxed implementation through [`crate::plugin::BackendDescriptor`].
pub trait Backend: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Build the capability descriptor advertised by this backend.
    ///
    /// Called once at discovery. The result is cached by the registry.
    fn describe(&self) -> ImplDescription;
}
