//! # capdispatch
//!
//! Capability-based implementation dispatch for video processing backends.
//!
//! capdispatch discovers processing implementations, filters them against
//! typed constraints addressed by property paths, and binds callers to one
//! of them through a session. Sessions host independent Encode, Decode and
//! VPP state machines that validate parameters against the bound
//! implementation's advertised capabilities.
//!
//! ## Features
//!
//! - **Typed filters**: property paths resolve through a static schema, with
//!   strict kind checking at set time
//! - **Backend libraries**: shared libraries advertise capabilities through a
//!   small C ABI, alongside a built-in software backend
//! - **Status surface**: generation-checked opaque handles and stable status
//!   codes in [`api`], layered over the typed Rust API
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use capdispatch::prelude::*;
//!
//! let mut loader = Loader::new();
//! let config = loader.create_config();
//! loader.set_filter_property(config, "ImplDescription.Impl", impl_type::SOFTWARE)?;
//! loader.set_filter_property(
//!     config,
//!     "ImplDescription.DecoderDescription.decoder.CodecID",
//!     codec::HEVC,
//! )?;
//!
//! let mut session = loader.create_session(0)?;
//! session.init(Domain::Decode, &params)?;
//! session.close();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod api;
pub mod backend;
pub mod caps;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod handle;
pub mod observability;
pub mod plugin;
pub mod registry;
pub mod session;
pub mod variant;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::caps::{ApiVersion, ImplDescription, impl_type, mem_handle};
    pub use crate::config::DispatcherConfig;
    pub use crate::dispatcher::{Config, ImplCapsFormat, Loader};
    pub use crate::error::{Error, Result, Status};
    pub use crate::format::{PixelFormat, chroma, codec, pixel};
    pub use crate::registry::{ImplementationRegistry, LegacyImpl};
    pub use crate::session::{Domain, FrameInfo, IoPattern, Session, VideoParam};
    pub use crate::variant::{Variant, VariantKind};
}

pub use error::{Error, Result, Status};
