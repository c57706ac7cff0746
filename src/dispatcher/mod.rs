//! Capability-based implementation dispatch.
//!
//! A [`Loader`] collects filter properties in one or more [`Config`]s and
//! evaluates them against every descriptor in the registry. Matching
//! implementations can be enumerated or bound to a [`crate::session::Session`].
//!
//! # Example
//!
//! ```rust,ignore
//! use capdispatch::prelude::*;
//!
//! let mut loader = Loader::new();
//! let config = loader.create_config();
//! loader.set_filter_property(
//!     config,
//!     "ImplDescription.DecoderDescription.decoder.CodecID",
//!     codec::HEVC,
//! )?;
//! let session = loader.create_session(0)?;
//! ```

pub mod config;
pub mod loader;

pub use config::{Config, ConfigId};
pub use loader::{ImplCaps, ImplCapsFormat, Loader, VendedCaps};
