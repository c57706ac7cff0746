//! Error and status types for capdispatch.
//!
//! Internally every fallible operation returns [`Result`]. The stable call
//! surface in [`crate::api`] flattens errors into a [`Status`] code through
//! [`Error::status`].

use crate::session::Domain;
use crate::variant::VariantKind;
use std::fmt;
use thiserror::Error;

/// Result type alias using capdispatch's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dispatcher and session operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A required argument or output slot was absent.
    #[error("null argument: {0}")]
    NullPtr(&'static str),

    /// A handle was null, stale, or presented to an object that does not own it.
    #[error("invalid handle: {0}")]
    InvalidHandle(&'static str),

    /// The property path does not name a leaf of the capability schema.
    #[error("unknown property path '{0}'")]
    UnknownProperty(String),

    /// The filter value kind disagrees with the schema leaf.
    #[error("property '{path}' expects {expected} but got {actual}")]
    TypeMismatch {
        /// Offending path.
        path: String,
        /// Kind declared by the schema.
        expected: VariantKind,
        /// Kind supplied by the caller.
        actual: VariantKind,
    },

    /// No implementation satisfies the filters at the requested index.
    #[error("no matching implementation at index {index}")]
    NoMatch {
        /// Requested index among the matches.
        index: u32,
    },

    /// The request is understood but not offered.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The domain has not been initialized.
    #[error("{0} is not initialized")]
    NotInitialized(Domain),

    /// Init was called on an already initialized domain.
    #[error("{0} is already initialized")]
    AlreadyInitialized(Domain),

    /// Parameters are invalid and cannot be corrected.
    #[error("invalid video parameters: {0}")]
    InvalidVideoParam(String),

    /// Parameters are incompatible with the running configuration.
    #[error("incompatible video parameters: {0}")]
    IncompatibleVideoParam(String),
}

impl Error {
    /// Map this error to the status code reported by the call surface.
    pub fn status(&self) -> Status {
        match self {
            Error::NullPtr(_) => Status::NullPtr,
            Error::InvalidHandle(_) => Status::InvalidHandle,
            Error::UnknownProperty(_) | Error::NoMatch { .. } => Status::NotFound,
            Error::TypeMismatch { .. } | Error::Unsupported(_) => Status::Unsupported,
            Error::NotInitialized(_) => Status::NotInitialized,
            Error::AlreadyInitialized(_) => Status::UndefinedBehavior,
            Error::InvalidVideoParam(_) => Status::InvalidVideoParam,
            Error::IncompatibleVideoParam(_) => Status::IncompatibleVideoParam,
        }
    }
}

/// Status code returned by every call of the stable surface.
///
/// Negative values are errors, zero is success, positive values are
/// warnings. The numeric values are part of the ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    /// Success.
    None = 0,
    /// Absent argument or output slot.
    NullPtr = -2,
    /// Request not supported, including filter kind mismatches.
    Unsupported = -3,
    /// Null, stale or foreign handle.
    InvalidHandle = -6,
    /// Domain not initialized.
    NotInitialized = -8,
    /// Unknown property path or no matching implementation.
    NotFound = -9,
    /// Parameters incompatible with the running configuration.
    IncompatibleVideoParam = -14,
    /// Parameters invalid.
    InvalidVideoParam = -15,
    /// Operation would have undefined behavior (double init).
    UndefinedBehavior = -16,
    /// Incompatible parameters were corrected automatically.
    IncompatibleVideoParamResolved = 5,
}

impl Status {
    /// Raw numeric code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Whether this status is an error (negative code).
    pub fn is_error(self) -> bool {
        self.code() < 0
    }

    /// Whether this status is a warning (positive code).
    pub fn is_warning(self) -> bool {
        self.code() > 0
    }

    /// Convert a typed result into a status code.
    pub fn from_result<T>(result: &Result<T>) -> Status {
        match result {
            Ok(_) => Status::None,
            Err(err) => err.status(),
        }
    }
}

impl From<&Error> for Status {
    fn from(err: &Error) -> Self {
        err.status()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::None => "none",
            Status::NullPtr => "null-ptr",
            Status::Unsupported => "unsupported",
            Status::InvalidHandle => "invalid-handle",
            Status::NotInitialized => "not-initialized",
            Status::NotFound => "not-found",
            Status::IncompatibleVideoParam => "incompatible-video-param",
            Status::InvalidVideoParam => "invalid-video-param",
            Status::UndefinedBehavior => "undefined-behavior",
            Status::IncompatibleVideoParamResolved => "incompatible-video-param-resolved",
        };
        f.write_str(name)
    }
}
