//! Typed scalar values used for filter properties and descriptor leaves.
//!
//! A [`Variant`] always carries its [`VariantKind`]. Comparison never
//! coerces: a `U16(5)` is not equal to a `U32(5)`.

use std::fmt;

// ============================================================================
// VariantKind
// ============================================================================

/// The declared type of a [`Variant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Unsigned 64-bit integer.
    U64,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// Opaque pointer-sized value.
    Ptr,
    /// UTF-8 string.
    String,
}

impl VariantKind {
    /// Display name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "U8",
            Self::U16 => "U16",
            Self::U32 => "U32",
            Self::U64 => "U64",
            Self::I32 => "I32",
            Self::I64 => "I64",
            Self::F32 => "F32",
            Self::F64 => "F64",
            Self::Ptr => "Ptr",
            Self::String => "String",
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Variant
// ============================================================================

/// A tagged scalar value.
///
/// `Ptr` holds an opaque address-sized token rather than a raw pointer so the
/// value stays `Send` and comparable.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    /// Unsigned 8-bit integer.
    U8(u8),
    /// Unsigned 16-bit integer.
    U16(u16),
    /// Unsigned 32-bit integer.
    U32(u32),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// Signed 32-bit integer.
    I32(i32),
    /// Signed 64-bit integer.
    I64(i64),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
    /// Opaque pointer-sized value.
    Ptr(usize),
    /// UTF-8 string.
    String(String),
}

impl Variant {
    /// Kind tag of this value.
    pub fn kind(&self) -> VariantKind {
        match self {
            Self::U8(_) => VariantKind::U8,
            Self::U16(_) => VariantKind::U16,
            Self::U32(_) => VariantKind::U32,
            Self::U64(_) => VariantKind::U64,
            Self::I32(_) => VariantKind::I32,
            Self::I64(_) => VariantKind::I64,
            Self::F32(_) => VariantKind::F32,
            Self::F64(_) => VariantKind::F64,
            Self::Ptr(_) => VariantKind::Ptr,
            Self::String(_) => VariantKind::String,
        }
    }

    /// Read the value as `u32` if it is a `U32`.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U32(v) => Some(*v),
            _ => None,
        }
    }

    /// Read the value as `u16` if it is a `U16`.
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Self::U16(v) => Some(*v),
            _ => None,
        }
    }

    /// Read the value as a string slice if it is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8(v) => write!(f, "{v}u8"),
            Self::U16(v) => write!(f, "{v}u16"),
            Self::U32(v) => write!(f, "{v}u32"),
            Self::U64(v) => write!(f, "{v}u64"),
            Self::I32(v) => write!(f, "{v}i32"),
            Self::I64(v) => write!(f, "{v}i64"),
            Self::F32(v) => write!(f, "{v}f32"),
            Self::F64(v) => write!(f, "{v}f64"),
            Self::Ptr(v) => write!(f, "{v:#x}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Variant {
                fn from(v: $ty) -> Self {
                    Variant::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => String,
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::String(v.to_string())
    }
}
