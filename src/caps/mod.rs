//! Capability descriptors.
//!
//! An [`ImplDescription`] is the immutable tree a backend advertises at
//! discovery time. Filters address its leaves through the path table in
//! [`schema`] and are evaluated by [`matcher`].
//!
//! ```text
//! ImplDescription
//!   Impl / AccelerationMode / ApiVersion / VendorID / ImplName ...
//!   DecoderDescription.decoder[] -> decprofile[] -> decmemdesc[]
//!   EncoderDescription.encoder[] -> encprofile[] -> encmemdesc[]
//!   VPPDescription.filter[]      -> memdesc[]    -> format[]
//! ```

pub mod matcher;
pub mod schema;

/// Implementation types.
pub mod impl_type {
    /// CPU implementation.
    pub const SOFTWARE: u32 = 1;
    /// Hardware-accelerated implementation.
    pub const HARDWARE: u32 = 2;
}

/// Acceleration modes.
pub mod acceleration {
    /// No acceleration (software).
    pub const NA: u32 = 0;
    /// VA-API.
    pub const VAAPI: u32 = 0x0400;
}

/// Memory handle types a backend can exchange surfaces in.
pub mod mem_handle {
    /// Surfaces in system memory.
    pub const SYSTEM_SURFACE: u32 = 1;
    /// Surfaces in device (video) memory.
    pub const VIDEO_SURFACE: u32 = 2;
}

/// VPP filter identifiers.
pub mod vpp_filter {
    use crate::format::fourcc;

    /// Color space conversion.
    pub const COLOR_CONVERSION: u32 = fourcc(b"VCSC");
    /// Scaling.
    pub const SCALING: u32 = fourcc(b"VSCL");
}

/// API version advertised by an implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ApiVersion {
    /// Major version.
    pub major: u16,
    /// Minor version.
    pub minor: u16,
}

impl ApiVersion {
    /// Create a version.
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Packed form: major in the high half, minor in the low half.
    pub const fn packed(self) -> u32 {
        ((self.major as u32) << 16) | self.minor as u32
    }

    /// Whether this is the "any version" sentinel.
    pub const fn is_unspecified(self) -> bool {
        self.major == 0 && self.minor == 0
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Inclusive range with step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range32 {
    /// Minimum value.
    pub min: u32,
    /// Maximum value.
    pub max: u32,
    /// Step between valid values.
    pub step: u32,
}

impl Range32 {
    /// Create a range.
    pub const fn new(min: u32, max: u32, step: u32) -> Self {
        Self { min, max, step }
    }

    /// Whether `value` lies in the range and on a step.
    pub fn contains(&self, value: u32) -> bool {
        if value < self.min || value > self.max {
            return false;
        }
        self.step <= 1 || (value - self.min) % self.step == 0
    }
}

// ============================================================================
// Decoder / encoder branches
// ============================================================================

/// Surface memory accepted by a codec profile.
#[derive(Debug, Clone, PartialEq)]
pub struct MemDesc {
    /// Memory handle type (see [`mem_handle`]).
    pub mem_handle_type: u32,
    /// Supported widths.
    pub width: Range32,
    /// Supported heights.
    pub height: Range32,
    /// Supported surface FourCCs.
    pub color_formats: Vec<u32>,
}

/// A codec profile with its memory descriptions.
#[derive(Debug, Clone, PartialEq)]
pub struct CodecProfileDesc {
    /// Profile value.
    pub profile: u32,
    /// Supported memory layouts.
    pub mem_descs: Vec<MemDesc>,
}

/// One decoder entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderDesc {
    /// Codec FourCC.
    pub codec_id: u32,
    /// Highest supported level.
    pub max_codec_level: u16,
    /// Supported profiles.
    pub profiles: Vec<CodecProfileDesc>,
}

/// One encoder entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderDesc {
    /// Codec FourCC.
    pub codec_id: u32,
    /// Highest supported level.
    pub max_codec_level: u16,
    /// Non-zero if B-frames are supported.
    pub bidirectional_prediction: u16,
    /// Supported profiles.
    pub profiles: Vec<CodecProfileDesc>,
}

// ============================================================================
// VPP branch
// ============================================================================

/// Input format and the outputs it converts to.
#[derive(Debug, Clone, PartialEq)]
pub struct VppFormat {
    /// Input FourCC.
    pub in_format: u32,
    /// Output FourCCs.
    pub out_formats: Vec<u32>,
}

/// Memory layout supported by a VPP filter.
#[derive(Debug, Clone, PartialEq)]
pub struct VppMemDesc {
    /// Memory handle type.
    pub mem_handle_type: u32,
    /// Supported widths.
    pub width: Range32,
    /// Supported heights.
    pub height: Range32,
    /// Format pairs.
    pub formats: Vec<VppFormat>,
}

/// One VPP filter.
#[derive(Debug, Clone, PartialEq)]
pub struct VppFilterDesc {
    /// Filter FourCC.
    pub filter_fourcc: u32,
    /// Frames of latency introduced.
    pub max_delay_in_frames: u16,
    /// Supported memory layouts.
    pub mem_descs: Vec<VppMemDesc>,
}

// ============================================================================
// ImplDescription
// ============================================================================

/// Capability descriptor of one implementation.
///
/// Descriptors are shared through `Arc` and never mutated after discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct ImplDescription {
    /// Implementation type (see [`impl_type`]).
    pub impl_type: u32,
    /// Acceleration mode (see [`acceleration`]).
    pub acceleration_mode: u32,
    /// API version implemented.
    pub api_version: ApiVersion,
    /// Implementation name.
    pub impl_name: String,
    /// License string.
    pub license: String,
    /// Comma-separated keywords.
    pub keywords: String,
    /// PCI vendor id.
    pub vendor_id: u32,
    /// Vendor specific implementation id.
    pub vendor_impl_id: u32,
    /// Decoders.
    pub decoders: Vec<DecoderDesc>,
    /// Encoders.
    pub encoders: Vec<EncoderDesc>,
    /// VPP filters.
    pub vpp_filters: Vec<VppFilterDesc>,
}

impl ImplDescription {
    /// Look up a decoder by codec.
    pub fn decoder(&self, codec_id: u32) -> Option<&DecoderDesc> {
        self.decoders.iter().find(|d| d.codec_id == codec_id)
    }

    /// Look up an encoder by codec.
    pub fn encoder(&self, codec_id: u32) -> Option<&EncoderDesc> {
        self.encoders.iter().find(|e| e.codec_id == codec_id)
    }

    /// Whether this implementation runs on the CPU.
    pub fn is_software(&self) -> bool {
        self.impl_type == impl_type::SOFTWARE
    }

    /// VPP memory descriptions for a handle type, across all filters.
    pub fn vpp_mem_descs(&self, mem_handle_type: u32) -> impl Iterator<Item = &VppMemDesc> {
        self.vpp_filters
            .iter()
            .flat_map(|f| f.mem_descs.iter())
            .filter(move |m| m.mem_handle_type == mem_handle_type)
    }
}

/// Memory descriptions of a set of codec profiles for one handle type.
pub fn codec_mem_descs(
    profiles: &[CodecProfileDesc],
    mem_handle_type: u32,
) -> impl Iterator<Item = &MemDesc> {
    profiles
        .iter()
        .flat_map(|p| p.mem_descs.iter())
        .filter(move |m| m.mem_handle_type == mem_handle_type)
}
