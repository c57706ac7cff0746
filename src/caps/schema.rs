//! Property path table for capability descriptors.
//!
//! Every filterable leaf of [`ImplDescription`] is registered here with its
//! declared [`VariantKind`] and an accessor collecting the leaf's values from
//! a descriptor. Resolving a path is a table lookup. Paths that name internal
//! nodes (`ImplDescription.DecoderDescription`) or nothing at all are
//! rejected.
//!
//! A leaf under a list (`decoder[]`, `decprofile[]`, ...) yields one value per
//! list element, which makes it array-valued for matching purposes.

use super::{ImplDescription, MemDesc, Range32, VppMemDesc};
use crate::error::{Error, Result};
use crate::variant::{Variant, VariantKind};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Values collected from one leaf. Inline capacity covers typical descriptors.
pub type LeafValues = SmallVec<[Variant; 8]>;

/// Accessor pushing every value found at a leaf.
pub type CollectFn = fn(&ImplDescription, &mut LeafValues);

/// Root segment of every property path.
pub const ROOT: &str = "ImplDescription";

/// A registered schema leaf.
pub struct SchemaLeaf {
    /// Full dotted path, including the root segment.
    pub path: &'static str,
    /// Declared value kind.
    pub kind: VariantKind,
    /// Whether the leaf can hold several values per descriptor.
    pub array: bool,
    collect: CollectFn,
}

impl SchemaLeaf {
    /// Collect the leaf's values from a descriptor.
    pub fn collect(&self, desc: &ImplDescription, out: &mut LeafValues) {
        (self.collect)(desc, out)
    }

    /// Collect the leaf's values into a fresh buffer.
    pub fn values(&self, desc: &ImplDescription) -> LeafValues {
        let mut out = LeafValues::new();
        self.collect(desc, &mut out);
        out
    }
}

impl std::fmt::Debug for SchemaLeaf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaLeaf")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("array", &self.array)
            .finish()
    }
}

macro_rules! scalar {
    ($path:literal, $kind:ident, |$d:ident, $out:ident| $body:expr) => {
        SchemaLeaf {
            path: concat!("ImplDescription.", $path),
            kind: VariantKind::$kind,
            array: false,
            collect: |$d: &ImplDescription, $out: &mut LeafValues| $body,
        }
    };
}

macro_rules! array {
    ($path:literal, $kind:ident, |$d:ident, $out:ident| $body:expr) => {
        SchemaLeaf {
            path: concat!("ImplDescription.", $path),
            kind: VariantKind::$kind,
            array: true,
            collect: |$d: &ImplDescription, $out: &mut LeafValues| $body,
        }
    };
}

// ============================================================================
// Traversal helpers
// ============================================================================

fn dec_mem(d: &ImplDescription) -> impl Iterator<Item = &MemDesc> {
    d.decoders
        .iter()
        .flat_map(|c| c.profiles.iter())
        .flat_map(|p| p.mem_descs.iter())
}

fn enc_mem(d: &ImplDescription) -> impl Iterator<Item = &MemDesc> {
    d.encoders
        .iter()
        .flat_map(|c| c.profiles.iter())
        .flat_map(|p| p.mem_descs.iter())
}

fn vpp_mem(d: &ImplDescription) -> impl Iterator<Item = &VppMemDesc> {
    d.vpp_filters.iter().flat_map(|f| f.mem_descs.iter())
}

fn push_u32<'a>(out: &mut LeafValues, values: impl Iterator<Item = &'a u32>) {
    out.extend(values.map(|v| Variant::U32(*v)));
}

fn push_range<'a>(
    out: &mut LeafValues,
    ranges: impl Iterator<Item = &'a Range32>,
    pick: fn(&Range32) -> u32,
) {
    out.extend(ranges.map(|r| Variant::U32(pick(r))));
}

// ============================================================================
// Leaf table
// ============================================================================

static LEAVES: &[SchemaLeaf] = &[
    // --- Implementation identity ---
    scalar!("Impl", U32, |d, out| out.push(Variant::U32(d.impl_type))),
    scalar!("AccelerationMode", U32, |d, out| out.push(Variant::U32(d.acceleration_mode))),
    scalar!("ApiVersion.Version", U32, |d, out| out.push(Variant::U32(d.api_version.packed()))),
    scalar!("ApiVersion.Major", U16, |d, out| out.push(Variant::U16(d.api_version.major))),
    scalar!("ApiVersion.Minor", U16, |d, out| out.push(Variant::U16(d.api_version.minor))),
    scalar!("VendorID", U32, |d, out| out.push(Variant::U32(d.vendor_id))),
    scalar!("VendorImplID", U32, |d, out| out.push(Variant::U32(d.vendor_impl_id))),
    scalar!("ImplName", String, |d, out| out.push(Variant::String(d.impl_name.clone()))),
    scalar!("License", String, |d, out| out.push(Variant::String(d.license.clone()))),
    scalar!("Keywords", String, |d, out| out.push(Variant::String(d.keywords.clone()))),
    // --- Decoders ---
    array!("DecoderDescription.decoder.CodecID", U32, |d, out| {
        push_u32(out, d.decoders.iter().map(|c| &c.codec_id))
    }),
    array!("DecoderDescription.decoder.MaxcodecLevel", U16, |d, out| {
        out.extend(d.decoders.iter().map(|c| Variant::U16(c.max_codec_level)))
    }),
    array!("DecoderDescription.decoder.decprofile.Profile", U32, |d, out| {
        push_u32(out, d.decoders.iter().flat_map(|c| c.profiles.iter()).map(|p| &p.profile))
    }),
    array!("DecoderDescription.decoder.decprofile.decmemdesc.MemHandleType", U32, |d, out| {
        push_u32(out, dec_mem(d).map(|m| &m.mem_handle_type))
    }),
    array!("DecoderDescription.decoder.decprofile.decmemdesc.Width.Min", U32, |d, out| {
        push_range(out, dec_mem(d).map(|m| &m.width), |r| r.min)
    }),
    array!("DecoderDescription.decoder.decprofile.decmemdesc.Width.Max", U32, |d, out| {
        push_range(out, dec_mem(d).map(|m| &m.width), |r| r.max)
    }),
    array!("DecoderDescription.decoder.decprofile.decmemdesc.Width.Step", U32, |d, out| {
        push_range(out, dec_mem(d).map(|m| &m.width), |r| r.step)
    }),
    array!("DecoderDescription.decoder.decprofile.decmemdesc.Height.Min", U32, |d, out| {
        push_range(out, dec_mem(d).map(|m| &m.height), |r| r.min)
    }),
    array!("DecoderDescription.decoder.decprofile.decmemdesc.Height.Max", U32, |d, out| {
        push_range(out, dec_mem(d).map(|m| &m.height), |r| r.max)
    }),
    array!("DecoderDescription.decoder.decprofile.decmemdesc.Height.Step", U32, |d, out| {
        push_range(out, dec_mem(d).map(|m| &m.height), |r| r.step)
    }),
    array!("DecoderDescription.decoder.decprofile.decmemdesc.ColorFormats", U32, |d, out| {
        push_u32(out, dec_mem(d).flat_map(|m| m.color_formats.iter()))
    }),
    // --- Encoders ---
    array!("EncoderDescription.encoder.CodecID", U32, |d, out| {
        push_u32(out, d.encoders.iter().map(|c| &c.codec_id))
    }),
    array!("EncoderDescription.encoder.MaxcodecLevel", U16, |d, out| {
        out.extend(d.encoders.iter().map(|c| Variant::U16(c.max_codec_level)))
    }),
    array!("EncoderDescription.encoder.BiDirectionalPrediction", U16, |d, out| {
        out.extend(d.encoders.iter().map(|c| Variant::U16(c.bidirectional_prediction)))
    }),
    array!("EncoderDescription.encoder.encprofile.Profile", U32, |d, out| {
        push_u32(out, d.encoders.iter().flat_map(|c| c.profiles.iter()).map(|p| &p.profile))
    }),
    array!("EncoderDescription.encoder.encprofile.encmemdesc.MemHandleType", U32, |d, out| {
        push_u32(out, enc_mem(d).map(|m| &m.mem_handle_type))
    }),
    array!("EncoderDescription.encoder.encprofile.encmemdesc.Width.Min", U32, |d, out| {
        push_range(out, enc_mem(d).map(|m| &m.width), |r| r.min)
    }),
    array!("EncoderDescription.encoder.encprofile.encmemdesc.Width.Max", U32, |d, out| {
        push_range(out, enc_mem(d).map(|m| &m.width), |r| r.max)
    }),
    array!("EncoderDescription.encoder.encprofile.encmemdesc.Width.Step", U32, |d, out| {
        push_range(out, enc_mem(d).map(|m| &m.width), |r| r.step)
    }),
    array!("EncoderDescription.encoder.encprofile.encmemdesc.Height.Min", U32, |d, out| {
        push_range(out, enc_mem(d).map(|m| &m.height), |r| r.min)
    }),
    array!("EncoderDescription.encoder.encprofile.encmemdesc.Height.Max", U32, |d, out| {
        push_range(out, enc_mem(d).map(|m| &m.height), |r| r.max)
    }),
    array!("EncoderDescription.encoder.encprofile.encmemdesc.Height.Step", U32, |d, out| {
        push_range(out, enc_mem(d).map(|m| &m.height), |r| r.step)
    }),
    array!("EncoderDescription.encoder.encprofile.encmemdesc.ColorFormats", U32, |d, out| {
        push_u32(out, enc_mem(d).flat_map(|m| m.color_formats.iter()))
    }),
    // --- VPP ---
    array!("VPPDescription.filter.FilterFourCC", U32, |d, out| {
        push_u32(out, d.vpp_filters.iter().map(|f| &f.filter_fourcc))
    }),
    array!("VPPDescription.filter.MaxDelayInFrames", U16, |d, out| {
        out.extend(d.vpp_filters.iter().map(|f| Variant::U16(f.max_delay_in_frames)))
    }),
    array!("VPPDescription.filter.memdesc.MemHandleType", U32, |d, out| {
        push_u32(out, vpp_mem(d).map(|m| &m.mem_handle_type))
    }),
    array!("VPPDescription.filter.memdesc.format.InFormat", U32, |d, out| {
        push_u32(out, vpp_mem(d).flat_map(|m| m.formats.iter()).map(|f| &f.in_format))
    }),
    array!("VPPDescription.filter.memdesc.format.OutFormat", U32, |d, out| {
        push_u32(
            out,
            vpp_mem(d)
                .flat_map(|m| m.formats.iter())
                .flat_map(|f| f.out_formats.iter()),
        )
    }),
];

fn index() -> &'static HashMap<&'static str, &'static SchemaLeaf> {
    static INDEX: OnceLock<HashMap<&'static str, &'static SchemaLeaf>> = OnceLock::new();
    INDEX.get_or_init(|| LEAVES.iter().map(|leaf| (leaf.path, leaf)).collect())
}

/// All registered leaves, in declaration order.
pub fn leaves() -> &'static [SchemaLeaf] {
    LEAVES
}

/// Resolve a property path to its schema leaf.
///
/// Returns [`Error::UnknownProperty`] for unknown paths and for paths naming
/// an internal node.
pub fn resolve(path: &str) -> Result<&'static SchemaLeaf> {
    index()
        .get(path)
        .copied()
        .ok_or_else(|| Error::UnknownProperty(path.to_string()))
}

/// Resolve a path and check the value kind against the leaf.
pub fn resolve_typed(path: &str, kind: VariantKind) -> Result<&'static SchemaLeaf> {
    let leaf = resolve(path)?;
    if leaf.kind != kind {
        return Err(Error::TypeMismatch {
            path: path.to_string(),
            expected: leaf.kind,
            actual: kind,
        });
    }
    Ok(leaf)
}
