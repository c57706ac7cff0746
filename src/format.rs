//! Codec identifiers, pixel formats and chroma layouts.
//!
//! All identifiers are the little-endian FourCC codes used on the wire of the
//! dispatch ABI, so they can be stored directly in descriptor leaves and in
//! [`crate::session::VideoParam`].
//!
//! # Design Principles
//!
//! - **Type safety**: [`PixelFormat`] wraps the raw FourCC for lookups
//! - **Explicit**: unknown FourCCs stay unknown, nothing is guessed

/// Build a little-endian FourCC code.
pub const fn fourcc(code: &[u8; 4]) -> u32 {
    (code[0] as u32) | ((code[1] as u32) << 8) | ((code[2] as u32) << 16) | ((code[3] as u32) << 24)
}

/// Render a FourCC for logs, replacing non-printable bytes with `.`.
pub fn fourcc_str(code: u32) -> String {
    code.to_le_bytes()
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
        .collect()
}

// ============================================================================
// Codecs
// ============================================================================

/// Codec identifiers.
pub mod codec {
    use super::fourcc;

    /// H.264 / AVC.
    pub const AVC: u32 = fourcc(b"AVC ");
    /// H.265 / HEVC.
    pub const HEVC: u32 = fourcc(b"HEVC");
    /// MPEG-2 video.
    pub const MPEG2: u32 = fourcc(b"MPG2");
    /// VP9.
    pub const VP9: u32 = fourcc(b"VP90");
    /// AV1.
    pub const AV1: u32 = fourcc(b"AV1 ");
    /// Motion JPEG.
    pub const JPEG: u32 = fourcc(b"JPEG");

    /// Human-readable codec name.
    pub fn name(id: u32) -> &'static str {
        match id {
            AVC => "avc",
            HEVC => "hevc",
            MPEG2 => "mpeg2",
            VP9 => "vp9",
            AV1 => "av1",
            JPEG => "jpeg",
            _ => "unknown",
        }
    }
}

/// Codec profile values advertised by the built-in backend.
pub mod profile {
    /// AVC baseline.
    pub const AVC_BASELINE: u32 = 66;
    /// AVC main.
    pub const AVC_MAIN: u32 = 77;
    /// AVC high.
    pub const AVC_HIGH: u32 = 100;
    /// HEVC main.
    pub const HEVC_MAIN: u32 = 1;
    /// HEVC main 10.
    pub const HEVC_MAIN10: u32 = 2;
    /// AV1 main.
    pub const AV1_MAIN: u32 = 1;
    /// JPEG baseline.
    pub const JPEG_BASELINE: u32 = 1;
}

// ============================================================================
// Chroma formats
// ============================================================================

/// Chroma sampling layouts.
///
/// Zero means "not specified" and is derived from the pixel format during
/// parameter canonicalization.
pub mod chroma {
    /// Not specified.
    pub const UNSPECIFIED: u16 = 0;
    /// 4:2:0.
    pub const YUV420: u16 = 1;
    /// 4:2:2.
    pub const YUV422: u16 = 2;
    /// 4:4:4.
    pub const YUV444: u16 = 3;
}

// ============================================================================
// PixelFormat
// ============================================================================

/// Raw pixel formats the dispatcher knows how to reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// YUV 4:2:0 semi-planar, 8-bit.
    Nv12,
    /// YUV 4:2:0 planar, 8-bit.
    I420,
    /// YUV 4:2:0 planar, 10-bit.
    I010,
    /// YUV 4:2:0 semi-planar, 10-bit.
    P010,
    /// YUV 4:2:2 packed, 8-bit.
    Yuy2,
    /// YUV 4:2:2 planar, 8-bit.
    I422,
    /// Packed 32-bit BGRA.
    Bgra,
}

impl PixelFormat {
    /// All known formats.
    pub const ALL: [PixelFormat; 7] = [
        Self::Nv12,
        Self::I420,
        Self::I010,
        Self::P010,
        Self::Yuy2,
        Self::I422,
        Self::Bgra,
    ];

    /// FourCC code of this format.
    pub const fn fourcc(self) -> u32 {
        match self {
            Self::Nv12 => fourcc(b"NV12"),
            Self::I420 => fourcc(b"I420"),
            Self::I010 => fourcc(b"I010"),
            Self::P010 => fourcc(b"P010"),
            Self::Yuy2 => fourcc(b"YUY2"),
            Self::I422 => fourcc(b"I422"),
            Self::Bgra => fourcc(b"RGB4"),
        }
    }

    /// Look up a format by FourCC.
    pub fn from_fourcc(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.fourcc() == code)
    }

    /// Chroma layout carried by this format.
    pub const fn chroma(self) -> u16 {
        match self {
            Self::Nv12 | Self::I420 | Self::I010 | Self::P010 => chroma::YUV420,
            Self::Yuy2 | Self::I422 => chroma::YUV422,
            Self::Bgra => chroma::YUV444,
        }
    }

    /// Bits per luma/colour sample.
    pub const fn bit_depth(self) -> u16 {
        match self {
            Self::I010 | Self::P010 => 10,
            _ => 8,
        }
    }

    /// Whether the format is packed RGB.
    pub const fn is_rgb(self) -> bool {
        matches!(self, Self::Bgra)
    }

    /// Whether width and height must be even.
    pub const fn needs_even_dimensions(self) -> bool {
        matches!(self.chroma(), chroma::YUV420 | chroma::YUV422) && !self.is_rgb()
    }
}

/// FourCC constants for the known pixel formats.
pub mod pixel {
    use super::PixelFormat;

    /// NV12.
    pub const NV12: u32 = PixelFormat::Nv12.fourcc();
    /// I420 (IYUV).
    pub const I420: u32 = PixelFormat::I420.fourcc();
    /// I010.
    pub const I010: u32 = PixelFormat::I010.fourcc();
    /// P010.
    pub const P010: u32 = PixelFormat::P010.fourcc();
    /// YUY2.
    pub const YUY2: u32 = PixelFormat::Yuy2.fourcc();
    /// I422.
    pub const I422: u32 = PixelFormat::I422.fourcc();
    /// RGB4.
    pub const RGB4: u32 = PixelFormat::Bgra.fourcc();
    /// BGRA, an alias of RGB4.
    pub const BGRA: u32 = RGB4;
}
