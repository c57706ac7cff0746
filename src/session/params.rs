//! Video parameter sets exchanged with the domain state machines.

use crate::caps::mem_handle;

/// Rate control methods.
pub mod rate_control {
    /// Constant bitrate.
    pub const CBR: u16 = 1;
    /// Variable bitrate.
    pub const VBR: u16 = 2;
    /// Constant quantizer.
    pub const CQP: u16 = 3;
    /// Average variable bitrate.
    pub const AVBR: u16 = 4;
}

/// Encoder speed/quality presets.
pub mod target_usage {
    /// Best quality.
    pub const BEST_QUALITY: u16 = 1;
    /// Balanced.
    pub const BALANCED: u16 = 4;
    /// Best speed.
    pub const BEST_SPEED: u16 = 7;
}

/// Picture structure values.
pub mod pic_struct {
    /// Unknown.
    pub const UNKNOWN: u16 = 0x00;
    /// Progressive frame.
    pub const PROGRESSIVE: u16 = 0x01;
}

/// Memory class of surfaces on one side of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryClass {
    /// Surfaces in device memory.
    Video,
    /// Surfaces in system memory.
    System,
}

impl MemoryClass {
    /// Memory handle type advertised for this class.
    pub fn mem_handle_type(self) -> u32 {
        match self {
            Self::Video => mem_handle::VIDEO_SURFACE,
            Self::System => mem_handle::SYSTEM_SURFACE,
        }
    }
}

/// Declaration on one side (input or output) of an IO pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoSide {
    /// No class declared.
    Missing,
    /// Exactly one class declared.
    Single(MemoryClass),
    /// Both classes declared, which no domain accepts.
    Conflicting,
}

/// Memory classes declared for input and output surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IoPattern(pub u16);

impl IoPattern {
    /// Input surfaces in video memory.
    pub const IN_VIDEO_MEMORY: IoPattern = IoPattern(0x01);
    /// Input surfaces in system memory.
    pub const IN_SYSTEM_MEMORY: IoPattern = IoPattern(0x02);
    /// Output surfaces in video memory.
    pub const OUT_VIDEO_MEMORY: IoPattern = IoPattern(0x10);
    /// Output surfaces in system memory.
    pub const OUT_SYSTEM_MEMORY: IoPattern = IoPattern(0x20);

    /// Raw bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Whether all bits of `other` are set.
    pub const fn contains(self, other: IoPattern) -> bool {
        self.0 & other.0 == other.0
    }

    /// Input side declaration.
    pub fn input(self) -> IoSide {
        side(
            self.contains(Self::IN_VIDEO_MEMORY),
            self.contains(Self::IN_SYSTEM_MEMORY),
        )
    }

    /// Output side declaration.
    pub fn output(self) -> IoSide {
        side(
            self.contains(Self::OUT_VIDEO_MEMORY),
            self.contains(Self::OUT_SYSTEM_MEMORY),
        )
    }
}

impl std::ops::BitOr for IoPattern {
    type Output = IoPattern;

    fn bitor(self, rhs: IoPattern) -> IoPattern {
        IoPattern(self.0 | rhs.0)
    }
}

fn side(video: bool, system: bool) -> IoSide {
    match (video, system) {
        (false, false) => IoSide::Missing,
        (true, false) => IoSide::Single(MemoryClass::Video),
        (false, true) => IoSide::Single(MemoryClass::System),
        (true, true) => IoSide::Conflicting,
    }
}

/// Description of one frame stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameInfo {
    /// Pixel format FourCC.
    pub fourcc: u32,
    /// Chroma format, 0 to derive from the FourCC.
    pub chroma_format: u16,
    /// Allocated width.
    pub width: u16,
    /// Allocated height.
    pub height: u16,
    /// Crop origin X.
    pub crop_x: u16,
    /// Crop origin Y.
    pub crop_y: u16,
    /// Crop width, 0 to use the frame width.
    pub crop_w: u16,
    /// Crop height, 0 to use the frame height.
    pub crop_h: u16,
    /// Frame rate numerator.
    pub frame_rate_ext_n: u32,
    /// Frame rate denominator.
    pub frame_rate_ext_d: u32,
    /// Sample aspect ratio width.
    pub aspect_ratio_w: u16,
    /// Sample aspect ratio height.
    pub aspect_ratio_h: u16,
    /// Picture structure (see [`pic_struct`]).
    pub pic_struct: u16,
    /// Luma bit depth, 0 to derive.
    pub bit_depth_luma: u16,
    /// Chroma bit depth, 0 to derive.
    pub bit_depth_chroma: u16,
}

/// Encoder/decoder parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CodecParams {
    /// Codec FourCC.
    pub codec_id: u32,
    /// Codec profile, 0 for the codec default.
    pub codec_profile: u16,
    /// Codec level.
    pub codec_level: u16,
    /// Speed/quality preset (see [`target_usage`]).
    pub target_usage: u16,
    /// Frames per GOP.
    pub gop_pic_size: u16,
    /// Distance between anchor frames.
    pub gop_ref_dist: u16,
    /// Rate control (see [`rate_control`]).
    pub rate_control_method: u16,
    /// Initial buffer delay.
    pub initial_delay_in_kb: u16,
    /// Target bitrate.
    pub target_kbps: u16,
    /// Peak bitrate.
    pub max_kbps: u16,
    /// Slices per frame, 0 for the codec default.
    pub num_slice: u16,
    /// Surface description.
    pub frame_info: FrameInfo,
}

/// VPP input and output streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VppParams {
    /// Input stream.
    pub input: FrameInfo,
    /// Output stream.
    pub output: FrameInfo,
}

/// Full parameter set for one domain call.
///
/// Encode and Decode read `mfx`, VPP reads `vpp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VideoParam {
    /// Declared memory classes.
    pub io_pattern: IoPattern,
    /// Codec parameters.
    pub mfx: CodecParams,
    /// VPP parameters.
    pub vpp: VppParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_sides() {
        let io = IoPattern::IN_SYSTEM_MEMORY | IoPattern::OUT_VIDEO_MEMORY;
        assert_eq!(io.input(), IoSide::Single(MemoryClass::System));
        assert_eq!(io.output(), IoSide::Single(MemoryClass::Video));
        assert_eq!(io.bits(), 0x12);

        assert_eq!(IoPattern::default().input(), IoSide::Missing);
        let both = IoPattern::IN_SYSTEM_MEMORY | IoPattern::IN_VIDEO_MEMORY;
        assert_eq!(both.input(), IoSide::Conflicting);
        assert_eq!(both.output(), IoSide::Missing);
    }

    #[test]
    fn test_memory_class_handles() {
        assert_eq!(
            MemoryClass::System.mem_handle_type(),
            mem_handle::SYSTEM_SURFACE
        );
        assert_eq!(MemoryClass::Video.mem_handle_type(), mem_handle::VIDEO_SURFACE);
    }
}
