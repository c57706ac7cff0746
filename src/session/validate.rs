//! Structural validation and canonicalization of video parameters.
//!
//! Validation runs against the capability descriptor bound to the session:
//! a parameter set is accepted only if the descriptor advertises the codec,
//! memory class, pixel format and dimensions it asks for. Fields left at zero
//! are filled in from the pixel format or from domain defaults.

use super::Domain;
use super::params::{FrameInfo, IoSide, MemoryClass, VideoParam, rate_control, target_usage};
use crate::caps::{CodecProfileDesc, ImplDescription, MemDesc, Range32, codec_mem_descs};
use crate::error::{Error, Result, Status};
use crate::format::{PixelFormat, chroma, codec, fourcc_str};

/// AV1 mini-GOP length. GOP sizes beyond intra-only must be a multiple.
const AV1_MINI_GOP: u16 = 8;

const DEFAULT_FRAME_RATE: (u32, u32) = (30, 1);

/// Outcome of a successful validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Validated {
    /// Canonical parameters to store as the effective set.
    pub params: VideoParam,
    /// `None`, or a warning when a field was corrected.
    pub status: Status,
}

/// Memory classes a domain uses, after checking the IO pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoClasses {
    /// Input class, for Encode and VPP.
    pub input: Option<MemoryClass>,
    /// Output class, for Decode and VPP.
    pub output: Option<MemoryClass>,
}

/// Check the IO pattern sides required by `domain`.
pub fn io_classes(domain: Domain, params: &VideoParam) -> Result<IoClasses> {
    let io = params.io_pattern;
    let (need_in, need_out) = match domain {
        Domain::Encode => (true, false),
        Domain::Decode => (false, true),
        Domain::Vpp => (true, true),
    };
    Ok(IoClasses {
        input: required_side(io.input(), need_in, "input")?,
        output: required_side(io.output(), need_out, "output")?,
    })
}

fn required_side(side: IoSide, required: bool, label: &str) -> Result<Option<MemoryClass>> {
    match side {
        IoSide::Single(class) => Ok(Some(class)),
        IoSide::Missing if !required => Ok(None),
        IoSide::Missing => Err(Error::InvalidVideoParam(format!(
            "io pattern declares no {label} memory"
        ))),
        IoSide::Conflicting => Err(Error::InvalidVideoParam(format!(
            "io pattern declares both memory classes for {label}"
        ))),
    }
}

/// Reject a reset that changes what the running context was built for.
///
/// A memory class change is a hard error for the codec domains but only an
/// incompatibility for VPP.
pub fn check_reset(domain: Domain, current: &VideoParam, next: &VideoParam) -> Result<()> {
    let before = io_classes(domain, current)?;
    let after = io_classes(domain, next)?;
    if before != after {
        let reason = "io pattern memory class changed".to_string();
        return Err(match domain {
            Domain::Vpp => Error::IncompatibleVideoParam(reason),
            Domain::Encode | Domain::Decode => Error::InvalidVideoParam(reason),
        });
    }
    if domain != Domain::Vpp && current.mfx.codec_id != next.mfx.codec_id {
        return Err(Error::InvalidVideoParam(format!(
            "codec changed from {} to {}",
            codec::name(current.mfx.codec_id),
            codec::name(next.mfx.codec_id)
        )));
    }
    Ok(())
}

/// Validate `params` for `domain` against `desc`.
pub fn validate(domain: Domain, desc: &ImplDescription, params: &VideoParam) -> Result<Validated> {
    match domain {
        Domain::Encode => validate_encode(desc, params),
        Domain::Decode => validate_decode(desc, params),
        Domain::Vpp => validate_vpp(desc, params),
    }
}

/// Validate encoder parameters.
pub fn validate_encode(desc: &ImplDescription, params: &VideoParam) -> Result<Validated> {
    let mut out = *params;
    let mut corrected = false;
    let class = io_classes(Domain::Encode, params)?
        .input
        .ok_or_else(|| Error::InvalidVideoParam("io pattern declares no input memory".into()))?;

    let codec_id = out.mfx.codec_id;
    let encoder = desc.encoder(codec_id).ok_or_else(|| {
        Error::InvalidVideoParam(format!("no {} encoder", codec::name(codec_id)))
    })?;
    let layouts = codec_layouts(&encoder.profiles, out.mfx.codec_profile, class)?;

    let frame = &mut out.mfx.frame_info;
    check_frame("input", frame, &layouts, false, &mut corrected)?;
    if frame.frame_rate_ext_n == 0 && frame.frame_rate_ext_d == 0 {
        (frame.frame_rate_ext_n, frame.frame_rate_ext_d) = DEFAULT_FRAME_RATE;
    }

    let mfx = &mut out.mfx;
    match mfx.target_usage {
        0 => mfx.target_usage = target_usage::BALANCED,
        1..=7 => {}
        other => {
            return Err(Error::InvalidVideoParam(format!("target usage {other} out of range")));
        }
    }
    if !matches!(
        mfx.rate_control_method,
        0 | rate_control::CBR | rate_control::VBR | rate_control::CQP | rate_control::AVBR
    ) {
        return Err(Error::InvalidVideoParam(format!(
            "unknown rate control method {}",
            mfx.rate_control_method
        )));
    }
    if codec_id == codec::AV1 {
        check_av1_gop(mfx.gop_pic_size)?;
    }

    Ok(finish(out, corrected))
}

/// Validate decoder parameters.
///
/// Frame dimensions may be zero until the stream header is parsed.
pub fn validate_decode(desc: &ImplDescription, params: &VideoParam) -> Result<Validated> {
    let mut out = *params;
    let mut corrected = false;
    let class = io_classes(Domain::Decode, params)?
        .output
        .ok_or_else(|| Error::InvalidVideoParam("io pattern declares no output memory".into()))?;

    let codec_id = out.mfx.codec_id;
    let decoder = desc.decoder(codec_id).ok_or_else(|| {
        Error::InvalidVideoParam(format!("no {} decoder", codec::name(codec_id)))
    })?;
    let layouts = codec_layouts(&decoder.profiles, out.mfx.codec_profile, class)?;
    check_frame("output", &mut out.mfx.frame_info, &layouts, true, &mut corrected)?;

    Ok(finish(out, corrected))
}

/// Validate VPP parameters.
pub fn validate_vpp(desc: &ImplDescription, params: &VideoParam) -> Result<Validated> {
    let mut out = *params;
    let mut corrected = false;
    let classes = io_classes(Domain::Vpp, params)?;
    let (Some(in_class), Some(out_class)) = (classes.input, classes.output) else {
        return Err(Error::InvalidVideoParam("vpp needs input and output memory".into()));
    };

    let in_layouts: Vec<Layout> = desc
        .vpp_mem_descs(in_class.mem_handle_type())
        .map(|m| Layout {
            width: m.width,
            height: m.height,
            formats: m.formats.iter().map(|f| f.in_format).collect(),
        })
        .collect();
    if in_layouts.is_empty() {
        return Err(unsupported_memory("vpp input", in_class));
    }
    check_frame("vpp input", &mut out.vpp.input, &in_layouts, false, &mut corrected)?;

    let in_fourcc = out.vpp.input.fourcc;
    let out_layouts: Vec<Layout> = desc
        .vpp_mem_descs(out_class.mem_handle_type())
        .map(|m| Layout {
            width: m.width,
            height: m.height,
            formats: m
                .formats
                .iter()
                .filter(|f| f.in_format == in_fourcc)
                .flat_map(|f| f.out_formats.iter().copied())
                .collect(),
        })
        .collect();
    if out_layouts.is_empty() {
        return Err(unsupported_memory("vpp output", out_class));
    }
    check_frame("vpp output", &mut out.vpp.output, &out_layouts, false, &mut corrected)?;

    Ok(finish(out, corrected))
}

fn finish(params: VideoParam, corrected: bool) -> Validated {
    let status = if corrected {
        Status::IncompatibleVideoParamResolved
    } else {
        Status::None
    };
    Validated { params, status }
}

fn check_av1_gop(gop_pic_size: u16) -> Result<()> {
    if gop_pic_size <= 1 || gop_pic_size % AV1_MINI_GOP == 0 {
        Ok(())
    } else {
        Err(Error::InvalidVideoParam(format!(
            "av1 gop size {gop_pic_size} is not a multiple of {AV1_MINI_GOP}"
        )))
    }
}

fn unsupported_memory(label: &str, class: MemoryClass) -> Error {
    Error::InvalidVideoParam(format!("{label}: {class:?} memory not supported"))
}

/// Surface constraints offered for one memory layout.
#[derive(Debug)]
struct Layout {
    width: Range32,
    height: Range32,
    formats: Vec<u32>,
}

impl Layout {
    fn from_mem_desc(mem: &MemDesc) -> Self {
        Self {
            width: mem.width,
            height: mem.height,
            formats: mem.color_formats.clone(),
        }
    }
}

fn codec_layouts(
    profiles: &[CodecProfileDesc],
    profile: u16,
    class: MemoryClass,
) -> Result<Vec<Layout>> {
    let chosen = if profile == 0 {
        profiles
    } else {
        match profiles.iter().find(|p| p.profile == u32::from(profile)) {
            Some(p) => std::slice::from_ref(p),
            None => {
                return Err(Error::InvalidVideoParam(format!("profile {profile} not supported")));
            }
        }
    };
    let layouts: Vec<Layout> = codec_mem_descs(chosen, class.mem_handle_type())
        .map(Layout::from_mem_desc)
        .collect();
    if layouts.is_empty() {
        return Err(unsupported_memory("codec", class));
    }
    Ok(layouts)
}

fn check_frame(
    label: &str,
    frame: &mut FrameInfo,
    layouts: &[Layout],
    allow_zero_size: bool,
    corrected: &mut bool,
) -> Result<()> {
    let invalid = |reason: String| Error::InvalidVideoParam(format!("{label}: {reason}"));

    let format = PixelFormat::from_fourcc(frame.fourcc)
        .ok_or_else(|| invalid(format!("unknown fourcc {}", fourcc_str(frame.fourcc))))?;
    let candidates: Vec<&Layout> = layouts
        .iter()
        .filter(|l| l.formats.contains(&frame.fourcc))
        .collect();
    if candidates.is_empty() {
        return Err(invalid(format!("{} not offered", fourcc_str(frame.fourcc))));
    }

    if frame.chroma_format == chroma::UNSPECIFIED {
        frame.chroma_format = format.chroma();
    } else if !format.is_rgb() && frame.chroma_format != format.chroma() {
        return Err(invalid(format!(
            "chroma format {} does not match {}",
            frame.chroma_format,
            fourcc_str(frame.fourcc)
        )));
    }

    for depth in [&mut frame.bit_depth_luma, &mut frame.bit_depth_chroma] {
        if *depth == 0 {
            *depth = format.bit_depth();
        } else if *depth != format.bit_depth() {
            return Err(invalid(format!("bit depth {depth} does not match format")));
        }
    }

    if frame.frame_rate_ext_n != 0 && frame.frame_rate_ext_d == 0 {
        return Err(invalid("frame rate denominator is zero".into()));
    }

    let (width, height) = (u32::from(frame.width), u32::from(frame.height));
    if width == 0 || height == 0 {
        if allow_zero_size {
            return Ok(());
        }
        return Err(invalid("frame size is zero".into()));
    }
    if !candidates
        .iter()
        .any(|l| l.width.contains(width) && l.height.contains(height))
    {
        return Err(invalid(format!("{width}x{height} outside supported range")));
    }
    if format.needs_even_dimensions() && (width % 2 != 0 || height % 2 != 0) {
        return Err(invalid(format!("{width}x{height} must be even")));
    }

    if clamp_crop(&mut frame.crop_x, &mut frame.crop_w, frame.width)
        | clamp_crop(&mut frame.crop_y, &mut frame.crop_h, frame.height)
    {
        tracing::debug!(
            label,
            crop_w = frame.crop_w,
            crop_h = frame.crop_h,
            "crop clamped to frame"
        );
        *corrected = true;
    }
    Ok(())
}

/// Derive or clamp one crop axis. Returns whether the caller's value changed.
fn clamp_crop(offset: &mut u16, extent: &mut u16, size: u16) -> bool {
    if *extent == 0 {
        *extent = size.saturating_sub(*offset);
        return false;
    }
    if u32::from(*offset) + u32::from(*extent) <= u32::from(size) {
        return false;
    }
    *offset = (*offset).min(size);
    *extent = size - *offset;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SoftwareBackend;
    use crate::format::{pixel, profile};
    use crate::session::params::IoPattern;

    fn frame(fourcc: u32, chroma_format: u16, width: u16, height: u16) -> FrameInfo {
        FrameInfo {
            fourcc,
            chroma_format,
            width,
            height,
            crop_w: width,
            crop_h: height,
            ..Default::default()
        }
    }

    fn encode(codec_id: u32) -> VideoParam {
        let mut params = VideoParam {
            io_pattern: IoPattern::IN_SYSTEM_MEMORY,
            ..Default::default()
        };
        params.mfx.codec_id = codec_id;
        params.mfx.frame_info = frame(pixel::I420, chroma::YUV420, 128, 96);
        params
    }

    fn decode(codec_id: u32) -> VideoParam {
        let mut params = encode(codec_id);
        params.io_pattern = IoPattern::OUT_SYSTEM_MEMORY;
        params
    }

    fn vpp(input: u32, output: u32) -> VideoParam {
        let mut params = VideoParam {
            io_pattern: IoPattern::IN_SYSTEM_MEMORY | IoPattern::OUT_SYSTEM_MEMORY,
            ..Default::default()
        };
        params.vpp.input = frame(input, chroma::UNSPECIFIED, 128, 96);
        params.vpp.output = frame(output, chroma::UNSPECIFIED, 128, 96);
        params
    }

    fn rejects(result: Result<Validated>) -> bool {
        matches!(result, Err(Error::InvalidVideoParam(_)))
    }

    #[test]
    fn test_encode_canonicalizes_defaults() {
        let desc = SoftwareBackend::description();
        let v = validate_encode(&desc, &encode(codec::JPEG)).unwrap();
        assert_eq!(v.status, Status::None);
        let fi = v.params.mfx.frame_info;
        assert_eq!((fi.frame_rate_ext_n, fi.frame_rate_ext_d), (30, 1));
        assert_eq!(fi.bit_depth_luma, 8);
        assert_eq!(v.params.mfx.target_usage, target_usage::BALANCED);
    }

    #[test]
    fn test_encode_keeps_caller_fields() {
        let desc = SoftwareBackend::description();
        let mut params = encode(codec::HEVC);
        params.mfx.codec_profile = profile::HEVC_MAIN as u16;
        params.mfx.rate_control_method = rate_control::VBR;
        params.mfx.target_kbps = 4000;
        params.mfx.initial_delay_in_kb = 1000;
        params.mfx.target_usage = target_usage::BEST_SPEED;
        let v = validate_encode(&desc, &params).unwrap();
        assert_eq!(v.params.mfx.rate_control_method, rate_control::VBR);
        assert_eq!(v.params.mfx.target_kbps, 4000);
        assert_eq!(v.params.mfx.initial_delay_in_kb, 1000);
        assert_eq!(v.params.mfx.codec_profile, profile::HEVC_MAIN as u16);
        assert_eq!(v.params.mfx.target_usage, target_usage::BEST_SPEED);
    }

    #[test]
    fn test_encode_rejections() {
        let desc = SoftwareBackend::description();

        let mut video = encode(codec::HEVC);
        video.io_pattern = IoPattern::IN_VIDEO_MEMORY;
        assert!(rejects(validate_encode(&desc, &video)));

        let mut missing_io = encode(codec::HEVC);
        missing_io.io_pattern = IoPattern::default();
        assert!(rejects(validate_encode(&desc, &missing_io)));

        assert!(rejects(validate_encode(&desc, &encode(codec::AVC))));

        let mut usage = encode(codec::HEVC);
        usage.mfx.target_usage = 8;
        assert!(rejects(validate_encode(&desc, &usage)));

        let mut rc = encode(codec::HEVC);
        rc.mfx.rate_control_method = 9;
        assert!(rejects(validate_encode(&desc, &rc)));

        let mut profile = encode(codec::HEVC);
        profile.mfx.codec_profile = 42;
        assert!(rejects(validate_encode(&desc, &profile)));

        let mut zero = encode(codec::JPEG);
        zero.mfx.frame_info.width = 0;
        assert!(rejects(validate_encode(&desc, &zero)));

        let mut odd = encode(codec::JPEG);
        odd.mfx.frame_info.width = 127;
        assert!(rejects(validate_encode(&desc, &odd)));
    }

    #[test]
    fn test_av1_gop_size() {
        let desc = SoftwareBackend::description();
        for (gop, ok) in [(0, true), (1, true), (16, true), (121, false), (7, false)] {
            let mut params = encode(codec::AV1);
            params.mfx.gop_pic_size = gop;
            assert_eq!(validate_encode(&desc, &params).is_ok(), ok, "gop {gop}");
        }
    }

    #[test]
    fn test_frame_rate_denominator() {
        let desc = SoftwareBackend::description();
        let mut params = encode(codec::JPEG);
        params.mfx.frame_info.frame_rate_ext_n = 30;
        assert!(rejects(validate_encode(&desc, &params)));
    }

    #[test]
    fn test_decode_chroma_and_fourcc() {
        let desc = SoftwareBackend::description();

        let mut derived = decode(codec::HEVC);
        derived.mfx.frame_info.chroma_format = chroma::UNSPECIFIED;
        let v = validate_decode(&desc, &derived).unwrap();
        assert_eq!(v.params.mfx.frame_info.chroma_format, chroma::YUV420);

        let mut mismatch = decode(codec::HEVC);
        mismatch.mfx.frame_info.chroma_format = chroma::YUV444;
        assert!(rejects(validate_decode(&desc, &mismatch)));

        let mut unknown = decode(codec::HEVC);
        unknown.mfx.frame_info.fourcc = 1;
        assert!(rejects(validate_decode(&desc, &unknown)));

        let mut video = decode(codec::HEVC);
        video.io_pattern = IoPattern::OUT_VIDEO_MEMORY;
        assert!(rejects(validate_decode(&desc, &video)));
    }

    #[test]
    fn test_decode_allows_unknown_size() {
        let desc = SoftwareBackend::description();
        let mut params = decode(codec::AV1);
        params.mfx.frame_info = FrameInfo {
            fourcc: pixel::I010,
            ..Default::default()
        };
        let v = validate_decode(&desc, &params).unwrap();
        assert_eq!(v.params.mfx.frame_info.bit_depth_luma, 10);
    }

    #[test]
    fn test_crop_derivation_and_clamp() {
        let desc = SoftwareBackend::description();

        let mut derived = encode(codec::JPEG);
        derived.mfx.frame_info.crop_w = 0;
        derived.mfx.frame_info.crop_h = 0;
        let v = validate_encode(&desc, &derived).unwrap();
        assert_eq!(v.status, Status::None);
        assert_eq!((v.params.mfx.frame_info.crop_w, v.params.mfx.frame_info.crop_h), (128, 96));

        let mut oversized = encode(codec::JPEG);
        oversized.mfx.frame_info.crop_w = 256;
        let v = validate_encode(&desc, &oversized).unwrap();
        assert_eq!(v.status, Status::IncompatibleVideoParamResolved);
        assert_eq!(v.params.mfx.frame_info.crop_w, 128);
    }

    #[test]
    fn test_vpp_pairs() {
        let desc = SoftwareBackend::description();
        assert!(validate_vpp(&desc, &vpp(pixel::I420, pixel::BGRA)).is_ok());
        assert!(validate_vpp(&desc, &vpp(pixel::BGRA, pixel::I420)).is_ok());
        assert!(rejects(validate_vpp(&desc, &vpp(pixel::I010, pixel::BGRA))));

        let mut rgb_chroma = vpp(pixel::BGRA, pixel::I420);
        rgb_chroma.vpp.input.chroma_format = chroma::YUV420;
        let v = validate_vpp(&desc, &rgb_chroma).unwrap();
        assert_eq!(v.params.vpp.input.chroma_format, chroma::YUV420);
        assert_eq!(v.params.vpp.output.chroma_format, chroma::YUV420);

        let mut video_out = vpp(pixel::BGRA, pixel::I420);
        video_out.io_pattern = IoPattern::IN_SYSTEM_MEMORY | IoPattern::OUT_VIDEO_MEMORY;
        assert!(rejects(validate_vpp(&desc, &video_out)));

        let mut no_output = vpp(pixel::I420, pixel::I420);
        no_output.io_pattern = IoPattern::IN_SYSTEM_MEMORY;
        assert!(rejects(validate_vpp(&desc, &no_output)));
    }

    #[test]
    fn test_reset_class_change() {
        let enc = encode(codec::JPEG);
        let mut enc_video = enc;
        enc_video.io_pattern = IoPattern::IN_VIDEO_MEMORY;
        assert!(matches!(
            check_reset(Domain::Encode, &enc, &enc_video),
            Err(Error::InvalidVideoParam(_))
        ));

        let base = vpp(pixel::I420, pixel::BGRA);
        let mut changed = base;
        changed.io_pattern = IoPattern::IN_SYSTEM_MEMORY | IoPattern::OUT_VIDEO_MEMORY;
        assert!(matches!(
            check_reset(Domain::Vpp, &base, &changed),
            Err(Error::IncompatibleVideoParam(_))
        ));
        assert!(check_reset(Domain::Vpp, &base, &base).is_ok());

        let mut other_codec = decode(codec::HEVC);
        other_codec.mfx.codec_id = codec::AV1;
        assert!(matches!(
            check_reset(Domain::Decode, &decode(codec::HEVC), &other_codec),
            Err(Error::InvalidVideoParam(_))
        ));
    }
}
