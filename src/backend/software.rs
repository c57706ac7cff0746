//! The built-in CPU backend.

use super::Backend;
use crate::caps::{
    ApiVersion, CodecProfileDesc, DecoderDesc, EncoderDesc, ImplDescription, MemDesc, Range32,
    VppFilterDesc, VppFormat, VppMemDesc, acceleration, impl_type, mem_handle, vpp_filter,
};
use crate::format::{codec, pixel, profile};

/// Name reported by the software backend.
pub const SOFTWARE_IMPL_NAME: &str = "capdispatch-sw";

const API_VERSION: ApiVersion = ApiVersion::new(2, 9);
const INTEL_VENDOR_ID: u32 = 0x8086;

const FRAME_WIDTH: Range32 = Range32::new(16, 16384, 1);
const FRAME_HEIGHT: Range32 = Range32::new(16, 16384, 1);

/// CPU implementation covering AVC/HEVC/AV1/JPEG decode, HEVC/AV1/JPEG encode
/// and colour conversion plus scaling. Surfaces live in system memory only.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftwareBackend;

impl SoftwareBackend {
    /// Capability descriptor of the software backend.
    pub fn description() -> ImplDescription {
        ImplDescription {
            impl_type: impl_type::SOFTWARE,
            acceleration_mode: acceleration::NA,
            api_version: API_VERSION,
            impl_name: SOFTWARE_IMPL_NAME.to_string(),
            license: "MIT".to_string(),
            keywords: "CPU,software".to_string(),
            vendor_id: INTEL_VENDOR_ID,
            vendor_impl_id: 0,
            decoders: vec![
                decoder(
                    codec::AVC,
                    51,
                    &[
                        (profile::AVC_BASELINE, &[pixel::I420]),
                        (profile::AVC_MAIN, &[pixel::I420]),
                        (profile::AVC_HIGH, &[pixel::I420]),
                    ],
                ),
                decoder(
                    codec::HEVC,
                    186,
                    &[
                        (profile::HEVC_MAIN, &[pixel::I420]),
                        (profile::HEVC_MAIN10, &[pixel::I010]),
                    ],
                ),
                decoder(codec::AV1, 23, &[(profile::AV1_MAIN, &[pixel::I420, pixel::I010])]),
                decoder(
                    codec::JPEG,
                    0,
                    &[(profile::JPEG_BASELINE, &[pixel::I420, pixel::I422, pixel::BGRA])],
                ),
            ],
            encoders: vec![
                encoder(
                    codec::HEVC,
                    186,
                    1,
                    &[
                        (profile::HEVC_MAIN, &[pixel::I420]),
                        (profile::HEVC_MAIN10, &[pixel::I010]),
                    ],
                ),
                encoder(codec::AV1, 23, 1, &[(profile::AV1_MAIN, &[pixel::I420, pixel::I010])]),
                encoder(
                    codec::JPEG,
                    0,
                    0,
                    &[(profile::JPEG_BASELINE, &[pixel::I420, pixel::BGRA])],
                ),
            ],
            vpp_filters: vec![
                vpp(vpp_filter::COLOR_CONVERSION),
                vpp(vpp_filter::SCALING),
            ],
        }
    }
}

impl Backend for SoftwareBackend {
    fn name(&self) -> &str {
        SOFTWARE_IMPL_NAME
    }

    fn describe(&self) -> ImplDescription {
        Self::description()
    }
}

fn system_mem(color_formats: &[u32]) -> MemDesc {
    MemDesc {
        mem_handle_type: mem_handle::SYSTEM_SURFACE,
        width: FRAME_WIDTH,
        height: FRAME_HEIGHT,
        color_formats: color_formats.to_vec(),
    }
}

fn profiles(entries: &[(u32, &[u32])]) -> Vec<CodecProfileDesc> {
    entries
        .iter()
        .map(|&(profile, formats)| CodecProfileDesc {
            profile,
            mem_descs: vec![system_mem(formats)],
        })
        .collect()
}

fn decoder(codec_id: u32, max_codec_level: u16, entries: &[(u32, &[u32])]) -> DecoderDesc {
    DecoderDesc {
        codec_id,
        max_codec_level,
        profiles: profiles(entries),
    }
}

fn encoder(
    codec_id: u32,
    max_codec_level: u16,
    bidirectional_prediction: u16,
    entries: &[(u32, &[u32])],
) -> EncoderDesc {
    EncoderDesc {
        codec_id,
        max_codec_level,
        bidirectional_prediction,
        profiles: profiles(entries),
    }
}

fn vpp(filter_fourcc: u32) -> VppFilterDesc {
    let pairs: [(u32, &[u32]); 5] = [
        (pixel::I420, &[pixel::I420, pixel::I010, pixel::NV12, pixel::BGRA]),
        (pixel::I010, &[pixel::I010, pixel::I420, pixel::P010]),
        (pixel::NV12, &[pixel::NV12, pixel::I420, pixel::BGRA]),
        (pixel::P010, &[pixel::P010, pixel::I010, pixel::I420]),
        (pixel::BGRA, &[pixel::BGRA, pixel::I420, pixel::NV12]),
    ];
    VppFilterDesc {
        filter_fourcc,
        max_delay_in_frames: 0,
        mem_descs: vec![VppMemDesc {
            mem_handle_type: mem_handle::SYSTEM_SURFACE,
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            formats: pairs
                .iter()
                .map(|&(in_format, outs)| VppFormat {
                    in_format,
                    out_formats: outs.to_vec(),
                })
                .collect(),
        }],
    }
}
