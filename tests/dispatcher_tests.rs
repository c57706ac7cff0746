//! Integration tests for loader, config and enumeration calls.
//!
//! These drive the handle-based surface in `capdispatch::api` against a
//! registry holding only the built-in software backend, so results do not
//! depend on what is installed on the host.

use capdispatch::api;
use capdispatch::backend::SoftwareBackend;
use capdispatch::handle::{ConfigHandle, ImplDescriptionHandle, LoaderHandle, SessionHandle};
use capdispatch::prelude::*;
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// Helpers
// ============================================================================

const IMPL: &str = "ImplDescription.Impl";
const DECODER_CODEC: &str = "ImplDescription.DecoderDescription.decoder.CodecID";
const ENCODER_CODEC: &str = "ImplDescription.EncoderDescription.encoder.CodecID";
const VPP_IN: &str = "ImplDescription.VPPDescription.filter.memdesc.format.InFormat";
const VPP_OUT: &str = "ImplDescription.VPPDescription.filter.memdesc.format.OutFormat";

fn software_registry() -> Arc<ImplementationRegistry> {
    Arc::new(ImplementationRegistry::from_descriptions([
        SoftwareBackend::description(),
    ]))
}

fn software_loader() -> LoaderHandle {
    api::load_with_registry(software_registry()).expect("loader table exhausted")
}

fn config_with(loader: LoaderHandle, name: &str, value: impl Into<Variant>) -> ConfigHandle {
    let config = api::create_config(Some(loader)).expect("config");
    assert_eq!(
        api::set_config_filter_property(Some(config), Some(name), value.into()),
        Status::None
    );
    config
}

fn enumerate(loader: LoaderHandle, index: u32) -> (Status, Option<ImplDescriptionHandle>) {
    let mut desc = None;
    let status = api::enum_implementations(
        Some(loader),
        index,
        ImplCapsFormat::ImplDescStructure,
        Some(&mut desc),
    );
    (status, desc)
}

fn open_session(loader: LoaderHandle, index: u32) -> (Status, Option<SessionHandle>) {
    let mut session = None;
    let status = api::create_session(Some(loader), index, Some(&mut session));
    (status, session)
}

// ============================================================================
// Load and config
// ============================================================================

#[test]
fn test_load_returns_loader() {
    let loader = software_loader();
    assert_eq!(api::unload(Some(loader)), Status::None);
}

#[test]
fn test_unload_null_loader() {
    assert_eq!(api::unload(None), Status::InvalidHandle);
}

#[test]
fn test_create_config_null_loader() {
    assert_eq!(api::create_config(None), None);
}

#[test]
fn test_set_property_impl_type() {
    let loader = software_loader();
    config_with(loader, IMPL, impl_type::SOFTWARE);
    assert_eq!(api::unload(Some(loader)), Status::None);
}

#[test]
fn test_set_property_null_arguments() {
    let loader = software_loader();
    let config = api::create_config(Some(loader));
    assert_eq!(
        api::set_config_filter_property(None, Some(IMPL), impl_type::SOFTWARE.into()),
        Status::NullPtr
    );
    assert_eq!(
        api::set_config_filter_property(config, None, impl_type::SOFTWARE.into()),
        Status::NullPtr
    );
    api::unload(Some(loader));
}

#[test]
fn test_set_property_unknown_path() {
    let loader = software_loader();
    let config = api::create_config(Some(loader));
    assert_eq!(
        api::set_config_filter_property(
            config,
            Some("ImplDescription.Unknown"),
            impl_type::SOFTWARE.into()
        ),
        Status::NotFound
    );
    // Interior nodes are not filterable on their own.
    assert_eq!(
        api::set_config_filter_property(config, Some("ImplDescription"), 0u32.into()),
        Status::NotFound
    );
    api::unload(Some(loader));
}

#[test]
fn test_set_property_kind_mismatch() {
    let loader = software_loader();
    let config = api::create_config(Some(loader));
    assert_eq!(
        api::set_config_filter_property(config, Some(IMPL), Variant::U8(1)),
        Status::Unsupported
    );
    api::unload(Some(loader));
}

#[test]
fn test_out_of_range_value_accepted_then_unmatched() {
    let loader = software_loader();
    config_with(loader, IMPL, 9999u32);

    let (status, desc) = enumerate(loader, 0);
    assert_eq!(status, Status::NotFound);
    assert_eq!(desc, None);

    let (status, session) = open_session(loader, 0);
    assert_eq!(status, Status::NotFound);
    assert_eq!(session, None);
    api::unload(Some(loader));
}

// ============================================================================
// Enumeration
// ============================================================================

#[test]
fn test_enumerate_software_description() {
    let loader = software_loader();
    config_with(loader, IMPL, impl_type::SOFTWARE);

    let (status, desc) = enumerate(loader, 0);
    assert_eq!(status, Status::None);
    let desc = desc.unwrap();
    let described = api::query_impl_description(desc).unwrap();
    assert_eq!(described.impl_type, impl_type::SOFTWARE);

    assert_eq!(
        api::disp_release_impl_description(Some(loader), Some(desc)),
        Status::None
    );
    assert_eq!(api::query_impl_description(desc), None);
    assert_eq!(
        api::disp_release_impl_description(Some(loader), Some(desc)),
        Status::InvalidHandle
    );
    api::unload(Some(loader));
}

#[test]
fn test_enumerate_null_arguments() {
    let loader = software_loader();
    let mut desc = None;
    assert_eq!(
        api::enum_implementations(None, 0, ImplCapsFormat::ImplDescStructure, Some(&mut desc)),
        Status::NullPtr
    );
    assert_eq!(
        api::enum_implementations(Some(loader), 0, ImplCapsFormat::ImplDescStructure, None),
        Status::NullPtr
    );
    api::unload(Some(loader));
}

#[test]
fn test_enumerate_index_out_of_range() {
    let loader = software_loader();
    config_with(loader, IMPL, impl_type::SOFTWARE);
    let (status, desc) = enumerate(loader, 999_999);
    assert_eq!(status, Status::NotFound);
    assert_eq!(desc, None);
    api::unload(Some(loader));
}

#[test]
fn test_enumerate_path() {
    let loader = software_loader();
    let mut desc = None;
    assert_eq!(
        api::enum_implementations(Some(loader), 0, ImplCapsFormat::ImplPath, Some(&mut desc)),
        Status::None
    );
    let desc = desc.unwrap();
    assert_eq!(api::query_impl_path(desc).as_deref(), Some(Path::new("<injected>")));
    assert_eq!(api::query_impl_description(desc), None);
    assert_eq!(
        api::disp_release_impl_description(Some(loader), Some(desc)),
        Status::None
    );
    api::unload(Some(loader));
}

#[test]
fn test_enumerate_implemented_functions_unsupported() {
    let loader = software_loader();
    let mut desc = None;
    assert_eq!(
        api::enum_implementations(
            Some(loader),
            0,
            ImplCapsFormat::ImplementedFunctions,
            Some(&mut desc)
        ),
        Status::Unsupported
    );
    assert_eq!(desc, None);
    api::unload(Some(loader));
}

#[test]
fn test_release_through_wrong_loader() {
    let owner = software_loader();
    let other = software_loader();
    let (_, desc) = enumerate(owner, 0);
    let desc = desc.unwrap();

    assert_eq!(
        api::disp_release_impl_description(Some(other), Some(desc)),
        Status::InvalidHandle
    );
    assert_eq!(
        api::disp_release_impl_description(Some(owner), Some(desc)),
        Status::None
    );
    api::unload(Some(owner));
    api::unload(Some(other));
}

// ============================================================================
// Filter composition
// ============================================================================

#[test]
fn test_decoders_across_two_configs_match() {
    let loader = software_loader();
    config_with(loader, DECODER_CODEC, codec::AVC);
    config_with(loader, DECODER_CODEC, codec::HEVC);

    let (status, session) = open_session(loader, 0);
    assert_eq!(status, Status::None);
    assert_eq!(api::close(session), Status::None);
    api::unload(Some(loader));
}

#[test]
fn test_unoffered_codecs_do_not_match() {
    let cases = [
        (DECODER_CODEC, codec::AV1, Some((DECODER_CODEC, codec::VP9))),
        (DECODER_CODEC, codec::MPEG2, None),
        (ENCODER_CODEC, codec::VP9, None),
        (DECODER_CODEC, codec::VP9, None),
    ];
    for (name, value, extra) in cases {
        let loader = software_loader();
        config_with(loader, name, value);
        if let Some((name, value)) = extra {
            config_with(loader, name, value);
        }
        let (status, session) = open_session(loader, 0);
        assert_eq!(status, Status::NotFound, "{name} = {value:#x}");
        assert_eq!(session, None);
        api::unload(Some(loader));
    }
}

#[test]
fn test_vpp_format_pair_matches() {
    let loader = software_loader();
    config_with(loader, VPP_IN, pixel::I010);
    config_with(loader, VPP_OUT, pixel::I420);

    let (status, session) = open_session(loader, 0);
    assert_eq!(status, Status::None);
    api::close(session);
    api::unload(Some(loader));
}

#[test]
fn test_loaders_do_not_share_filters() {
    let strict = software_loader();
    let open = software_loader();
    config_with(strict, DECODER_CODEC, codec::MPEG2);

    assert_eq!(enumerate(strict, 0).0, Status::NotFound);
    let (status, desc) = enumerate(open, 0);
    assert_eq!(status, Status::None);
    api::disp_release_impl_description(Some(open), desc);

    api::unload(Some(strict));
    api::unload(Some(open));
}

#[test]
fn test_config_after_unload_is_stale() {
    let loader = software_loader();
    let config = config_with(loader, IMPL, impl_type::SOFTWARE);
    let (_, desc) = enumerate(loader, 0);
    assert_eq!(api::unload(Some(loader)), Status::None);

    assert_eq!(
        api::set_config_filter_property(Some(config), Some(IMPL), impl_type::SOFTWARE.into()),
        Status::InvalidHandle
    );
    assert_eq!(api::query_impl_description(desc.unwrap()), None);
    assert_eq!(api::unload(Some(loader)), Status::InvalidHandle);
}

// ============================================================================
// Sessions
// ============================================================================

#[test]
fn test_sessions_from_two_loaders() {
    let first = software_loader();
    let second = software_loader();
    config_with(first, IMPL, impl_type::SOFTWARE);
    config_with(second, IMPL, impl_type::SOFTWARE);

    let (status, a) = open_session(first, 0);
    assert_eq!(status, Status::None);
    let (status, b) = open_session(second, 0);
    assert_eq!(status, Status::None);
    assert_ne!(a, b);

    assert_eq!(api::close(a), Status::None);
    assert_eq!(api::close(b), Status::None);
    assert_eq!(api::close(a), Status::InvalidHandle);
    api::unload(Some(first));
    api::unload(Some(second));
}

#[test]
fn test_session_outlives_loader() {
    let loader = software_loader();
    let (_, session) = open_session(loader, 0);
    api::unload(Some(loader));

    let desc = api::session_impl_description(session).unwrap();
    assert!(desc.is_software());
    assert_eq!(api::close(session), Status::None);
}

#[test]
fn test_legacy_init_software() {
    let mut session = None;
    assert_eq!(
        api::init(LegacyImpl::Software, ApiVersion::new(0, 0), Some(&mut session)),
        Status::None
    );
    assert!(session.is_some());
    assert_eq!(api::close(session), Status::None);
    assert_eq!(
        api::init(LegacyImpl::Software, ApiVersion::new(0, 0), None),
        Status::NullPtr
    );
}

#[test]
fn test_legacy_open_without_hardware() {
    let registry = software_registry();
    let err = Session::open_legacy(&registry, LegacyImpl::Hardware, ApiVersion::new(0, 0))
        .unwrap_err();
    assert_eq!(err.status(), Status::Unsupported);

    let session = Session::open_legacy(&registry, LegacyImpl::Auto, ApiVersion::new(2, 0)).unwrap();
    assert!(session.description().is_software());

    let too_new = Session::open_legacy(&registry, LegacyImpl::Auto, ApiVersion::new(99, 0));
    assert!(too_new.is_err());
}

// ============================================================================
// Typed API
// ============================================================================

#[test]
fn test_typed_loader_matches_handle_surface() {
    let mut loader = Loader::with_registry(software_registry());
    let config = loader.create_config();
    loader
        .set_filter_property(config, DECODER_CODEC, codec::HEVC)
        .unwrap();
    loader
        .set_filter_property(config, "ImplDescription.ApiVersion.Major", 2u16)
        .unwrap();
    assert_eq!(loader.matching().count(), 1);

    let err = loader
        .set_filter_property(config, IMPL, "software")
        .unwrap_err();
    assert_eq!(err.status(), Status::Unsupported);

    let session = loader.create_session(0).unwrap();
    assert_eq!(session.impl_index(), 0);
    assert_eq!(session.close(), 0);
}
