//! Per-domain lifecycle state machine.

use super::Domain;
use super::params::VideoParam;
use super::validate::{check_reset, validate};
use crate::caps::ImplDescription;
use crate::error::{Error, Result, Status};

/// Lifecycle state of one domain.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ContextState {
    /// Never initialized.
    #[default]
    Uninitialized,
    /// Initialized with the effective parameters.
    Initialized(VideoParam),
    /// Closed after being initialized. A fresh init is accepted.
    Closed,
}

/// State machine for one of Encode, Decode or VPP.
///
/// ```text
/// Uninitialized --init--> Initialized --close--> Closed
///                          |    ^                  |
///                          reset                   init
/// ```
#[derive(Debug, Clone)]
pub struct DomainContext {
    domain: Domain,
    state: ContextState,
}

impl DomainContext {
    /// Create an uninitialized context.
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            state: ContextState::Uninitialized,
        }
    }

    /// Domain this context drives.
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Current state.
    pub fn state(&self) -> &ContextState {
        &self.state
    }

    /// Whether the context is initialized.
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, ContextState::Initialized(_))
    }

    /// Validate `params` and enter the initialized state.
    ///
    /// On error the context is left unchanged.
    pub fn init(&mut self, desc: &ImplDescription, params: &VideoParam) -> Result<Status> {
        if self.is_initialized() {
            return Err(Error::AlreadyInitialized(self.domain));
        }
        let validated = validate(self.domain, desc, params)?;
        self.state = ContextState::Initialized(validated.params);
        Ok(validated.status)
    }

    /// Replace the effective parameters of an initialized context.
    pub fn reset(&mut self, desc: &ImplDescription, params: &VideoParam) -> Result<Status> {
        let ContextState::Initialized(current) = &self.state else {
            return Err(Error::NotInitialized(self.domain));
        };
        check_reset(self.domain, current, params)?;
        let validated = validate(self.domain, desc, params)?;
        self.state = ContextState::Initialized(validated.params);
        Ok(validated.status)
    }

    /// Effective parameters.
    pub fn video_param(&self) -> Result<&VideoParam> {
        match &self.state {
            ContextState::Initialized(params) => Ok(params),
            _ => Err(Error::NotInitialized(self.domain)),
        }
    }

    /// Leave the initialized state.
    pub fn close(&mut self) -> Result<()> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized(self.domain));
        }
        self.state = ContextState::Closed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SoftwareBackend;
    use crate::format::{chroma, codec, pixel};
    use crate::session::params::{FrameInfo, IoPattern};

    fn jpeg_encode() -> VideoParam {
        let mut params = VideoParam {
            io_pattern: IoPattern::IN_SYSTEM_MEMORY,
            ..Default::default()
        };
        params.mfx.codec_id = codec::JPEG;
        params.mfx.frame_info = FrameInfo {
            fourcc: pixel::I420,
            chroma_format: chroma::YUV420,
            width: 128,
            height: 96,
            crop_w: 128,
            crop_h: 96,
            frame_rate_ext_n: 30,
            frame_rate_ext_d: 1,
            ..Default::default()
        };
        params
    }

    #[test]
    fn test_lifecycle() {
        let desc = SoftwareBackend::description();
        let mut ctx = DomainContext::new(Domain::Encode);
        assert_eq!(ctx.state(), &ContextState::Uninitialized);

        assert_eq!(ctx.init(&desc, &jpeg_encode()), Ok(Status::None));
        assert!(ctx.is_initialized());
        assert_eq!(ctx.reset(&desc, &jpeg_encode()), Ok(Status::None));
        assert_eq!(ctx.video_param().unwrap().mfx.frame_info.width, 128);

        assert_eq!(ctx.close(), Ok(()));
        assert_eq!(ctx.state(), &ContextState::Closed);
        assert_eq!(ctx.close(), Err(Error::NotInitialized(Domain::Encode)));
    }

    #[test]
    fn test_double_init_keeps_first_params() {
        let desc = SoftwareBackend::description();
        let mut ctx = DomainContext::new(Domain::Encode);
        ctx.init(&desc, &jpeg_encode()).unwrap();

        let mut second = jpeg_encode();
        second.mfx.frame_info.width = 64;
        assert_eq!(
            ctx.init(&desc, &second),
            Err(Error::AlreadyInitialized(Domain::Encode))
        );
        assert_eq!(ctx.video_param().unwrap().mfx.frame_info.width, 128);
    }

    #[test]
    fn test_uninitialized_calls() {
        let desc = SoftwareBackend::description();
        let mut ctx = DomainContext::new(Domain::Decode);
        assert_eq!(
            ctx.reset(&desc, &VideoParam::default()),
            Err(Error::NotInitialized(Domain::Decode))
        );
        assert!(ctx.video_param().is_err());
        assert!(ctx.close().is_err());
    }

    #[test]
    fn test_failed_init_leaves_state() {
        let desc = SoftwareBackend::description();
        let mut ctx = DomainContext::new(Domain::Encode);
        let mut bad = jpeg_encode();
        bad.io_pattern = IoPattern::IN_VIDEO_MEMORY;
        assert!(ctx.init(&desc, &bad).is_err());
        assert_eq!(ctx.state(), &ContextState::Uninitialized);
    }

    #[test]
    fn test_reinit_after_close() {
        let desc = SoftwareBackend::description();
        let mut ctx = DomainContext::new(Domain::Encode);
        ctx.init(&desc, &jpeg_encode()).unwrap();
        ctx.close().unwrap();
        assert_eq!(ctx.init(&desc, &jpeg_encode()), Ok(Status::None));
    }

    #[test]
    fn test_failed_reset_keeps_params() {
        let desc = SoftwareBackend::description();
        let mut ctx = DomainContext::new(Domain::Encode);
        ctx.init(&desc, &jpeg_encode()).unwrap();
        let mut bad = jpeg_encode();
        bad.io_pattern = IoPattern::IN_VIDEO_MEMORY;
        assert!(matches!(
            ctx.reset(&desc, &bad),
            Err(Error::InvalidVideoParam(_))
        ));
        assert_eq!(
            ctx.video_param().unwrap().io_pattern,
            IoPattern::IN_SYSTEM_MEMORY
        );
    }
}
