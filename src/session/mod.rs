//! Sessions and their Encode/Decode/VPP domain contexts.
//!
//! A [`Session`] is bound to exactly one capability descriptor when it is
//! created. Each domain runs its own [`DomainContext`] state machine and
//! validates parameters against that descriptor.
//!
//! # Example
//!
//! ```rust,ignore
//! use capdispatch::prelude::*;
//!
//! let mut loader = Loader::new();
//! let mut session = loader.create_session(0)?;
//! session.init(Domain::Decode, &params)?;
//! let effective = session.video_param(Domain::Decode)?;
//! session.close();
//! ```

pub mod context;
pub mod params;
pub mod validate;

pub use context::{ContextState, DomainContext};
pub use params::{
    CodecParams, FrameInfo, IoPattern, IoSide, MemoryClass, VideoParam, VppParams, pic_struct,
    rate_control, target_usage,
};

use crate::caps::{ApiVersion, ImplDescription};
use crate::error::{Error, Result, Status};
use crate::observability;
use crate::registry::{ImplementationRegistry, LegacyImpl};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Processing domains hosted by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Raw frames to bitstream.
    Encode,
    /// Bitstream to raw frames.
    Decode,
    /// Raw frames to raw frames (conversion, scaling).
    Vpp,
}

impl Domain {
    /// All domains.
    pub const ALL: [Domain; 3] = [Domain::Encode, Domain::Decode, Domain::Vpp];

    /// Lowercase name used in logs and metric labels.
    pub fn name(self) -> &'static str {
        match self {
            Domain::Encode => "encode",
            Domain::Decode => "decode",
            Domain::Vpp => "vpp",
        }
    }

    fn index(self) -> usize {
        match self {
            Domain::Encode => 0,
            Domain::Decode => 1,
            Domain::Vpp => 2,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A caller's binding to one implementation.
pub struct Session {
    id: u64,
    description: Arc<ImplDescription>,
    impl_index: usize,
    contexts: [DomainContext; 3],
}

impl Session {
    pub(crate) fn bind(description: Arc<ImplDescription>, impl_index: usize) -> Self {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            session = id,
            impl_name = %description.impl_name,
            impl_index,
            "session bound"
        );
        Self {
            id,
            description,
            impl_index,
            contexts: Domain::ALL.map(DomainContext::new),
        }
    }

    /// Open a session without a loader, selecting by implementation type.
    ///
    /// Returns [`Error::Unsupported`] when no registered implementation has
    /// the requested type at or above `version`.
    pub fn open_legacy(
        registry: &ImplementationRegistry,
        kind: LegacyImpl,
        version: ApiVersion,
    ) -> Result<Self> {
        let (index, description) = registry.select_legacy(kind, version).ok_or_else(|| {
            Error::Unsupported(format!("no {kind:?} implementation for api {version}"))
        })?;
        observability::record_session_created("legacy");
        Ok(Self::bind(description.clone(), index))
    }

    /// Process-unique session id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Descriptor this session is bound to.
    pub fn description(&self) -> &Arc<ImplDescription> {
        &self.description
    }

    /// Registry index of the bound implementation.
    pub fn impl_index(&self) -> usize {
        self.impl_index
    }

    /// Context of one domain.
    pub fn context(&self, domain: Domain) -> &DomainContext {
        &self.contexts[domain.index()]
    }

    /// Whether `domain` is initialized.
    pub fn is_initialized(&self, domain: Domain) -> bool {
        self.context(domain).is_initialized()
    }

    /// Initialize a domain.
    ///
    /// Returns a warning status when parameters were corrected.
    pub fn init(&mut self, domain: Domain, params: &VideoParam) -> Result<Status> {
        self.run(domain, "init", |ctx, desc| ctx.init(desc, params))
    }

    /// Reset an initialized domain with new parameters.
    pub fn reset(&mut self, domain: Domain, params: &VideoParam) -> Result<Status> {
        self.run(domain, "reset", |ctx, desc| ctx.reset(desc, params))
    }

    /// Effective parameters of an initialized domain.
    pub fn video_param(&self, domain: Domain) -> Result<&VideoParam> {
        self.context(domain).video_param()
    }

    /// Close one domain.
    pub fn close_domain(&mut self, domain: Domain) -> Result<()> {
        self.run(domain, "close", |ctx, _| ctx.close().map(|()| Status::None))
            .map(|_| ())
    }

    /// Close every initialized domain and end the session.
    ///
    /// Returns the number of domains that were closed.
    pub fn close(mut self) -> usize {
        let mut closed = 0;
        for domain in Domain::ALL {
            if self.is_initialized(domain) && self.close_domain(domain).is_ok() {
                closed += 1;
            }
        }
        tracing::debug!(session = self.id, closed, "session closed");
        observability::record_session_closed();
        closed
    }

    fn run(
        &mut self,
        domain: Domain,
        operation: &'static str,
        f: impl FnOnce(&mut DomainContext, &ImplDescription) -> Result<Status>,
    ) -> Result<Status> {
        let span = observability::span_session_domain(self.id, domain, operation);
        let _guard = span.enter();

        let result = f(&mut self.contexts[domain.index()], &self.description);
        let status = match &result {
            Ok(status) => *status,
            Err(e) => e.status(),
        };
        observability::record_domain_operation(domain, operation, status);
        match &result {
            Ok(status) => tracing::debug!(%domain, operation, %status, "domain call complete"),
            Err(e) => tracing::warn!(%domain, operation, error = %e, "domain call rejected"),
        }
        result
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("impl_name", &self.description.impl_name)
            .field("impl_index", &self.impl_index)
            .field(
                "initialized",
                &Domain::ALL
                    .iter()
                    .filter(|d| self.is_initialized(**d))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SoftwareBackend;
    use crate::format::{chroma, codec, pixel};

    fn session() -> Session {
        Session::bind(Arc::new(SoftwareBackend::description()), 0)
    }

    fn hevc_decode() -> VideoParam {
        let mut params = VideoParam {
            io_pattern: IoPattern::OUT_SYSTEM_MEMORY,
            ..Default::default()
        };
        params.mfx.codec_id = codec::HEVC;
        params.mfx.frame_info = FrameInfo {
            fourcc: pixel::I420,
            chroma_format: chroma::YUV420,
            width: 128,
            height: 96,
            crop_w: 128,
            crop_h: 96,
            ..Default::default()
        };
        params
    }

    #[test]
    fn test_domain_names() {
        assert_eq!(Domain::Encode.to_string(), "encode");
        assert_eq!(Domain::Vpp.name(), "vpp");
        assert_eq!(Domain::ALL.len(), 3);
    }

    #[test]
    fn test_domains_are_independent() {
        let mut s = session();
        assert_eq!(s.init(Domain::Decode, &hevc_decode()), Ok(Status::None));
        assert!(s.is_initialized(Domain::Decode));
        assert!(!s.is_initialized(Domain::Encode));
        assert_eq!(
            s.close_domain(Domain::Encode),
            Err(Error::NotInitialized(Domain::Encode))
        );
        assert_eq!(
            s.video_param(Domain::Decode).unwrap().mfx.codec_id,
            codec::HEVC
        );
    }

    #[test]
    fn test_close_counts_initialized_domains() {
        let mut s = session();
        s.init(Domain::Decode, &hevc_decode()).unwrap();
        assert_eq!(s.close(), 1);
        assert_eq!(session().close(), 0);
    }

    #[test]
    fn test_session_ids_unique() {
        assert_ne!(session().id(), session().id());
    }

    #[test]
    fn test_open_legacy() {
        let registry = ImplementationRegistry::from_descriptions([SoftwareBackend::description()]);
        let s = Session::open_legacy(&registry, LegacyImpl::Software, ApiVersion::new(2, 0))
            .unwrap();
        assert!(s.description().is_software());
        assert_eq!(s.impl_index(), 0);

        let err = Session::open_legacy(&registry, LegacyImpl::Hardware, ApiVersion::default())
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
        assert!(
            Session::open_legacy(&registry, LegacyImpl::Auto, ApiVersion::new(3, 0)).is_err()
        );
    }
}
