//! Observability features: metrics and tracing.
//!
//! - **Metrics**: counters and gauges via `metrics-rs`
//! - **Tracing**: structured logging and spans via `tracing`
//!
//! ## Metrics
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `capdispatch_loaders_created` | Counter | Loaders created |
//! | `capdispatch_sessions_created` | Counter | Sessions bound, by `path` |
//! | `capdispatch_sessions_closed` | Counter | Sessions closed |
//! | `capdispatch_enumerations` | Counter | Enumerations, by `status` |
//! | `capdispatch_domain_operations` | Counter | Domain calls, by `domain`, `operation`, `status` |
//! | `capdispatch_backends_loaded` | Counter | Backend libraries loaded |
//! | `capdispatch_backend_load_failures` | Counter | Backend libraries rejected |
//! | `capdispatch_registry_size` | Gauge | Registered implementations |
//!
//! ## Tracing
//!
//! Spans are emitted for loader operations and for each domain lifecycle
//! call. No subscriber is installed by the crate.

mod metrics;
mod tracing_support;

pub use metrics::{
    init_metrics, record_backend_load_failure, record_backend_loaded, record_domain_operation,
    record_enumeration, record_loader_created, record_registry_size, record_session_closed,
    record_session_created,
};
pub use tracing_support::{span_loader, span_session_domain};
