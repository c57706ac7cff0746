//! Metrics collection using metrics-rs.

use crate::error::Status;
use crate::session::Domain;
use metrics::{Unit, counter, gauge};
use std::sync::atomic::{AtomicBool, Ordering};

/// Whether metrics have been initialized.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

// Metric names as constants for consistency
const LOADERS_CREATED: &str = "capdispatch_loaders_created";
const SESSIONS_CREATED: &str = "capdispatch_sessions_created";
const SESSIONS_CLOSED: &str = "capdispatch_sessions_closed";
const ENUMERATIONS: &str = "capdispatch_enumerations";
const DOMAIN_OPERATIONS: &str = "capdispatch_domain_operations";
const BACKENDS_LOADED: &str = "capdispatch_backends_loaded";
const BACKEND_LOAD_FAILURES: &str = "capdispatch_backend_load_failures";
const REGISTRY_SIZE: &str = "capdispatch_registry_size";

/// Initialize metrics descriptions.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    metrics::describe_counter!(LOADERS_CREATED, Unit::Count, "Loaders created");
    metrics::describe_counter!(
        SESSIONS_CREATED,
        Unit::Count,
        "Sessions bound to an implementation"
    );
    metrics::describe_counter!(SESSIONS_CLOSED, Unit::Count, "Sessions closed");
    metrics::describe_counter!(
        ENUMERATIONS,
        Unit::Count,
        "Implementation enumeration requests by outcome"
    );
    metrics::describe_counter!(
        DOMAIN_OPERATIONS,
        Unit::Count,
        "Encode/decode/vpp lifecycle calls by status"
    );
    metrics::describe_counter!(
        BACKENDS_LOADED,
        Unit::Count,
        "Backend libraries loaded at discovery"
    );
    metrics::describe_counter!(
        BACKEND_LOAD_FAILURES,
        Unit::Count,
        "Backend libraries rejected at discovery"
    );
    metrics::describe_gauge!(
        REGISTRY_SIZE,
        Unit::Count,
        "Implementations known to the registry"
    );
}

/// Record a new loader.
#[inline]
pub fn record_loader_created() {
    counter!(LOADERS_CREATED).increment(1);
}

/// Record a session bound through `path` (`dispatch` or `legacy`).
#[inline]
pub fn record_session_created(path: &'static str) {
    counter!(SESSIONS_CREATED, "path" => path).increment(1);
}

/// Record a closed session.
#[inline]
pub fn record_session_closed() {
    counter!(SESSIONS_CLOSED).increment(1);
}

/// Record an enumeration outcome.
#[inline]
pub fn record_enumeration(status: Status) {
    counter!(ENUMERATIONS, "status" => status.to_string()).increment(1);
}

/// Record a domain lifecycle call.
#[inline]
pub fn record_domain_operation(domain: Domain, operation: &'static str, status: Status) {
    counter!(
        DOMAIN_OPERATIONS,
        "domain" => domain.name(),
        "operation" => operation,
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a loaded backend library.
#[inline]
pub fn record_backend_loaded(name: &str) {
    counter!(BACKENDS_LOADED, "backend" => name.to_string()).increment(1);
}

/// Record a rejected backend library.
#[inline]
pub fn record_backend_load_failure() {
    counter!(BACKEND_LOAD_FAILURES).increment(1);
}

/// Record the number of registered implementations.
#[inline]
pub fn record_registry_size(size: usize) {
    gauge!(REGISTRY_SIZE).set(size as f64);
}
