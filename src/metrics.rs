//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::Once;

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Engagement Metrics
    pub static ref TOGGLES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("vidtube_toggles_total", "Total number of relation toggles"),
        &["relation", "transition"]
    ).expect("metric can be created");

    // View Metrics
    pub static ref VIEW_DEGRADATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "vidtube_view_degradations_total",
            "Composition steps that fell back to a default value"
        ),
        &["view", "step"]
    ).expect("metric can be created");

    // Store Metrics
    pub static ref STORE_TIMEOUTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("vidtube_store_timeouts_total", "Operations that exceeded their deadline"),
        &["operation"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("vidtube_errors_total", "Total number of error responses"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Initialize metrics registry.
///
/// Safe to call more than once; only the first call registers.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(TOGGLES_TOTAL.clone()))
            .expect("TOGGLES_TOTAL can be registered");
        REGISTRY
            .register(Box::new(VIEW_DEGRADATIONS_TOTAL.clone()))
            .expect("VIEW_DEGRADATIONS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(STORE_TIMEOUTS_TOTAL.clone()))
            .expect("STORE_TIMEOUTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}
