//! API layer
//!
//! HTTP handlers for:
//! - VidTube API v1 (videos, engagement, playlists, dashboard)
//! - Metrics (Prometheus)
//!
//! Every JSON response, success or failure, uses [`ApiResponse`].

mod dto;
pub mod metrics;
mod v1;

pub use dto::*;

pub use metrics::metrics_router;
pub use v1::v1_router;
