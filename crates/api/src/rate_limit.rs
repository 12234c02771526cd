//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Per-IP limits on the REST routes via tower_governor. Requires the server to
//! run with `into_make_service_with_connect_info::<SocketAddr>()`.

use governor::middleware::StateInformationMiddleware;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

use crate::ApiError;

/// Governor config keyed by peer IP, with X-RateLimit-* headers
pub type DashboardGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Seconds to replenish one request
    pub per_second: u64,
    /// Requests that can be made immediately
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // Burst of 20, then one request per second per client IP
        Self {
            per_second: 1,
            burst_size: 20,
        }
    }
}

/// Build the governor config shared by every rate-limited route
pub fn create_governor_config(
    config: &RateLimitConfig,
) -> Result<Arc<DashboardGovernorConfig>, ApiError> {
    GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .map(Arc::new)
        .ok_or_else(|| {
            ApiError::InvalidSettings(format!(
                "rate limit needs non-zero values, got per_second={} burst_size={}",
                config.per_second, config.burst_size
            ))
        })
}
