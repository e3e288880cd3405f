//! Per-IP throttling of the credential endpoints and client fingerprinting
//! for the role-based rate-limit stage.
//!
//! Sign-in and sign-up sit behind a `tower_governor` limiter sized by
//! `rate_limit.login_requests_per_minute` (default: 5). Everything else is
//! metered by the pipeline's [`RateLimitOracle`](acquisitions_core::RateLimitOracle),
//! which identifies callers through [`fingerprint`].
//!
//! Forwarding headers are client-controlled. Both limiters key on the socket
//! peer unless `rate_limit.trust_proxy_headers` says a proxy in front of us
//! rewrites them.

use std::net::SocketAddr;
use std::sync::Arc;

use acquisitions_core::RequestFingerprint;
use axum::extract::{ConnectInfo, OriginalUri};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum::Router;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor};
use tower_governor::GovernorLayer;

use crate::state::AppState;

/// Wraps `router` in the per-IP login limiter. The socket peer is the key
/// unless `trust_proxy` allows the forwarding headers.
pub fn with_login_limit(
    router: Router<AppState>,
    rpm: u32,
    trust_proxy: bool,
) -> anyhow::Result<Router<AppState>> {
    let rpm = rpm.max(1);
    let period_per_request = (60 / rpm).max(1);
    let invalid = || anyhow::anyhow!("invalid login rate limit ({rpm} requests per minute)");

    let mut builder = GovernorConfigBuilder::default();
    builder.per_second(period_per_request.into()).burst_size(rpm);

    let router = if trust_proxy {
        let config = builder.key_extractor(SmartIpKeyExtractor).finish().ok_or_else(invalid)?;
        router.layer(GovernorLayer::<_, _, axum::body::Body>::new(Arc::new(config)))
    } else {
        let config = builder.key_extractor(PeerIpKeyExtractor).finish().ok_or_else(invalid)?;
        router.layer(GovernorLayer::<_, _, axum::body::Body>::new(Arc::new(config)))
    };
    Ok(router)
}

/// Client address used as the rate-limit key. With `trust_proxy` set the first
/// `X-Forwarded-For` hop wins, then `X-Real-IP`; the socket peer is used
/// otherwise.
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let peer_ip = || peer.map(|addr| addr.ip().to_string());
    if !trust_proxy {
        return peer_ip().unwrap_or_else(|| "unknown".to_string());
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .map(str::to_string)
        .or_else(peer_ip)
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn fingerprint(parts: &Parts, trust_proxy: bool) -> RequestFingerprint {
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    // Nested routers see a stripped path.
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri)
        .unwrap_or(&parts.uri);

    RequestFingerprint {
        client_address: client_address(&parts.headers, peer, trust_proxy),
        user_agent: parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        method: parts.method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
    }
}
