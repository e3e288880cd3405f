use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;

use super::policy::RateLimitPolicy;

/// The request attributes an oracle may key on or inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFingerprint {
    pub client_address: String,
    pub user_agent: Option<String>,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DenyReason {
    None,
    /// The oracle's own anomaly detector flagged the request.
    Shielded,
    RateLimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub allowed: bool,
    pub deny_reason: DenyReason,
}

impl Verdict {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            deny_reason: DenyReason::None,
        }
    }

    pub fn deny(reason: DenyReason) -> Self {
        Self {
            allowed: false,
            deny_reason: reason,
        }
    }
}

/// Whether verdicts are enforced or only reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Live,
    /// Evaluate and log, but admit every request.
    Simulate,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Mode::Live),
            "simulate" | "dry_run" | "dry-run" => Ok(Mode::Simulate),
            other => Err(format!("unknown rate limit mode: {other}")),
        }
    }
}

/// External decision-maker for rate limiting. Implementations own their
/// counters and must be safe to call concurrently.
#[async_trait]
pub trait RateLimitOracle: Send + Sync {
    async fn evaluate(
        &self,
        fingerprint: &RequestFingerprint,
        policy: &RateLimitPolicy,
    ) -> CoreResult<Verdict>;
}
