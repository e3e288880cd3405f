use std::collections::VecDeque;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::CoreResult;

use super::oracle::{DenyReason, Mode, RateLimitOracle, RequestFingerprint, Verdict};
use super::policy::RateLimitPolicy;
use super::shield;

/// In-process oracle keeping a sliding log of admitted requests per
/// `(policy, client address)`.
///
/// A request is admitted while fewer than `max_requests` admissions fall
/// inside the trailing window. Denied requests are not logged, so a
/// client that keeps hammering does not extend its own lockout.
pub struct SlidingWindowOracle {
    mode: Mode,
    log: DashMap<String, VecDeque<Instant>>,
}

impl SlidingWindowOracle {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            log: DashMap::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Evaluates one request as if it arrived at `now`.
    pub fn evaluate_at(
        &self,
        fingerprint: &RequestFingerprint,
        policy: &RateLimitPolicy,
        now: Instant,
    ) -> Verdict {
        let verdict = self.decide(fingerprint, policy, now);
        match self.mode {
            Mode::Live => verdict,
            Mode::Simulate => {
                if !verdict.allowed {
                    tracing::warn!(
                        policy = policy.name,
                        client_address = %fingerprint.client_address,
                        path = %fingerprint.path,
                        reason = ?verdict.deny_reason,
                        "simulate mode: request would have been denied"
                    );
                }
                Verdict::allow()
            }
        }
    }

    fn decide(
        &self,
        fingerprint: &RequestFingerprint,
        policy: &RateLimitPolicy,
        now: Instant,
    ) -> Verdict {
        if let Some(threat) = shield::inspect(fingerprint) {
            tracing::debug!(threat = threat.as_str(), path = %fingerprint.path, "shield matched");
            return Verdict::deny(DenyReason::Shielded);
        }

        let key = format!("{}:{}", policy.name, fingerprint.client_address);
        let mut hits = self.log.entry(key).or_default();
        prune(&mut hits, now, policy.window);

        if hits.len() >= policy.max_requests as usize {
            return Verdict::deny(DenyReason::RateLimited);
        }
        hits.push_back(now);
        Verdict::allow()
    }

    /// Drops logs with no admissions inside `window` of `now`.
    pub fn purge(&self, now: Instant, window: Duration) {
        self.log.retain(|_, hits| {
            prune(hits, now, window);
            !hits.is_empty()
        });
    }

    pub fn tracked_clients(&self) -> usize {
        self.log.len()
    }
}

fn prune(hits: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = hits.front() {
        if now.duration_since(*oldest) >= window {
            hits.pop_front();
        } else {
            break;
        }
    }
}

#[async_trait]
impl RateLimitOracle for SlidingWindowOracle {
    async fn evaluate(
        &self,
        fingerprint: &RequestFingerprint,
        policy: &RateLimitPolicy,
    ) -> CoreResult<Verdict> {
        Ok(self.evaluate_at(fingerprint, policy, Instant::now()))
    }
}
