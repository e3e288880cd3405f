//! Request admission.
//!
//! Every routed request runs the same ordered stages: authentication (when
//! the route requires it), role resolution, policy selection, the rate-limit
//! oracle, and finally authorization. Each stage takes the
//! [`RequestContext`] by value and either hands it on or rejects with an
//! [`AppError`]; nothing runs after the first rejection.
//!
//! [`admit`] covers everything up to route-independent authorization and is
//! layered over whole routers. Role requirements that only apply to single
//! routes are expressed with [`guard`], which picks the context back up from
//! the request extensions.

use acquisitions_core::{
    require_any_role, require_role, AuthFailure, DenyReason, Identity, RateLimitPolicy,
    RequestFingerprint, Role,
};
use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::middleware::authenticate;
use crate::error::AppError;
use crate::middleware::rate_limit::fingerprint;
use crate::state::AppState;

/// What a router requires of callers before any route-specific checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
}

/// A route-level role requirement, checked after admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Role(Role),
    AnyRole(&'static [Role]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Unauthenticated,
    Authenticating,
    Authenticated,
    PolicySelecting,
    RateLimiting,
    AuthorizationChecking,
    Admitted,
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub stage: Stage,
    pub fingerprint: RequestFingerprint,
    pub identity: Option<Identity>,
    /// The caller's role, `Guest` until authentication says otherwise.
    pub role: Role,
    pub policy: Option<RateLimitPolicy>,
}

impl RequestContext {
    pub fn new(fingerprint: RequestFingerprint) -> Self {
        Self {
            stage: Stage::Unauthenticated,
            fingerprint,
            identity: None,
            role: Role::Guest,
            policy: None,
        }
    }

    fn enter(&mut self, stage: Stage) {
        tracing::trace!(
            from = ?self.stage,
            to = ?stage,
            path = %self.fingerprint.path,
            "pipeline stage"
        );
        self.stage = stage;
    }

    fn log_denial(&self, message: &str) {
        let fp = &self.fingerprint;
        tracing::warn!(
            client_address = %fp.client_address,
            user_agent = fp.user_agent.as_deref().unwrap_or("-"),
            path = %fp.path,
            method = %fp.method,
            role = %self.role,
            policy = self.policy.as_ref().map(|p| p.name).unwrap_or("-"),
            "{message}"
        );
    }
}

#[derive(Clone)]
pub struct Gate {
    state: AppState,
    access: Access,
}

impl Gate {
    pub fn new(state: AppState, access: Access) -> Self {
        Self { state, access }
    }

    pub async fn run(&self, parts: &Parts) -> Result<RequestContext, AppError> {
        let ctx = RequestContext::new(fingerprint(
            parts,
            self.state.config.rate_limit.trust_proxy_headers,
        ));
        let ctx = self.authenticate(ctx, parts).await?;
        let ctx = self.select_policy(ctx);
        let ctx = self.rate_limit(ctx).await?;
        self.authorize(ctx)
    }

    async fn authenticate(
        &self,
        mut ctx: RequestContext,
        parts: &Parts,
    ) -> Result<RequestContext, AppError> {
        if self.access == Access::Public {
            return Ok(ctx);
        }

        ctx.enter(Stage::Authenticating);
        let identity = authenticate(&self.state, &parts.headers)
            .await
            .inspect_err(|rejection| {
                tracing::debug!(
                    client_address = %ctx.fingerprint.client_address,
                    path = %ctx.fingerprint.path,
                    "Authentication failed: {rejection:?}"
                );
            })?;
        ctx.role = identity.role;
        ctx.identity = Some(identity);
        ctx.enter(Stage::Authenticated);
        Ok(ctx)
    }

    fn select_policy(&self, mut ctx: RequestContext) -> RequestContext {
        ctx.enter(Stage::PolicySelecting);
        ctx.policy = Some(self.state.policies.policy_for(ctx.role).clone());
        ctx
    }

    async fn rate_limit(&self, mut ctx: RequestContext) -> Result<RequestContext, AppError> {
        ctx.enter(Stage::RateLimiting);
        let Some(policy) = ctx.policy.as_ref() else {
            return Err(AppError::Internal("rate limiting without a policy".into()));
        };

        let verdict = match self.state.oracle.evaluate(&ctx.fingerprint, policy).await {
            Ok(verdict) => verdict,
            Err(e) => {
                ctx.log_denial("Rate limit oracle unavailable");
                return Err(e.into());
            }
        };

        if verdict.allowed {
            return Ok(ctx);
        }
        match verdict.deny_reason {
            DenyReason::Shielded => {
                ctx.log_denial("Shield blocked request");
                Err(AppError::Shielded)
            }
            DenyReason::RateLimited => {
                ctx.log_denial("Rate limit exceeded");
                Err(AppError::RateLimited)
            }
            DenyReason::None => Err(AppError::Internal(
                "rate limit oracle denied a request without a reason".into(),
            )),
        }
    }

    fn authorize(&self, mut ctx: RequestContext) -> Result<RequestContext, AppError> {
        ctx.enter(Stage::AuthorizationChecking);
        if self.access == Access::Authenticated && ctx.identity.is_none() {
            return Err(AppError::Unauthenticated(AuthFailure::MissingIdentity));
        }
        ctx.enter(Stage::Admitted);
        Ok(ctx)
    }
}

impl Guard {
    pub fn check(self, mut ctx: RequestContext) -> Result<RequestContext, AppError> {
        ctx.enter(Stage::AuthorizationChecking);
        let identity = ctx.identity.as_ref();
        match self {
            Guard::Role(role) => require_role(identity, role)?,
            Guard::AnyRole(roles) => require_any_role(identity, roles)?,
        }
        ctx.enter(Stage::Admitted);
        Ok(ctx)
    }
}

/// Runs the admission stages and attaches the resulting context (and
/// identity, when there is one) to the request.
pub async fn admit(State(gate): State<Gate>, req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();
    match gate.run(&parts).await {
        Ok(ctx) => {
            if let Some(identity) = &ctx.identity {
                parts.extensions.insert(identity.clone());
            }
            parts.extensions.insert(ctx);
            next.run(Request::from_parts(parts, body)).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

pub async fn guard(State(guard): State<Guard>, mut req: Request, next: Next) -> Response {
    let Some(ctx) = req.extensions_mut().remove::<RequestContext>() else {
        return AppError::Unauthenticated(AuthFailure::MissingIdentity).into_response();
    };
    match guard.check(ctx) {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(rejection) => rejection.into_response(),
    }
}
