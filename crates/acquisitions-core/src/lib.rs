//! Acquisitions core library — HTTP-agnostic identity and access policy.
//!
//! `acquisitions-core` holds everything the request pipeline decides on
//! without touching a socket: who a caller is, what they may do, and how
//! many requests their role may issue per window. The web crate wires
//! these pieces into axum middleware.
//!
//! # Modules
//!
//! - [`identity`] — [`Role`], [`UserId`] and the [`Identity`] snapshot attached to a request.
//! - [`authorize`] — Role, ownership and field-level policy checks.
//! - [`rate_limit`] — Per-role quota table, the [`RateLimitOracle`] contract and an in-process sliding-window oracle.
//! - [`users`] — The [`UserStore`] collaborator contract and an in-memory implementation.
//! - [`error`] — Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod authorize;
pub mod error;
pub mod identity;
pub mod rate_limit;
pub mod users;

pub use authorize::{
    guard_admin_demotion, guard_last_admin, require_any_role, require_role, require_self_or_admin,
    restrict_self_update, Decision, OwnedAction,
};
pub use error::{AuthFailure, CoreError, CoreResult};
pub use identity::{Identity, Role, UnknownRole, UserId};
pub use rate_limit::{
    DenyReason, Mode, PolicyTable, RateLimitOracle, RateLimitPolicy, RequestFingerprint,
    SlidingWindowOracle, Verdict,
};
pub use users::{MemoryUserStore, NewUser, UserChanges, UserStore};
