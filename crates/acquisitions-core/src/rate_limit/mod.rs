//! Role-sensitive rate limiting.
//!
//! [`PolicyTable`] maps a [`Role`](crate::Role) to its quota. A
//! [`RateLimitOracle`] decides whether one request fits that quota; the
//! pipeline only consumes its [`Verdict`]. [`SlidingWindowOracle`] is the
//! in-process implementation used by the server.

mod oracle;
mod policy;
pub mod shield;
mod sliding_window;

pub use oracle::{DenyReason, Mode, RateLimitOracle, RequestFingerprint, Verdict};
pub use policy::{PolicyTable, RateLimitPolicy};
pub use sliding_window::SlidingWindowOracle;
