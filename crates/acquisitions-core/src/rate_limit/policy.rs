use std::time::Duration;

use crate::identity::Role;

/// Quota applied to every request made under one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub role: Role,
    pub window: Duration,
    pub max_requests: u32,
    pub name: &'static str,
}

impl RateLimitPolicy {
    fn for_role(role: Role, window: Duration, max_requests: u32) -> Self {
        let name = match role {
            Role::Guest => "guest-rate-limit",
            Role::User => "user-rate-limit",
            Role::Admin => "admin-rate-limit",
        };
        Self {
            role,
            window,
            max_requests,
            name,
        }
    }
}

/// One policy per role, built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    guest: RateLimitPolicy,
    user: RateLimitPolicy,
    admin: RateLimitPolicy,
}

impl PolicyTable {
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
    pub const DEFAULT_GUEST_MAX: u32 = 5;
    pub const DEFAULT_USER_MAX: u32 = 10;
    pub const DEFAULT_ADMIN_MAX: u32 = 20;

    pub fn new(window: Duration, guest_max: u32, user_max: u32, admin_max: u32) -> Self {
        Self {
            guest: RateLimitPolicy::for_role(Role::Guest, window, guest_max),
            user: RateLimitPolicy::for_role(Role::User, window, user_max),
            admin: RateLimitPolicy::for_role(Role::Admin, window, admin_max),
        }
    }

    pub fn policy_for(&self, role: Role) -> &RateLimitPolicy {
        match role {
            Role::Guest => &self.guest,
            Role::User => &self.user,
            Role::Admin => &self.admin,
        }
    }

    /// Resolves a raw role name; absent or unrecognised names get the
    /// guest policy.
    pub fn policy_for_name(&self, role: Option<&str>) -> &RateLimitPolicy {
        self.policy_for(role.map(Role::parse_or_guest).unwrap_or_default())
    }

    /// The longest window in the table, used to age out idle counters.
    pub fn longest_window(&self) -> Duration {
        self.guest
            .window
            .max(self.user.window)
            .max(self.admin.window)
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_WINDOW,
            Self::DEFAULT_GUEST_MAX,
            Self::DEFAULT_USER_MAX,
            Self::DEFAULT_ADMIN_MAX,
        )
    }
}
