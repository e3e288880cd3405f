use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use acquisitions_core::{NewUser, PolicyTable, RateLimitOracle, Role, UserStore};
use dashmap::DashMap;

use crate::auth::password;
use crate::config::{BootstrapConfig, ServerConfig};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub users: Arc<dyn UserStore>,
    pub oracle: Arc<dyn RateLimitOracle>,
    pub policies: Arc<PolicyTable>,
    /// Revoked JWT token IDs (jti) mapped to the token's own expiry in unix seconds.
    /// Tokens in this map are rejected by the authentication stage.
    pub revoked_tokens: Arc<DashMap<String, u64>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        users: Arc<dyn UserStore>,
        oracle: Arc<dyn RateLimitOracle>,
    ) -> Self {
        let policies = Arc::new(config.policy_table());
        Self {
            config: Arc::new(config),
            users,
            oracle,
            policies,
            revoked_tokens: Arc::new(DashMap::new()),
            started_at: Instant::now(),
        }
    }

    pub fn revoke_token(&self, jti: String, expires_at: u64) {
        self.revoked_tokens.insert(jti, expires_at);
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revoked_tokens.contains_key(jti)
    }

    /// Drops revocations whose token would have expired anyway.
    pub fn purge_revoked(&self) {
        let now = unix_now();
        self.revoked_tokens.retain(|_, expires_at| *expires_at > now);
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Creates the configured admin account unless its email is already registered.
/// A hash that sign-in could never verify fails startup.
pub async fn seed_admin(users: &dyn UserStore, bootstrap: &BootstrapConfig) -> anyhow::Result<()> {
    let (Some(email), Some(hash)) = (&bootstrap.admin_email, &bootstrap.admin_password_hash) else {
        return Ok(());
    };
    password::validate_hash(hash)
        .map_err(|e| anyhow::anyhow!("bootstrap admin_password_hash for {email}: {e}"))?;

    if users.find_credentials(email).await?.is_some() {
        tracing::debug!("Bootstrap admin {} already exists", email);
        return Ok(());
    }

    let admin = users
        .create_user(NewUser {
            name: bootstrap.admin_name.clone(),
            email: email.clone(),
            password_hash: hash.clone(),
            role: Role::Admin,
        })
        .await?;
    tracing::info!("Bootstrap admin created: {} (id {})", admin.email, admin.id);
    Ok(())
}
