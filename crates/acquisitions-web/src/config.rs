use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use acquisitions_core::{Mode, PolicyTable};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_ttl_hours")]
    pub jwt_ttl_hours: u64,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_guest_max")]
    pub guest_max: u32,
    #[serde(default = "default_user_max")]
    pub user_max: u32,
    #[serde(default = "default_admin_max")]
    pub admin_max: u32,
    #[serde(default = "default_login_rpm")]
    pub login_requests_per_minute: u32,
    /// Key limiters on `X-Forwarded-For`/`X-Real-IP`. Only safe behind a
    /// proxy that overwrites those headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

/// Admin account created at startup when no account with this email exists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapConfig {
    pub admin_email: Option<String>,
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
    /// Argon2 PHC string, as printed by the `hash_password` binary.
    pub admin_password_hash: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_ttl_hours: default_jwt_ttl_hours(),
            cookie_name: default_cookie_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            window_secs: default_window_secs(),
            guest_max: default_guest_max(),
            user_max: default_user_max(),
            admin_max: default_admin_max(),
            login_requests_per_minute: default_login_rpm(),
            trust_proxy_headers: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            environment: Environment::default(),
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
            tls: TlsConfig::default(),
            bootstrap: BootstrapConfig::default(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}
fn default_jwt_ttl_hours() -> u64 { 24 }
fn default_cookie_name() -> String { "token".to_string() }
fn default_window_secs() -> u64 { PolicyTable::DEFAULT_WINDOW.as_secs() }
fn default_guest_max() -> u32 { PolicyTable::DEFAULT_GUEST_MAX }
fn default_user_max() -> u32 { PolicyTable::DEFAULT_USER_MAX }
fn default_admin_max() -> u32 { PolicyTable::DEFAULT_ADMIN_MAX }
fn default_login_rpm() -> u32 { 5 }
fn default_admin_name() -> String { "Administrator".to_string() }

const WEAK_SECRETS: &[&str] = &[
    "change-me-to-a-random-secret",
    "secret",
    "password",
    "jwt-secret",
    "your_jwt_secret",
];

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls.cert_path.is_some() && self.tls.key_path.is_some()
    }

    /// The per-role quota table described by `[rate_limit]`.
    pub fn policy_table(&self) -> PolicyTable {
        PolicyTable::new(
            Duration::from_secs(self.rate_limit.window_secs.max(1)),
            self.rate_limit.guest_max,
            self.rate_limit.user_max,
            self.rate_limit.admin_max,
        )
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("ACQ_CONFIG").map(PathBuf::from).ok();

        let config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(&path)?;
            toml::from_str(&contents)?
        } else {
            ServerConfig::default()
        };

        let mut config = config.apply_env(|key| std::env::var(key).ok())?;

        if config.auth.jwt_secret.is_empty() {
            config.auth.jwt_secret = uuid::Uuid::new_v4().to_string();
            tracing::warn!(
                "No JWT secret configured. Generated random secret (will change on restart)."
            );
        }
        config.validate_secret()?;

        Ok(config)
    }

    /// Overlays environment variables read through `lookup`.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        if let Some(addr) = lookup("ACQ_BIND_ADDR") {
            self.bind_addr = addr.parse()?;
        }
        if let Some(env) = lookup("ACQ_ENV") {
            self.environment = match env.trim().to_ascii_lowercase().as_str() {
                "production" | "prod" => Environment::Production,
                _ => Environment::Development,
            };
        }

        if let Some(secret) = lookup("ACQ_JWT_SECRET").or_else(|| lookup("JWT_SECRET")) {
            self.auth.jwt_secret = secret;
        }
        if let Some(ttl) = lookup("ACQ_JWT_TTL_HOURS") {
            self.auth.jwt_ttl_hours = ttl.parse()?;
        }

        if let Some(mode) = lookup("ACQ_RATE_LIMIT_MODE") {
            self.rate_limit.mode = mode.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(rpm) = lookup("ACQ_LOGIN_RPM") {
            self.rate_limit.login_requests_per_minute = rpm.parse()?;
        }
        if let Some(trust) = lookup("ACQ_TRUST_PROXY_HEADERS") {
            self.rate_limit.trust_proxy_headers = trust.trim().parse()?;
        }

        if let Some(cert) = lookup("ACQ_TLS_CERT") {
            self.tls.cert_path = Some(cert);
        }
        if let Some(key) = lookup("ACQ_TLS_KEY") {
            self.tls.key_path = Some(key);
        }

        if let Some(email) = lookup("ACQ_ADMIN_EMAIL") {
            self.bootstrap.admin_email = Some(email);
        }
        if let Some(name) = lookup("ACQ_ADMIN_NAME") {
            self.bootstrap.admin_name = name;
        }
        if let Some(hash) = lookup("ACQ_ADMIN_PASSWORD_HASH") {
            self.bootstrap.admin_password_hash = Some(hash);
        }

        Ok(self)
    }

    /// Rejects placeholder secrets and warns about short ones.
    pub fn validate_secret(&self) -> anyhow::Result<()> {
        if WEAK_SECRETS.iter().any(|&w| self.auth.jwt_secret == w) {
            anyhow::bail!(
                "JWT secret matches a known weak/placeholder value. \
                 Set a strong random secret via ACQ_JWT_SECRET environment variable."
            );
        }
        if self.auth.jwt_secret.len() < 32 {
            tracing::warn!(
                "JWT secret is shorter than 32 characters. \
                 Consider using a stronger secret via ACQ_JWT_SECRET."
            );
        }
        Ok(())
    }
}
