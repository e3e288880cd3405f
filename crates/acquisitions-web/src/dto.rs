use acquisitions_core::Identity;
use serde::{Deserialize, Serialize};

// Request fields are optional so that missing values surface as
// validation details rather than as deserialization failures.

#[derive(Debug, Default, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: UserSummary,
}

/// The public slice of an account returned by the auth endpoints.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<Identity> for UserSummary {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id.get(),
            name: identity.name,
            email: identity.email,
            role: identity.role.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: &'static str,
    pub user: Identity,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub message: &'static str,
    pub users: Vec<Identity>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since the server started.
    pub uptime: f64,
}
