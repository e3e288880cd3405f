use acquisitions_core::Identity;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::state::unix_now;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string.
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
}

pub fn create_token(
    jwt_secret: &str,
    ttl_hours: u64,
    identity: &Identity,
) -> anyhow::Result<(String, u64)> {
    let now = unix_now();
    let expires_at = now + ttl_hours * 3600;

    let claims = Claims {
        sub: identity.id.to_string(),
        email: identity.email.clone(),
        role: identity.role.as_str().to_string(),
        iat: now,
        exp: expires_at,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;

    Ok((token, expires_at))
}

pub fn verify_token(jwt_secret: &str, token: &str) -> anyhow::Result<Claims> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}
