use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2,
};

/// Checks that `hash` is a complete Argon2 PHC string that sign-in can verify.
pub fn validate_hash(hash: &str) -> anyhow::Result<()> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {e}"))?;
    Algorithm::try_from(parsed.algorithm)
        .map_err(|e| anyhow::anyhow!("Unsupported password hash algorithm: {e}"))?;
    if parsed.hash.is_none() {
        anyhow::bail!("Invalid password hash: missing hash output");
    }
    Ok(())
}

pub fn verify_password(hash: &str, password: &str) -> anyhow::Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Hashes on the blocking thread pool.
pub async fn hash_password_blocking(password: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

pub async fn verify_password_blocking(hash: String, password: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&hash, &password)).await?
}
