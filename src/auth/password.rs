use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::warn;

/// Hash a password or clock-in PIN.
pub fn hash_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(secret.as_bytes(), &salt)?
        .to_string())
}

/// Verify a password or PIN against its stored hash. A hash that fails to
/// parse counts as a mismatch rather than an error the caller must branch on.
pub fn verify_secret(secret: &str, hashed: &str) -> bool {
    match PasswordHash::new(hashed) {
        Ok(parsed) => Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!(error = %e, "stored credential hash is unparsable");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hash = hash_secret("4321").unwrap();
        assert!(verify_secret("4321", &hash));
        assert!(!verify_secret("1234", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_secret("4321", "not-a-phc-string"));
    }
}
