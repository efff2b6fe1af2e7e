use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

/// Seam between the login/OTP flows and credential storage. Credentials
/// are stored as salted Argon2id hashes; nothing outside this module
/// touches the hash format.
pub trait CredentialVerifier: Send + Sync {
    fn hash(&self, password: &str) -> anyhow::Result<String>;
    fn verify(&self, password: &str, stored_hash: &str) -> anyhow::Result<bool>;
}

pub struct Argon2Verifier;

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, stored_hash: &str) -> anyhow::Result<bool> {
        let parsed = argon2::PasswordHash::new(stored_hash)
            .map_err(|e| anyhow::anyhow!("stored hash is malformed: {e}"))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(anyhow::anyhow!("verify error: {e}")),
        }
    }
}
