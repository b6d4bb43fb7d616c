//! Password hashing, secret generation, and auth-token digests.
//!
//! Passwords (session and admin) are hashed with Argon2id. Auth tokens
//! are high-entropy random strings checked by SHA-256 digest with a
//! constant-time comparison; they never go through the slow hash because
//! they are verified on every participant-scoped request.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use huddle_core::error::AppError;

/// Length of generated session and admin passwords.
const PASSWORD_LENGTH: usize = 24;

/// Length of generated participant auth tokens.
const TOKEN_LENGTH: usize = 32;

/// Handles password hashing and verification using Argon2id.
#[derive(Debug, Clone, Default)]
pub struct Credentials;

impl Credentials {
    /// Creates a new credentials helper.
    pub fn new() -> Self {
        Self
    }

    /// Hashes a plaintext secret using Argon2id with a random salt.
    pub fn hash(&self, secret: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verifies a plaintext secret against a stored Argon2id hash.
    ///
    /// Returns `Ok(true)` if the secret matches, `Ok(false)` if not.
    /// Argon2 verification is constant-time with respect to the secret.
    pub fn verify(&self, secret: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid password hash format: {e}")))?;

        let argon2 = Argon2::default();
        match argon2.verify_password(secret.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }
}

/// Generates a fresh participant id.
pub fn new_participant_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates an opaque random password.
pub fn generate_password() -> String {
    random_alphanumeric(PASSWORD_LENGTH)
}

/// Generates an opaque random auth token.
pub fn generate_token() -> String {
    random_alphanumeric(TOKEN_LENGTH)
}

/// Computes the SHA-256 hex digest stored for an auth token.
pub fn token_digest(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex_encode(&digest)
}

/// Checks a plaintext token against a stored digest in constant time.
pub fn token_matches(token: &str, stored_digest: &str) -> bool {
    let digest = token_digest(token);
    constant_time_eq(digest.as_bytes(), stored_digest.as_bytes())
}

fn random_alphanumeric(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Encode bytes to a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Constant-time byte comparison (XOR-based).
///
/// Returns true if and only if `a == b`. Time taken is independent of
/// how many bytes match (mitigates timing attacks).
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verify_roundtrip() {
        let creds = Credentials::new();
        let hash = creds.hash("swordfish").unwrap();
        assert!(creds.verify("swordfish", &hash).unwrap());
        assert!(!creds.verify("sw0rdfish", &hash).unwrap());
    }

    #[test]
    fn test_generated_secrets_are_distinct() {
        assert_ne!(generate_password(), generate_password());
        assert_ne!(generate_token(), generate_token());
        assert_eq!(generate_token().len(), 32);
    }

    #[test]
    fn test_token_digest_matches() {
        let token = generate_token();
        let digest = token_digest(&token);
        assert!(token_matches(&token, &digest));
        assert!(!token_matches("not-the-token", &digest));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer string"));
    }
}
