use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

/// Turns a password into its stored form and checks a password against it.
/// The gate only ever asks "does this password match this stored value",
/// so the storage format can change without touching request handling.
pub trait CredentialVerifier: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;
    fn verify(&self, password: &str, stored: &str) -> bool;
}

/// Stores passwords as given and compares them exactly (case-sensitive).
/// Compatible with databases seeded with plaintext credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextVerifier;

impl CredentialVerifier for PlaintextVerifier {
    fn hash(&self, password: &str) -> Result<String> {
        Ok(password.to_string())
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        password == stored
    }
}

/// Salted Argon2id, stored as a PHC string.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Verifier;

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("Password hashing failed: {}", e))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        // A stored value that is not a PHC string never matches.
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordScheme {
    Plaintext,
    Argon2,
}

impl PasswordScheme {
    pub fn verifier(self) -> Box<dyn CredentialVerifier> {
        match self {
            PasswordScheme::Plaintext => Box::new(PlaintextVerifier),
            PasswordScheme::Argon2 => Box::new(Argon2Verifier),
        }
    }
}

impl FromStr for PasswordScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plaintext" => Ok(PasswordScheme::Plaintext),
            "argon2" => Ok(PasswordScheme::Argon2),
            other => bail!("Unknown password scheme '{}' (expected plaintext or argon2)", other),
        }
    }
}
