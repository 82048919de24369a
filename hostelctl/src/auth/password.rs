//! Password hashing, verification and stored-credential classification.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::errors::Error;

/// Argon2 hashing parameters.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    /// Create Argon2 instance with these parameters.
    fn to_argon2(self) -> Result<Argon2<'static>, Error> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None).map_err(|e| Error::Internal {
            operation: format!("create argon2 params: {e}"),
        })?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    /// Secure defaults for production (Argon2id RFC recommendations)
    fn default() -> Self {
        Self {
            memory_kib: 19456, // 19 MB
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Hash a string using Argon2.
///
/// Uses the provided parameters or secure defaults if None.
pub fn hash_string_with_params(input: &str, params: Option<Argon2Params>) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = params.unwrap_or_default().to_argon2()?;

    let hash = argon2.hash_password(input.as_bytes(), &salt).map_err(|e| Error::Internal {
        operation: format!("hash string: {e}"),
    })?;

    Ok(hash.to_string())
}

/// Hash a string using Argon2 with default secure parameters.
pub fn hash_string(input: &str) -> Result<String, Error> {
    hash_string_with_params(input, None)
}

/// Verify a string against a hash.
///
/// Note: Verification uses the parameters embedded in the hash itself.
pub fn verify_string(input: &str, hash: &str) -> Result<bool, Error> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| Error::Internal {
        operation: format!("parse hash: {e}"),
    })?;

    let argon2 = Argon2::default();
    Ok(argon2.verify_password(input.as_bytes(), &parsed_hash).is_ok())
}

/// A stored password, classified by its form.
///
/// Accounts provisioned before hashing was introduced hold their password verbatim. Those are
/// still accepted (when configured) and are rehashed on the next successful login. There is no
/// way to construct a new `Plaintext` credential other than reading one back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Argon2 PHC string
    Hashed(String),
    /// Legacy value stored without hashing
    Plaintext(String),
}

/// Outcome of checking a candidate password against a [`Credential`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Match,
    /// Matched a legacy plaintext credential; the caller should store a hash instead.
    MatchNeedsRehash,
    Mismatch,
}

impl Verification {
    pub fn is_match(self) -> bool {
        !matches!(self, Verification::Mismatch)
    }
}

impl Credential {
    /// Classify a value read from the `users.password` column.
    pub fn from_stored(stored: impl Into<String>) -> Self {
        let stored = stored.into();
        if PasswordHash::new(&stored).is_ok() {
            Credential::Hashed(stored)
        } else {
            Credential::Plaintext(stored)
        }
    }

    /// Hash a new password. The only way to create a credential for storage.
    pub fn hash(password: &str) -> Result<Self, Error> {
        hash_string(password).map(Credential::Hashed)
    }

    /// The value as it is (or would be) stored.
    pub fn as_stored(&self) -> &str {
        match self {
            Credential::Hashed(s) | Credential::Plaintext(s) => s,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Credential::Plaintext(_))
    }

    /// Check a candidate password.
    ///
    /// Plaintext credentials only ever match when `allow_plaintext` is set.
    pub fn verify(&self, candidate: &str, allow_plaintext: bool) -> Result<Verification, Error> {
        match self {
            Credential::Hashed(hash) => Ok(if verify_string(candidate, hash)? {
                Verification::Match
            } else {
                Verification::Mismatch
            }),
            Credential::Plaintext(_) if !allow_plaintext => Ok(Verification::Mismatch),
            Credential::Plaintext(stored) => Ok(if constant_time_eq(stored.as_bytes(), candidate.as_bytes()) {
                Verification::MatchNeedsRehash
            } else {
                Verification::Mismatch
            }),
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
