use crate::error::AuthError;
use hex;
use rand::{thread_rng, RngCore};
use ring::{digest, pbkdf2};
use std::num::NonZeroU32;
use tracing::error;

const SCHEME: &str = "pbkdf2-sha256";
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;
pub const DEFAULT_ITERATIONS: u32 = 100_000;

pub trait HashingService: Send + Sync {
    /// One-way salted hash. The salt and cost travel inside the returned string.
    fn hash_password(&self, plaintext: &str) -> Result<String, AuthError>;

    /// `InvalidCredentials` on mismatch.
    fn verify(&self, hash: &str, plaintext: &str) -> Result<(), AuthError>;
}

/// PBKDF2-HMAC-SHA256 hasher producing `pbkdf2-sha256$<iterations>$<salt>$<hash>`.
#[derive(Clone)]
pub struct Pbkdf2HashingService {
    iterations: NonZeroU32,
    salt_length: usize,
}

impl Pbkdf2HashingService {
    pub fn new(iterations: NonZeroU32) -> Self {
        Pbkdf2HashingService {
            iterations,
            salt_length: 32,
        }
    }
}

impl Default for Pbkdf2HashingService {
    fn default() -> Self {
        Pbkdf2HashingService::new(
            NonZeroU32::new(DEFAULT_ITERATIONS).unwrap_or(NonZeroU32::MIN),
        )
    }
}

struct StoredHash {
    iterations: NonZeroU32,
    salt: Vec<u8>,
    credential: Vec<u8>,
}

fn parse_stored_hash(hash: &str) -> Option<StoredHash> {
    let mut parts = hash.split('$');
    if parts.next()? != SCHEME {
        return None;
    }
    let iterations = parts.next()?.parse::<u32>().ok().and_then(NonZeroU32::new)?;
    let salt = hex::decode(parts.next()?).ok()?;
    let credential = hex::decode(parts.next()?).ok()?;
    if parts.next().is_some() || credential.len() != CREDENTIAL_LEN {
        return None;
    }

    Some(StoredHash {
        iterations,
        salt,
        credential,
    })
}

impl HashingService for Pbkdf2HashingService {
    fn hash_password(&self, plaintext: &str) -> Result<String, AuthError> {
        let mut salt = vec![0u8; self.salt_length];
        thread_rng()
            .try_fill_bytes(&mut salt)
            .map_err(|e| AuthError::InternalError(format!("salt generation failed: {e}")))?;

        let mut credential = [0u8; CREDENTIAL_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            &salt,
            plaintext.as_bytes(),
            &mut credential,
        );

        Ok(format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            hex::encode(&salt),
            hex::encode(credential)
        ))
    }

    fn verify(&self, hash: &str, plaintext: &str) -> Result<(), AuthError> {
        let stored = parse_stored_hash(hash).ok_or_else(|| {
            error!("stored password hash is malformed");
            AuthError::InternalError("stored password hash is malformed".to_string())
        })?;

        // ring compares in constant time
        pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            stored.iterations,
            &stored.salt,
            plaintext.as_bytes(),
            &stored.credential,
        )
        .map_err(|_| AuthError::InvalidCredentials)
    }
}
