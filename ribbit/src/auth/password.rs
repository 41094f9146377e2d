//! Password hashing and verification, plus the random secrets and names minted alongside them.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine as _, engine::general_purpose};
use once_cell::sync::OnceCell;
use rand::prelude::RngExt;
use rand::rng;

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

static DUMMY_HASH: OnceCell<String> = OnceCell::new();

/// Hash of a password nobody knows. Login verifies against it when the email is unknown, so that
/// path costs the same as a wrong password.
///
/// Built on first use; [`crate::Application::new`] forces it so no login request pays for it.
pub fn dummy_hash() -> Result<&'static str, Error> {
    DUMMY_HASH.get_or_try_init(|| hash_string("ribbit-dummy-password")).map(String::as_str)
}

/// Hash a password with Argon2id and a fresh random salt. Returns a PHC string.
pub fn hash_string(input: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2Params::default().to_argon2()?;

    let hash = argon2.hash_password(input.as_bytes(), &salt).map_err(|e| Error::Internal {
        operation: format!("hash string: {e}"),
    })?;

    Ok(hash.to_string())
}

/// Verify a string against a hash.
///
/// Note: Verification uses the parameters embedded in the hash itself.
pub fn verify_string(input: &str, hash: &str) -> Result<bool, Error> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| Error::Internal {
        operation: format!("parse hash: {e}"),
    })?;

    // Verification always uses params from the hash
    let argon2 = Argon2::default();
    Ok(argon2.verify_password(input.as_bytes(), &parsed_hash).is_ok())
}

/// 32 bytes (256 bits) of secure random data, base64url without padding.
pub fn generate_secret_token() -> String {
    let mut token_bytes = [0u8; 32];
    rng().fill(&mut token_bytes);

    general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}

/// Generate a human-readable device name
/// Format: "{adjective}-{noun}-{4-digit number}"
/// Example: "brave-frog-4729"
pub fn generate_device_name() -> String {
    const ADJECTIVES: &[&str] = &[
        "brave", "calm", "eager", "fancy", "gentle", "happy", "jolly", "kind", "lively", "misty", "nimble", "proud", "quiet", "rapid",
        "silent", "sunny", "swift", "witty",
    ];

    const NOUNS: &[&str] = &[
        "frog", "toad", "newt", "heron", "lily", "reed", "pond", "brook", "marsh", "willow", "tadpole", "dragonfly", "otter", "salamander",
        "beaver",
    ];

    let mut rng = rng();
    let adjective = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.random_range(0..NOUNS.len())];
    let number = rng.random_range(1000..10000);

    format!("{adjective}-{noun}-{number}")
}
