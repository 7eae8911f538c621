//! Salted, stretched SHA-256 password hashing.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hash rounds applied on top of the initial salted digest.
const STRETCH_ROUNDS: u32 = 50_000;

/// A fresh random salt, hex encoded.
pub fn new_salt() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Hash a password with the given salt, hex encoded.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();

    for _ in 0..STRETCH_ROUNDS {
        digest = Sha256::new()
            .chain_update(digest)
            .chain_update(salt.as_bytes())
            .finalize();
    }

    hex::encode(digest)
}

/// Check a password against a stored hash in constant time.
pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    let computed = hash_password(password, salt);
    computed.as_bytes().ct_eq(expected_hash.as_bytes()).into()
}
