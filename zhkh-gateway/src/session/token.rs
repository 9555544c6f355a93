/// Session tokens
///
/// A token is 32 random alphanumeric characters (62^32 ≈ 2^190). Only its
/// SHA-256 hex digest is used as a store key.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a session token
pub const TOKEN_LENGTH: usize = 32;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a new random token
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();

    (0..TOKEN_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Store key for a token (64 hex characters)
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Whether a cookie value can be a token at all
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}
