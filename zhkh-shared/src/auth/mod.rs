/// Authentication utilities
///
/// - `password`: Argon2id hashing and verification for user passwords

pub mod password;
