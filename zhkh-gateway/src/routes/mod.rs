/// Gateway route handlers
///
/// - `root`: Index and favicon
/// - `health`: Health check
/// - `auth`: Register, login, logout and current user

pub mod auth;
pub mod health;
pub mod root;
