/// HTTP handlers
///
/// One module per service plus the health check every service exposes.

pub mod accounts;
pub mod billing;
pub mod health;
pub mod payments;
pub mod reports;
pub mod tasks;
pub mod users;
