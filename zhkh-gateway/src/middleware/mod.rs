/// Middleware for the gateway
///
/// - `session`: Rejects requests without a valid session cookie

pub mod session;
