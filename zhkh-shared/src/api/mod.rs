/// HTTP plumbing shared by every service
///
/// - `cors`: CORS layer built from the configured origins
/// - `envelope`: The `{success, data | message}` response wrapper
/// - `error`: Unified error type mapped to HTTP statuses
/// - `extract`: Extractors that turn framework rejections into envelopes

pub mod cors;
pub mod envelope;
pub mod error;
pub mod extract;

pub use envelope::Envelope;
pub use error::{ApiError, ApiResult, ValidationErrorDetail};
pub use extract::{JsonBody, PathParam, QueryParams};
