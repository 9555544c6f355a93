/// Response envelope
///
/// Every endpoint answers with the same wrapper:
///
/// ```json
/// { "success": true, "data": { "id": 1 } }
/// { "success": true, "message": "Billing data updated successfully" }
/// ```
///
/// Failures are produced by [`ApiError`](super::ApiError) and use the same
/// `success` flag, so clients can branch on a single field.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

/// Success envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Always `true` for values built here
    pub success: bool,

    /// Response payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Optional human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Wraps a payload
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Attaches a message to the envelope
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Envelope<()> {
    /// Envelope carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// 200 OK with a payload
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope::data(data))
}

/// 201 Created with a payload
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, Json(Envelope::data(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_envelope_serialization() {
        let value = serde_json::to_value(Envelope::data(json!({"id": 7}))).unwrap();
        assert_eq!(value, json!({"success": true, "data": {"id": 7}}));
    }

    #[test]
    fn test_message_envelope_skips_data() {
        let value = serde_json::to_value(Envelope::message("done")).unwrap();
        assert_eq!(value, json!({"success": true, "message": "done"}));
    }

    #[test]
    fn test_envelope_deserializes_without_optional_fields() {
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_value(json!({"success": true})).unwrap();
        assert!(envelope.success);
        assert!(envelope.data.is_none());
        assert!(envelope.message.is_none());
    }
}
