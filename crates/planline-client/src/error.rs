//! API errors and server error-detail extraction
//!
//! The backend reports failures in DRF shape: `non_field_errors`, a
//! `detail` string, or a per-field map of message lists. Extraction
//! prefers the most specific server-supplied text so a row failure can
//! name the offending field.

use serde_json::Value;

/// Failure of one backend call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-success status
    #[error("{detail}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Extracted server-supplied detail
        detail: String,
    },

    /// Response body could not be decoded
    #[error("could not decode server response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Server error with detail extracted from a response body
    #[must_use]
    pub fn from_response(status: u16, body: &Value) -> Self {
        Self::Server {
            status,
            detail: extract_detail(status, body),
        }
    }

    /// The message suitable for a per-row failure report
    #[must_use]
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

/// Pull the most specific message out of a DRF-shaped error body
///
/// Priority: `non_field_errors` joined with `; `, then `detail`, then the
/// first field's first message as `field '<name>': <message>`, else a
/// status-line fallback.
#[must_use]
pub fn extract_detail(status: u16, body: &Value) -> String {
    if let Some(errors) = body.get("non_field_errors").and_then(Value::as_array) {
        let joined: Vec<&str> = errors.iter().filter_map(Value::as_str).collect();
        if !joined.is_empty() {
            return joined.join("; ");
        }
    }

    if let Some(detail) = body.get("detail").and_then(Value::as_str) {
        return detail.to_string();
    }

    if let Some(map) = body.as_object() {
        for (field, messages) in map {
            let first = match messages {
                Value::Array(list) => list.first().and_then(Value::as_str),
                Value::String(message) => Some(message.as_str()),
                _ => None,
            };
            if let Some(message) = first {
                return format!("field '{field}': {message}");
            }
        }
    }

    format!("HTTP {status}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_field_errors_win() {
        let body = json!({
            "non_field_errors": ["item is locked", "plan is closed"],
            "detail": "ignored",
            "planned_quantity": ["too small"]
        });

        assert_eq!(extract_detail(400, &body), "item is locked; plan is closed");
    }

    #[test]
    fn detail_beats_field_errors() {
        let body = json!({
            "detail": "not found",
            "planned_quantity": ["too small"]
        });

        assert_eq!(extract_detail(404, &body), "not found");
    }

    #[test]
    fn field_errors_name_the_field() {
        let body = json!({ "planned_quantity": ["must be a positive integer"] });

        assert_eq!(
            extract_detail(400, &body),
            "field 'planned_quantity': must be a positive integer"
        );
    }

    #[test]
    fn empty_body_falls_back_to_status() {
        assert_eq!(extract_detail(502, &Value::Null), "HTTP 502");
        assert_eq!(extract_detail(500, &json!({})), "HTTP 500");
    }

    #[test]
    fn error_display_carries_detail() {
        let err = ApiError::from_response(400, &json!({ "detail": "bad request" }));
        assert_eq!(err.to_string(), "bad request");
    }
}
