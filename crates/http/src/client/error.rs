//! Client error types

use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The caller abandoned the request before it completed
    #[error("Request cancelled")]
    Cancelled,
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Whether the server rejected the bearer token (HTTP 401)
    pub const fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_))
    }

    /// HTTP status carried by the error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::AuthenticationFailed(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::ServerError { status, .. } => Some(*status),
            Self::Request(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Message carried by an error response body
    ///
    /// JSON bodies contribute their `message` or `error` string field and
    /// nothing otherwise; markup yields nothing; plain text is kept.
    pub fn message_from_body(body: &str) -> Option<String> {
        let body = body.trim();
        if body.is_empty() || body.starts_with('<') {
            return None;
        }
        if body.starts_with('{') || body.starts_with('[') {
            let value: serde_json::Value = serde_json::from_str(body).ok()?;
            return ["message", "error"]
                .into_iter()
                .find_map(|field| value.get(field)?.as_str())
                .map(str::trim)
                .filter(|message| !message.is_empty())
                .map(ToString::to_string);
        }
        Some(body.to_string())
    }

    /// Server-provided message for 4xx rejections
    pub fn rejection_message(&self) -> Option<&str> {
        let message: Option<&str> = match self {
            Self::BadRequest(message)
            | Self::AuthenticationFailed(message)
            | Self::Forbidden(message)
            | Self::NotFound(message) => Some(message),
            Self::ServerError { status, message } if (400..500).contains(status) => Some(message),
            _ => None,
        };
        message.filter(|message| !message.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_maps_common_codes() {
        let err = ClientError::from_status(StatusCode::UNAUTHORIZED, "expired".into());
        assert!(err.is_auth_expired());
        assert_eq!(err.status(), Some(401));

        let err = ClientError::from_status(StatusCode::CONFLICT, "taken".into());
        assert!(!err.is_auth_expired());
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.rejection_message(), Some("taken"));

        let err = ClientError::from_status(StatusCode::BAD_GATEWAY, "down".into());
        assert_eq!(err.rejection_message(), None);
    }

    #[test]
    fn test_message_from_body_shapes() {
        assert_eq!(
            ClientError::message_from_body(r#"{"message":"Password too weak"}"#).as_deref(),
            Some("Password too weak")
        );
        assert_eq!(
            ClientError::message_from_body(r#"{"error":"Email taken","code":409}"#).as_deref(),
            Some("Email taken")
        );
        assert_eq!(
            ClientError::message_from_body(" Invalid credentials \n").as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(ClientError::message_from_body(r#"{"errors":[{"field":"email"}]}"#), None);
        assert_eq!(ClientError::message_from_body("{not json"), None);
        assert_eq!(ClientError::message_from_body("<html>502</html>"), None);
        assert_eq!(ClientError::message_from_body(""), None);
    }
}
