use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Non-2xx answer from the service. `message` is the response body, or a
    /// generic fallback when the body was empty.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Tag translations unavailable: {0}")]
    Translation(String),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Build the error for a failed HTTP exchange from its status and body text.
    pub fn from_response(status: u16, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            format!("Request failed: {}", status)
        } else {
            body.to_string()
        };
        ClientError::Api { status, message }
    }

    /// HTTP status of the failed exchange, if the error came from the service.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }

    /// Text suitable for an error banner.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Validation(msg)
            | ClientError::NotFound(msg)
            | ClientError::Conflict(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_uses_body_text() {
        let err = ClientError::from_response(409, r#"{"detail":"Task name already exists"}"#);
        assert_eq!(err.status(), Some(409));
        assert_eq!(
            err.user_message(),
            r#"{"detail":"Task name already exists"}"#
        );
    }

    #[test]
    fn test_from_response_falls_back_on_empty_body() {
        let err = ClientError::from_response(502, "  \n");
        assert_eq!(err.user_message(), "Request failed: 502");
        assert_eq!(err.to_string(), "Request failed: 502");
    }

    #[test]
    fn test_validation_message_is_bare() {
        let err = ClientError::Validation("Task name must not be empty".to_string());
        assert!(err.is_validation());
        assert_eq!(err.user_message(), "Task name must not be empty");
        assert_eq!(err.status(), None);
    }
}
