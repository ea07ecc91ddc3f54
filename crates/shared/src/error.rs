use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Conflict,
    Validation,
    PayloadTooLarge,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => ErrorCode::NotFound,
            409 => ErrorCode::Conflict,
            400 | 415 | 422 => ErrorCode::Validation,
            413 => ErrorCode::PayloadTooLarge,
            _ => ErrorCode::Internal,
        }
    }
}

/// Error body returned by the content backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Interprets a failed response body. Backends that answer with plain text
    /// are mapped by status code.
    pub fn from_response(status: u16, body: &str) -> Self {
        serde_json::from_str::<ApiError>(body).unwrap_or_else(|_| {
            let message = body.trim();
            Self::new(
                ErrorCode::from_status(status),
                if message.is_empty() {
                    format!("request failed with status {status}")
                } else {
                    message.to_string()
                },
            )
        })
    }
}
