use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a request against the track service.
///
/// Every variant carries plain text so the error can travel inside UI
/// messages, which must be `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Non-success response. Displays exactly the text shown to the user.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The request never produced a response
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body was not the expected JSON document
    #[error("invalid response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Build the error for a non-success response.
    ///
    /// The body is surfaced verbatim when it has any content, otherwise the
    /// status text stands in for it.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let message = if !body.is_empty() {
            body
        } else {
            match status.canonical_reason() {
                Some(reason) => reason.to_string(),
                None => status.as_str().to_string(),
            }
        };

        FetchError::Status {
            status: status.as_u16(),
            message,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}
