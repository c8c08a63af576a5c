use thiserror::Error;

/// Failures reported by the server manager data-access layer.
///
/// The dashboard does not distinguish between variants beyond the rendered
/// message: every one of them becomes an error view state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("An error occurred - {0}")]
    Transport(String),

    #[error("An error occurred - Error code: {0}")]
    Status(u16),

    #[error("{0}")]
    ServerReported(String),

    #[error("An error occurred - invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return ApiError::Decode(e.to_string());
        }
        match e.status() {
            Some(status) => ApiError::Status(status.as_u16()),
            None => ApiError::Transport(e.to_string()),
        }
    }
}
