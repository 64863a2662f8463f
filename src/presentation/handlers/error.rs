use serde::Serialize;

/// Error body shared by all endpoints: a human-readable message with
/// upstream detail where available, plus a machine-readable code.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: ErrorCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    RateLimited,
    UpstreamFailure,
    SerializationFailure,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}
