use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlacesError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited by place provider")]
    RateLimited,

    #[error("provider returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("provider temporarily unavailable: {0}")]
    Unavailable(String),

    /// Permanent refusal. `status` is the HTTP code or the provider's status string.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: String, message: String },

    #[error("candidate {0} is no longer valid")]
    InvalidCandidate(String),

    #[error("malformed provider response: {0}")]
    Decode(String),
}

impl PlacesError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            408 => PlacesError::Timeout,
            429 => PlacesError::RateLimited,
            500..=599 => PlacesError::Server { status, body },
            _ => PlacesError::rejected(status, body),
        }
    }

    pub fn rejected(status: impl ToString, message: impl Into<String>) -> Self {
        PlacesError::Rejected {
            status: status.to_string(),
            message: message.into(),
        }
    }

    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlacesError::Timeout
                | PlacesError::Network(_)
                | PlacesError::RateLimited
                | PlacesError::Server { .. }
                | PlacesError::Unavailable(_)
        )
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for PlacesError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PlacesError::Timeout
        } else if err.is_decode() {
            PlacesError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            PlacesError::from_status(status.as_u16(), err.to_string())
        } else {
            PlacesError::Network(err.to_string())
        }
    }
}
