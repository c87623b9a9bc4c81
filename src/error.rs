use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("Invalid departure {token:?}: {reason}")]
    InvalidDeparture { token: String, reason: String },
}

impl ProcessingError {
    pub fn invalid_departure(token: &str, reason: impl Into<String>) -> Self {
        ProcessingError::InvalidDeparture {
            token: token.to_owned(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{kind} {id} not found")]
    NotFound { kind: String, id: u64 },

    #[error("Timed out fetching {kind} {id}")]
    Timeout { kind: String, id: u64 },

    #[error("Expected a {expected}, got {found} {id}")]
    UnexpectedType {
        expected: String,
        found: String,
        id: u64,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Could not parse {kind}: {reason}")]
    Parse { kind: String, reason: String },
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Could not read user inputs")]
    Json(#[from] serde_json::Error),

    #[error("'{0}' is not a valid date; YYYYMMDD format is expected")]
    InvalidDate(String),
}
