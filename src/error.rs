use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Insufficient history: need {required} candles, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error(transparent)]
    Reqwest(reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

/// Request URLs carry the bot token and API key, so they are dropped.
impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Reqwest(e.without_url())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_history_message() {
        let err = AppError::InsufficientHistory {
            required: 50,
            available: 12,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient history: need 50 candles, got 12"
        );
    }
}
