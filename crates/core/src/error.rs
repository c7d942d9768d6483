use thiserror::Error;

pub type RewardResult<T> = Result<T, RewardError>;

#[derive(Error, Debug)]
pub enum RewardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for RewardError {
    fn from(err: config::ConfigError) -> Self {
        RewardError::Config(err.to_string())
    }
}
