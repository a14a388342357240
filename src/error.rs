use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("server count must be at least 1")]
    NoServers,

    #[error("temperature must be finite and > 0, got {0}")]
    InvalidTemperature(f64),

    #[error("learning rate must be in (0, 1], got {0}")]
    InvalidLearningRate(f64),

    #[error("report interval must be at least 1")]
    InvalidReportInterval,

    #[error("invalid latency model: {0}")]
    InvalidLatencyModel(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
