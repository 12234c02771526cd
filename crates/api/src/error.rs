//! API error types

use alerting::AlertError;
use dms::DmsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error(transparent)]
    Dms(#[from] DmsError),

    #[error(transparent)]
    Alerting(#[from] AlertError),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}
