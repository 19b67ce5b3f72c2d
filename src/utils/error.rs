use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Parsing error: {message}")]
    Parse { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
