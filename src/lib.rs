pub mod auth;
pub mod config;
pub mod fetch;
pub mod mailer;
pub mod models;
pub mod monitor;
pub mod notifier;
pub mod session;
pub mod storage;
pub mod subscriptions;
pub mod utils;
pub mod vendor;

// Re-export commonly used types
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
