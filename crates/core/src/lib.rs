pub mod config;
pub mod error;
pub mod files;

pub use config::AppConfig;
pub use error::{RewardError, RewardResult};
