//! Errors raised while running a batch of trials.

use sim_core::{ConfigError, ErrorSeverity, SimError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RunnerError>;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid trial configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("metric sink lock was poisoned")]
    LockPoisoned,

    #[error("failed to encode combat log for digest: {0}")]
    Digest(#[from] serde_json::Error),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SimError for RunnerError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config(error) => error.severity(),
            Self::LockPoisoned | Self::Digest(_) | Self::ThreadPool(_) => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(error) => error.error_code(),
            Self::LockPoisoned => "runner.lock_poisoned",
            Self::Digest(_) => "runner.digest",
            Self::ThreadPool(_) => "runner.thread_pool",
        }
    }
}
