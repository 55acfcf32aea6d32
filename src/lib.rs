use thiserror::Error;

use crate::profile::ProfileField;

pub type Result<T> = std::result::Result<T, MatchError>;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Profile is missing a required embedding for field: {0}")]
    MissingEmbedding(ProfileField),

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Gateway timed out: {0}")]
    GatewayTimeout(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl MatchError {
    /// Transient failures degrade to a component-level fallback instead of
    /// failing the pipeline invocation.
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Gateway(_) | Self::GatewayTimeout(_))
    }
}

pub mod commands;
pub mod config;
pub mod gateway;
pub mod matcher;
pub mod profile;
pub mod ranking;
pub mod recommend;
pub mod retrieval;
pub mod similarity;
