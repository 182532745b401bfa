use thiserror::Error;

use crate::combat::InvalidAction;
use crate::config::ConfigError;

/// Errors surfaced by [`crate::DailyEngine`].
///
/// Corrupt documents, unknown themes and refused token spends are handled
/// softly and never show up here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    InvalidAction(#[from] InvalidAction),
    #[error("store failure: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("document could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    pub(crate) fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(err))
    }
}
