use thiserror::Error;

use crate::graphql::GraphqlError;

use super::CursorError;

/// Failure of a single trigger invocation.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// User-facing stop. The host shows the message and does not retry.
    #[error("{0}")]
    Halted(String),
    #[error(transparent)]
    Api(#[from] GraphqlError),
    #[error(transparent)]
    Cursor(#[from] CursorError),
}

impl TriggerError {
    pub fn halted(message: impl Into<String>) -> Self {
        TriggerError::Halted(message.into())
    }

    pub fn is_halted(&self) -> bool {
        matches!(self, TriggerError::Halted(_))
    }
}
