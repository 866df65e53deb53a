//! Answer selection backed by a chat-completion model.

mod chat;
mod models;

use async_trait::async_trait;

use drill_core::model::{AnswerId, Exercise};

use crate::error::OracleError;

pub use chat::{ChatOracle, DEFAULT_BASE_URL, DEFAULT_INSTRUCTIONS, OracleConfig};
pub use models::{LlmModel, UnknownModel};

/// Picks an answer id for an exercise.
#[async_trait]
pub trait AnswerOracle: Send + Sync {
    /// # Errors
    ///
    /// Returns `OracleError::RateLimited` when the model refuses for quota
    /// reasons, and `OracleError::MalformedResponse` when the reply carries no
    /// usable answer id.
    async fn ask(&self, exercise: &Exercise) -> Result<AnswerId, OracleError>;
}
