//! Engine error model.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures that can occur while loading a dataset.
///
/// Zero search results and a salary that resolves to no data are valid
/// outcomes, not errors. These variants only cover refresh-time problems,
/// which the scheduler catches and logs without touching the current dataset.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The source file could not be read.
    #[error("load failed: {0}")]
    Load(String),

    /// The payload could not be decrypted (bad key or malformed ciphertext).
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// A row or the header did not match the expected schema.
    #[error("parse failed: {0}")]
    Parse(String),
}

impl EngineError {
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    pub fn decryption(msg: impl Into<String>) -> Self {
        Self::Decryption(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
