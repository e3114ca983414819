//! Checkpoint error types.

use thiserror::Error;

/// A checkpoint entry that does not fit the machine it is loaded into.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckpointViolation {
    #[error("State {state} is not defined on this state machine")]
    UnknownState { state: String },

    #[error("State {state} is not a direct sub state of {super_state}")]
    NotADirectSubState { state: String, super_state: String },
}

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Checkpoint version is not supported by this version
    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Checkpoints can only be loaded into a machine that was not initialized
    #[error("Cannot load a checkpoint into an initialized state machine")]
    AlreadyInitialized,

    /// Every entry that does not fit the machine
    #[error("Checkpoint does not fit the state machine: {} violation(s)", violations.len())]
    InvalidCheckpoint { violations: Vec<CheckpointViolation> },
}
