//! Runtime usage errors.

use thiserror::Error;

/// Error produced by a failing guard or action.
///
/// Failures of user code are never returned from `fire`; they are handed to
/// extensions, recorded on the transition context and notified.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised when a state machine is used against its lifecycle contract.
#[derive(Debug, Error)]
pub enum StateMachineError {
    #[error("State machine is already initialized")]
    AlreadyInitialized,

    #[error("State machine is not initialized. Call .initialize(state) first")]
    NotInitialized,

    #[error("Initial state has not been entered. Call .enter_initial_state() or .start() first")]
    InitialStateNotEntered,

    #[error("Initial state has already been entered")]
    InitialStateAlreadyEntered,

    #[error("State '{state}' is not defined on this state machine")]
    UnknownState { state: String },

    #[error("State machine worker has been shut down")]
    WorkerShutDown,

    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}
