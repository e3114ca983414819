//! Errors raised while declaring a state machine.

use thiserror::Error;

/// Declaration-time usage errors.
///
/// States are rendered with their `Debug` representation so the error stays
/// independent of the identifier types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("State {state} cannot be its own super state")]
    SelfSuperState { state: String },

    #[error("State {state} cannot be its own initial sub state")]
    SelfInitialState { state: String },

    #[error("State {initial} is not a sub state of {state} and cannot be its initial state")]
    InitialStateNotSubState { state: String, initial: String },

    #[error("State {state} already has super state {existing}, cannot add it to {requested}")]
    MultipleSuperStates {
        state: String,
        existing: String,
        requested: String,
    },

    #[error("Making {super_state} the super state of {state} would create a cycle")]
    HierarchyCycle { state: String, super_state: String },

    #[error("Initial sub state {initial} of {state} is not among its declared sub states")]
    InitialStateNotAmongSubStates { state: String, initial: String },

    #[error(
        "Transition without guard has to be last for event {event} in state {state}; \
         no transition may follow it"
    )]
    TransitionWithoutGuardHasToBeLast { state: String, event: String },

    #[error("Only one transition without guard is allowed for event {event} in state {state}")]
    MultipleTransitionsWithoutGuard { state: String, event: String },

    #[error("Transition for event {event} was already added to state {state}")]
    TransitionAlreadyAdded { state: String, event: String },

    #[error("No states declared. Declare at least one state before building")]
    EmptyDefinition,
}
