//! The runtime: state hierarchy, transitions and the machine driving them.
//!
//! States are stored in an arena and addressed by index. A fire walks from
//! the current leaf up the hierarchy until a transition accepts the event,
//! then exits and enters the states between source and target, records every
//! step on a [`TransitionContext`] and reports failures of user code to
//! extensions and subscribers.

mod context;
mod dictionary;
mod initializer;
mod machine;
mod notifier;
pub(crate) mod state;
mod transition;

pub use context::{Record, RecordKind, TransitionContext};
pub use machine::{FireOutcome, StateMachine};
pub use notifier::{TransitionCompletedEventArgs, TransitionEventArgs, TransitionExceptionEventArgs};

pub(crate) use transition::Transition;
