//! Building blocks shared by the engine and the builder.
//!
//! - State and event identifiers, and the untyped event argument
//! - Action and guard holders with uniform invocation and descriptions
//! - History policies for composite states

mod action;
mod guard;
mod history;
mod id;

pub use action::{Action, ArgumentMismatch};
pub use guard::Guard;
pub use history::{HistoryRecord, HistoryType};
pub use id::{Argument, EventId, StateId};
