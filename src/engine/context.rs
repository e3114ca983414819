//! Per-call record of a fire or initialization.

use super::notifier::Notifier;
use super::state::StateIndex;
use crate::core::Argument;
use crate::error::BoxError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use tracing::warn;

/// Whether a state was entered or exited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Enter,
    Exit,
}

/// One step of the traversal performed by a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record<S> {
    pub state: S,
    pub kind: RecordKind,
}

impl<S: Debug> fmt::Display for Record<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RecordKind::Enter => write!(f, "Enter {:?}", self.state),
            RecordKind::Exit => write!(f, "Exit {:?}", self.state),
        }
    }
}

/// Mutable record carried through one `fire` or initial-state entry.
///
/// Holds the firing event and argument, the trace of entered and exited
/// states, and every failure caught from guards and actions. Discarded
/// once the call returns.
pub struct TransitionContext<'n, S, E> {
    state: Option<(StateIndex, S)>,
    event: Option<E>,
    argument: Argument,
    records: Vec<Record<S>>,
    exceptions: Vec<BoxError>,
    notifier: &'n Notifier<S, E>,
}

impl<'n, S, E> TransitionContext<'n, S, E> {
    pub(crate) fn new(
        state: Option<(StateIndex, S)>,
        event: Option<E>,
        argument: Argument,
        notifier: &'n Notifier<S, E>,
    ) -> Self {
        Self {
            state,
            event,
            argument,
            records: Vec::new(),
            exceptions: Vec::new(),
            notifier,
        }
    }

    /// State the event was fired in; `None` while entering the initial state.
    pub fn state_id(&self) -> Option<&S> {
        self.state.as_ref().map(|(_, id)| id)
    }

    /// The firing event; `None` while entering the initial state.
    pub fn event_id(&self) -> Option<&E> {
        self.event.as_ref()
    }

    pub fn argument(&self) -> &Argument {
        &self.argument
    }

    /// States entered and exited so far, in order.
    pub fn records(&self) -> &[Record<S>] {
        &self.records
    }

    /// Failures caught so far, after extension overrides.
    pub fn exceptions(&self) -> &[BoxError] {
        &self.exceptions
    }

    pub fn has_exceptions(&self) -> bool {
        !self.exceptions.is_empty()
    }

    pub(crate) fn state_index(&self) -> Option<StateIndex> {
        self.state.as_ref().map(|(index, _)| *index)
    }

    pub(crate) fn add_record(&mut self, state: S, kind: RecordKind) {
        self.records.push(Record { state, kind });
    }

    pub(crate) fn transition_begin(&self) {
        self.notifier.transition_begin(self);
    }

    /// Notify subscribers of the failure and keep it on the context.
    pub(crate) fn exception_thrown(&mut self, error: BoxError)
    where
        S: Debug,
        E: Debug,
    {
        let during_transition = self.event.is_some();
        if !self.notifier.has_exception_subscribers(during_transition) {
            warn!(
                state = ?self.state_id(),
                event = ?self.event,
                error = %error,
                "Unobserved failure in guard or action"
            );
        }
        self.notifier.exception_thrown(self, &error);
        self.exceptions.push(error);
    }
}

impl<S: Debug, E> TransitionContext<'_, S, E> {
    /// Trace rendered as `Exit A -> Enter B`.
    pub fn records_summary(&self) -> String {
        self.records
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl<S: Debug, E: Debug> Debug for TransitionContext<'_, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionContext")
            .field("state", &self.state_id())
            .field("event", &self.event)
            .field("argument", &self.argument)
            .field("records", &self.records)
            .field("exceptions", &self.exceptions.len())
            .finish()
    }
}
