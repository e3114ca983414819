//! Fluent syntax for declaring one state.
//!
//! Each stage is its own type so only valid continuations compile:
//!
//! ```text
//! in_state(s)  -> StateSyntax       execute_on_entry* execute_on_exit* on
//! on(e)        -> EventSyntax       when goto execute
//! when(g)      -> GuardSyntax       goto execute
//! goto(t)      -> TransitionSyntax  execute* when otherwise on
//! otherwise()  -> OtherwiseSyntax   goto execute
//! ```
//!
//! A transition has at most one target: [`TransitionSyntax`] has no `goto`.

use crate::builder::error::BuildError;
use crate::core::{Action, EventId, Guard, StateId};
use crate::engine::state::{StateGraph, StateIndex};
use crate::engine::Transition;

/// Entry actions and the start of the declaration of a state.
pub struct StateSyntax<'b, S, E> {
    graph: &'b mut StateGraph<S, E>,
    state: StateIndex,
}

impl<'b, S: StateId, E: EventId> StateSyntax<'b, S, E> {
    pub(crate) fn new(graph: &'b mut StateGraph<S, E>, state: StateIndex) -> Self {
        Self { graph, state }
    }

    /// Run `action` whenever the state is entered.
    pub fn execute_on_entry(self, action: impl Into<Action>) -> Self {
        self.graph
            .node_mut(self.state)
            .entry_actions
            .push(action.into());
        self
    }

    /// Run `action` with a fixed `parameter` whenever the state is entered.
    pub fn execute_on_entry_parametrized<P, F>(self, action: F, parameter: P) -> Self
    where
        P: Send + Sync + 'static,
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.execute_on_entry(Action::with_parameter(action, parameter))
    }

    /// Run `action` whenever the state is exited.
    pub fn execute_on_exit(self, action: impl Into<Action>) -> ExitActionSyntax<'b, S, E> {
        ExitActionSyntax {
            graph: self.graph,
            state: self.state,
        }
        .execute_on_exit(action)
    }

    pub fn execute_on_exit_parametrized<P, F>(
        self,
        action: F,
        parameter: P,
    ) -> ExitActionSyntax<'b, S, E>
    where
        P: Send + Sync + 'static,
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.execute_on_exit(Action::with_parameter(action, parameter))
    }

    /// Declare transitions for `event`.
    pub fn on(self, event: E) -> EventSyntax<'b, S, E> {
        EventSyntax {
            graph: self.graph,
            state: self.state,
            event,
        }
    }
}

/// Exit actions; entry actions can no longer be added.
pub struct ExitActionSyntax<'b, S, E> {
    graph: &'b mut StateGraph<S, E>,
    state: StateIndex,
}

impl<'b, S: StateId, E: EventId> ExitActionSyntax<'b, S, E> {
    pub fn execute_on_exit(self, action: impl Into<Action>) -> Self {
        self.graph
            .node_mut(self.state)
            .exit_actions
            .push(action.into());
        self
    }

    pub fn execute_on_exit_parametrized<P, F>(self, action: F, parameter: P) -> Self
    where
        P: Send + Sync + 'static,
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.execute_on_exit(Action::with_parameter(action, parameter))
    }

    pub fn on(self, event: E) -> EventSyntax<'b, S, E> {
        EventSyntax {
            graph: self.graph,
            state: self.state,
            event,
        }
    }
}

/// First transition of an event.
pub struct EventSyntax<'b, S, E> {
    graph: &'b mut StateGraph<S, E>,
    state: StateIndex,
    event: E,
}

impl<'b, S: StateId, E: EventId> EventSyntax<'b, S, E> {
    /// Guard the transition declared next.
    pub fn when(self, guard: impl Into<Guard>) -> GuardSyntax<'b, S, E> {
        GuardSyntax {
            graph: self.graph,
            state: self.state,
            event: self.event,
            guard: guard.into(),
        }
    }

    /// Unguarded transition to `target`.
    pub fn goto(self, target: S) -> Result<TransitionSyntax<'b, S, E>, BuildError> {
        add_transition(self.graph, self.state, self.event, Some(target), None, None)
    }

    /// Unguarded internal transition running `action`.
    pub fn execute(self, action: impl Into<Action>) -> Result<TransitionSyntax<'b, S, E>, BuildError> {
        add_transition(
            self.graph,
            self.state,
            self.event,
            None,
            None,
            Some(action.into()),
        )
    }
}

/// A guard waiting for its transition.
pub struct GuardSyntax<'b, S, E> {
    graph: &'b mut StateGraph<S, E>,
    state: StateIndex,
    event: E,
    guard: Guard,
}

impl<'b, S: StateId, E: EventId> GuardSyntax<'b, S, E> {
    pub fn goto(self, target: S) -> Result<TransitionSyntax<'b, S, E>, BuildError> {
        add_transition(
            self.graph,
            self.state,
            self.event,
            Some(target),
            Some(self.guard),
            None,
        )
    }

    /// Guarded internal transition running `action`.
    pub fn execute(self, action: impl Into<Action>) -> Result<TransitionSyntax<'b, S, E>, BuildError> {
        add_transition(
            self.graph,
            self.state,
            self.event,
            None,
            Some(self.guard),
            Some(action.into()),
        )
    }
}

/// A declared transition accepting further actions.
pub struct TransitionSyntax<'b, S, E> {
    graph: &'b mut StateGraph<S, E>,
    state: StateIndex,
    event: E,
    position: usize,
}

impl<'b, S: StateId, E: EventId> TransitionSyntax<'b, S, E> {
    /// Append an action to this transition.
    pub fn execute(self, action: impl Into<Action>) -> Self {
        self.graph
            .node_mut(self.state)
            .transitions
            .add_action(&self.event, self.position, action.into());
        self
    }

    /// Append an argument-typed action to this transition.
    pub fn execute_with_argument<T, F>(self, action: F) -> Self
    where
        T: std::any::Any,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.execute(Action::with_argument(action))
    }

    /// Next guarded candidate for the same event.
    pub fn when(self, guard: impl Into<Guard>) -> GuardSyntax<'b, S, E> {
        GuardSyntax {
            graph: self.graph,
            state: self.state,
            event: self.event,
            guard: guard.into(),
        }
    }

    /// Fallback candidate taken when no guard before it passed.
    pub fn otherwise(self) -> OtherwiseSyntax<'b, S, E> {
        OtherwiseSyntax {
            graph: self.graph,
            state: self.state,
            event: self.event,
        }
    }

    /// Continue with another event of the same state.
    pub fn on(self, event: E) -> EventSyntax<'b, S, E> {
        EventSyntax {
            graph: self.graph,
            state: self.state,
            event,
        }
    }
}

/// The guard-less fallback of an event.
pub struct OtherwiseSyntax<'b, S, E> {
    graph: &'b mut StateGraph<S, E>,
    state: StateIndex,
    event: E,
}

impl<'b, S: StateId, E: EventId> OtherwiseSyntax<'b, S, E> {
    pub fn goto(self, target: S) -> Result<TransitionSyntax<'b, S, E>, BuildError> {
        add_transition(self.graph, self.state, self.event, Some(target), None, None)
    }

    pub fn execute(self, action: impl Into<Action>) -> Result<TransitionSyntax<'b, S, E>, BuildError> {
        add_transition(
            self.graph,
            self.state,
            self.event,
            None,
            None,
            Some(action.into()),
        )
    }
}

fn add_transition<'b, S: StateId, E: EventId>(
    graph: &'b mut StateGraph<S, E>,
    state: StateIndex,
    event: E,
    target: Option<S>,
    guard: Option<Guard>,
    action: Option<Action>,
) -> Result<TransitionSyntax<'b, S, E>, BuildError> {
    let target = target.map(|target| graph.get_or_create(target));
    let mut transition = Transition::new(target, guard);
    transition.actions.extend(action);

    let state_id = graph.id(state).clone();
    let position = graph
        .node_mut(state)
        .transitions
        .add(event.clone(), transition, state, &state_id)?;

    Ok(TransitionSyntax {
        graph,
        state,
        event,
        position,
    })
}
