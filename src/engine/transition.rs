//! A single transition and the exit/action/entry traversal it performs.

use super::context::TransitionContext;
use super::state::{Executor, StateIndex};
use crate::core::{Action, EventId, Guard, StateId};
use tracing::debug;

/// Outcome of offering an event to a transition or a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TransitionResult {
    /// The transition fired; holds the leaf state the machine ends in.
    Fired(StateIndex),
    NotFired,
}

impl TransitionResult {
    pub(crate) fn is_fired(&self) -> bool {
        matches!(self, TransitionResult::Fired(_))
    }
}

/// Transition declared on a state for one event.
///
/// Without a target the transition is internal: only its actions run and
/// the current state is kept.
#[derive(Debug)]
pub(crate) struct Transition {
    pub(crate) source: Option<StateIndex>,
    pub(crate) target: Option<StateIndex>,
    pub(crate) guard: Option<Guard>,
    pub(crate) actions: Vec<Action>,
}

impl Transition {
    pub(crate) fn new(target: Option<StateIndex>, guard: Option<Guard>) -> Self {
        Self {
            source: None,
            target,
            guard,
            actions: Vec::new(),
        }
    }

    /// Fire if the guard allows it.
    ///
    /// `source` is the state declaring this transition; the context holds the
    /// current leaf, which is the source itself or one of its descendants.
    pub(crate) fn fire<S: StateId, E: EventId>(
        &self,
        executor: &Executor<'_, S, E>,
        source: StateIndex,
        context: &mut TransitionContext<'_, S, E>,
    ) -> TransitionResult {
        if !self.should_fire(executor, source, context) {
            return TransitionResult::NotFired;
        }

        context.transition_begin();

        let Some(target) = self.target else {
            debug!(source = ?executor.graph().id(source), "Executing internal transition");
            self.perform_actions(executor, source, context);
            return TransitionResult::Fired(context.state_index().unwrap_or(source));
        };

        debug!(
            source = ?executor.graph().id(source),
            target = ?executor.graph().id(target),
            "Executing transition"
        );
        self.unwind_sub_states(executor, source, context);
        self.traverse(executor, source, source, target, context);
        TransitionResult::Fired(executor.enter_by_history(target, context))
    }

    fn should_fire<S: StateId, E: EventId>(
        &self,
        executor: &Executor<'_, S, E>,
        source: StateIndex,
        context: &mut TransitionContext<'_, S, E>,
    ) -> bool {
        let Some(guard) = &self.guard else {
            return true;
        };
        match guard.execute(context.argument()) {
            Ok(allowed) => allowed,
            Err(error) => {
                executor.handle_guard_failure(source, self, context, error);
                false
            }
        }
    }

    /// Exit from the current leaf up to, but excluding, the source.
    fn unwind_sub_states<S: StateId, E: EventId>(
        &self,
        executor: &Executor<'_, S, E>,
        source: StateIndex,
        context: &mut TransitionContext<'_, S, E>,
    ) {
        let mut current = context.state_index();
        while let Some(index) = current {
            if index == source {
                break;
            }
            executor.exit(index, context);
            current = executor.graph().node(index).super_state;
        }
    }

    /// Walk from `from` towards `to`, exiting and entering the states between.
    ///
    /// `to` starts at the final target and moves up the hierarchy on recursion;
    /// `from` starts at the declaring state.
    fn traverse<S: StateId, E: EventId>(
        &self,
        executor: &Executor<'_, S, E>,
        source: StateIndex,
        from: StateIndex,
        to: StateIndex,
        context: &mut TransitionContext<'_, S, E>,
    ) {
        let graph = executor.graph();
        let final_target = self.target;
        let from_node = graph.node(from);
        let to_node = graph.node(to);

        if Some(from) == final_target {
            // self transition
            executor.exit(from, context);
            self.perform_actions(executor, source, context);
            executor.entry(from, context);
        } else if from == to {
            // target is a descendant of the declaring state
            self.perform_actions(executor, source, context);
        } else if from_node.super_state == to_node.super_state {
            executor.exit(from, context);
            self.perform_actions(executor, source, context);
            executor.entry(to, context);
        } else if from_node.level > to_node.level {
            executor.exit(from, context);
            match from_node.super_state {
                Some(parent) => self.traverse(executor, source, parent, to, context),
                None => self.perform_actions(executor, source, context),
            }
        } else if from_node.level < to_node.level {
            match to_node.super_state {
                Some(parent) => self.traverse(executor, source, from, parent, context),
                None => self.perform_actions(executor, source, context),
            }
            executor.entry(to, context);
        } else {
            executor.exit(from, context);
            match (from_node.super_state, to_node.super_state) {
                (Some(from_parent), Some(to_parent)) => {
                    self.traverse(executor, source, from_parent, to_parent, context)
                }
                _ => self.perform_actions(executor, source, context),
            }
            executor.entry(to, context);
        }
    }

    fn perform_actions<S: StateId, E: EventId>(
        &self,
        executor: &Executor<'_, S, E>,
        source: StateIndex,
        context: &mut TransitionContext<'_, S, E>,
    ) {
        for action in &self.actions {
            if let Err(error) = action.execute(context.argument()) {
                executor.handle_transition_failure(source, self, context, error);
            }
        }
    }
}
