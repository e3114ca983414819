//! Entering the initial state of a machine.

use super::context::TransitionContext;
use super::state::{Executor, StateIndex};
use crate::core::{EventId, StateId};

/// Enters the configured initial state together with all its ancestors.
pub(crate) struct StateMachineInitializer {
    initial_state: StateIndex,
}

impl StateMachineInitializer {
    pub(crate) fn new(initial_state: StateIndex) -> Self {
        Self { initial_state }
    }

    /// Enter every state from the root down to the initial state, then resolve
    /// the initial state's sub hierarchy by its history type.
    ///
    /// Returns the leaf the machine starts in.
    pub(crate) fn enter_initial_state<S: StateId, E: EventId>(
        &self,
        executor: &Executor<'_, S, E>,
        context: &mut TransitionContext<'_, S, E>,
    ) -> StateIndex {
        let graph = executor.graph();
        let mut path = Vec::new();
        let mut current = Some(self.initial_state);
        while let Some(index) = current {
            path.push(index);
            current = graph.node(index).super_state;
        }

        for index in path.into_iter().rev() {
            executor.entry(index, context);
        }
        executor.enter_by_history(self.initial_state, context)
    }
}
