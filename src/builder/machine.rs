//! Builder for declaring states, hierarchies and transitions.

use crate::builder::error::BuildError;
use crate::builder::hierarchy::HierarchySyntax;
use crate::builder::syntax::StateSyntax;
use crate::core::{EventId, HistoryType, StateId};
use crate::engine::state::StateGraph;
use crate::engine::StateMachine;
use tracing::debug;

/// Builder for a [`StateMachine`].
///
/// States are created on first reference, whether as the subject of
/// [`in_state`](Self::in_state), a transition target or a member of a
/// hierarchy. Declaration mistakes are reported by the call making them.
pub struct StateMachineBuilder<S, E> {
    name: String,
    graph: StateGraph<S, E>,
}

impl<S: StateId, E: EventId> StateMachineBuilder<S, E> {
    /// Create a builder for a machine with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph: StateGraph::new(),
        }
    }

    /// Declare entry/exit actions and transitions of `state`.
    pub fn in_state(&mut self, state: S) -> StateSyntax<'_, S, E> {
        let index = self.graph.get_or_create(state);
        StateSyntax::new(&mut self.graph, index)
    }

    /// Declare the sub states of `super_state` step by step.
    pub fn define_hierarchy_on(&mut self, super_state: S) -> HierarchySyntax<'_, S, E> {
        let index = self.graph.get_or_create(super_state);
        HierarchySyntax::new(&mut self.graph, index)
    }

    /// Declare a complete hierarchy level at once.
    ///
    /// `initial_sub_state` has to be one of `sub_states`.
    pub fn define_hierarchy<I>(
        &mut self,
        super_state: S,
        initial_sub_state: S,
        history_type: HistoryType,
        sub_states: I,
    ) -> Result<(), BuildError>
    where
        I: IntoIterator<Item = S>,
    {
        let sub_states: Vec<S> = sub_states.into_iter().collect();
        if !sub_states.contains(&initial_sub_state) {
            return Err(BuildError::InitialStateNotAmongSubStates {
                state: format!("{super_state:?}"),
                initial: format!("{initial_sub_state:?}"),
            });
        }

        for sub_state in &sub_states {
            self.graph.check_super_state(sub_state, &super_state)?;
        }

        let mut syntax = self
            .define_hierarchy_on(super_state)
            .with_history_type(history_type)
            .with_initial_sub_state(initial_sub_state.clone())?;
        for sub_state in sub_states {
            if sub_state != initial_sub_state {
                syntax = syntax.with_sub_state(sub_state)?;
            }
        }
        Ok(())
    }

    /// Finish the declaration.
    pub fn build(self) -> Result<StateMachine<S, E>, BuildError> {
        if self.graph.is_empty() {
            return Err(BuildError::EmptyDefinition);
        }
        debug!(machine = %self.name, states = self.graph.len(), "Built state machine");
        Ok(StateMachine::new(self.name, self.graph))
    }
}
