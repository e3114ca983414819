//! Step-wise declaration of a super state's sub states.
//!
//! `define_hierarchy_on(s)` starts at [`HierarchySyntax`]; the history type
//! comes first, then the initial sub state, then any further sub states.

use crate::builder::error::BuildError;
use crate::core::{EventId, HistoryType, StateId};
use crate::engine::state::{StateGraph, StateIndex};

/// Choose the history type of the super state.
pub struct HierarchySyntax<'b, S, E> {
    graph: &'b mut StateGraph<S, E>,
    super_state: StateIndex,
}

impl<'b, S: StateId, E: EventId> HierarchySyntax<'b, S, E> {
    pub(crate) fn new(graph: &'b mut StateGraph<S, E>, super_state: StateIndex) -> Self {
        Self { graph, super_state }
    }

    pub fn with_history_type(self, history_type: HistoryType) -> InitialSubStateSyntax<'b, S, E> {
        self.graph.node_mut(self.super_state).history_type = history_type;
        InitialSubStateSyntax {
            graph: self.graph,
            super_state: self.super_state,
        }
    }
}

/// Declare the initial sub state.
pub struct InitialSubStateSyntax<'b, S, E> {
    graph: &'b mut StateGraph<S, E>,
    super_state: StateIndex,
}

impl<'b, S: StateId, E: EventId> InitialSubStateSyntax<'b, S, E> {
    pub fn with_initial_sub_state(self, state: S) -> Result<SubStateSyntax<'b, S, E>, BuildError> {
        let sub_state = self.graph.get_or_create(state);
        self.graph.set_super_state(sub_state, self.super_state)?;
        self.graph.set_initial_state(self.super_state, sub_state)?;
        Ok(SubStateSyntax {
            graph: self.graph,
            super_state: self.super_state,
        })
    }
}

/// Declare further sub states.
pub struct SubStateSyntax<'b, S, E> {
    graph: &'b mut StateGraph<S, E>,
    super_state: StateIndex,
}

impl<'b, S: StateId, E: EventId> SubStateSyntax<'b, S, E> {
    pub fn with_sub_state(self, state: S) -> Result<Self, BuildError> {
        let sub_state = self.graph.get_or_create(state);
        self.graph.set_super_state(sub_state, self.super_state)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{BuildError, StateMachineBuilder};
    use crate::core::HistoryType;

    #[test]
    fn hierarchy_syntax_declares_levels() {
        let mut builder: StateMachineBuilder<&str, &str> = StateMachineBuilder::new("test");
        builder
            .define_hierarchy_on("D")
            .with_history_type(HistoryType::Deep)
            .with_initial_sub_state("D1")
            .and_then(|syntax| syntax.with_sub_state("D2"))
            .unwrap();

        let machine = builder.build().unwrap();
        let d = machine.graph.find(&"D").unwrap();
        let d1 = machine.graph.find(&"D1").unwrap();
        let d2 = machine.graph.find(&"D2").unwrap();

        assert_eq!(machine.graph.node(d).history_type, HistoryType::Deep);
        assert_eq!(machine.graph.node(d).initial_state, Some(d1));
        assert_eq!(machine.graph.node(d).sub_states, vec![d1, d2]);
        assert_eq!(machine.graph.node(d2).level, 2);
    }

    #[test]
    fn super_state_cannot_be_its_own_sub_state() {
        let mut builder: StateMachineBuilder<&str, &str> = StateMachineBuilder::new("test");

        let result = builder
            .define_hierarchy_on("A")
            .with_history_type(HistoryType::None)
            .with_initial_sub_state("A");

        assert!(matches!(result, Err(BuildError::SelfSuperState { .. })));
    }
}
