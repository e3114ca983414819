//! States of the hierarchy and the logic local to them.
//!
//! States live in an arena owned by the machine and refer to each other by
//! index. The hierarchy is fixed once the machine is built; only the
//! last-active (history) pointers change at runtime.

use super::context::{RecordKind, TransitionContext};
use super::dictionary::TransitionDictionary;
use super::transition::{Transition, TransitionResult};
use crate::builder::BuildError;
use crate::core::{Action, EventId, HistoryType, StateId};
use crate::error::BoxError;
use crate::extension::{ExtensionHost, MachineInfo, TransitionInfo};
use std::cell::Cell;
use std::collections::HashMap;
use tracing::debug;

/// Position of a state in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct StateIndex(pub(crate) usize);

/// One node of the state hierarchy.
pub(crate) struct StateNode<S, E> {
    pub(crate) id: S,
    pub(crate) super_state: Option<StateIndex>,
    pub(crate) sub_states: Vec<StateIndex>,
    pub(crate) initial_state: Option<StateIndex>,
    pub(crate) last_active: Cell<Option<StateIndex>>,
    pub(crate) entry_actions: Vec<Action>,
    pub(crate) exit_actions: Vec<Action>,
    pub(crate) transitions: TransitionDictionary<E>,
    pub(crate) level: usize,
    pub(crate) history_type: HistoryType,
}

impl<S, E: EventId> StateNode<S, E> {
    fn new(id: S) -> Self {
        Self {
            id,
            super_state: None,
            sub_states: Vec::new(),
            initial_state: None,
            last_active: Cell::new(None),
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            transitions: TransitionDictionary::new(),
            level: 1,
            history_type: HistoryType::None,
        }
    }
}

/// Arena of all states of a machine.
pub(crate) struct StateGraph<S, E> {
    states: Vec<StateNode<S, E>>,
    index: HashMap<S, StateIndex>,
}

impl<S: StateId, E: EventId> StateGraph<S, E> {
    pub(crate) fn new() -> Self {
        Self {
            states: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.states.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Look up a state, creating it on first reference.
    pub(crate) fn get_or_create(&mut self, id: S) -> StateIndex {
        if let Some(index) = self.index.get(&id) {
            return *index;
        }
        let index = StateIndex(self.states.len());
        self.states.push(StateNode::new(id.clone()));
        self.index.insert(id, index);
        index
    }

    pub(crate) fn find(&self, id: &S) -> Option<StateIndex> {
        self.index.get(id).copied()
    }

    pub(crate) fn node(&self, index: StateIndex) -> &StateNode<S, E> {
        &self.states[index.0]
    }

    pub(crate) fn node_mut(&mut self, index: StateIndex) -> &mut StateNode<S, E> {
        &mut self.states[index.0]
    }

    pub(crate) fn id(&self, index: StateIndex) -> &S {
        &self.node(index).id
    }

    /// All states in declaration order.
    pub(crate) fn nodes(&self) -> impl Iterator<Item = (StateIndex, &StateNode<S, E>)> {
        self.states
            .iter()
            .enumerate()
            .map(|(position, node)| (StateIndex(position), node))
    }

    /// Attach `child` below `parent`, recomputing levels of the moved subtree.
    pub(crate) fn set_super_state(
        &mut self,
        child: StateIndex,
        parent: StateIndex,
    ) -> Result<(), BuildError> {
        if self.validate_super_state(child, parent)? {
            return Ok(());
        }

        self.node_mut(child).super_state = Some(parent);
        self.node_mut(parent).sub_states.push(child);
        let level = self.node(parent).level + 1;
        self.set_level(child, level);
        Ok(())
    }

    /// Check that `child` could be attached below `parent` without changing
    /// anything. States not declared yet can always be attached.
    pub(crate) fn check_super_state(&self, child: &S, parent: &S) -> Result<(), BuildError> {
        if child == parent {
            return Err(BuildError::SelfSuperState {
                state: format!("{child:?}"),
            });
        }
        match (self.find(child), self.find(parent)) {
            (Some(child), Some(parent)) => self.validate_super_state(child, parent).map(|_| ()),
            _ => Ok(()),
        }
    }

    /// Returns whether `child` is already attached below `parent`.
    fn validate_super_state(&self, child: StateIndex, parent: StateIndex) -> Result<bool, BuildError> {
        if child == parent {
            return Err(BuildError::SelfSuperState {
                state: format!("{:?}", self.id(child)),
            });
        }

        match self.node(child).super_state {
            Some(existing) if existing == parent => return Ok(true),
            Some(existing) => {
                return Err(BuildError::MultipleSuperStates {
                    state: format!("{:?}", self.id(child)),
                    existing: format!("{:?}", self.id(existing)),
                    requested: format!("{:?}", self.id(parent)),
                })
            }
            None => {}
        }

        if self.is_ancestor(child, parent) {
            return Err(BuildError::HierarchyCycle {
                state: format!("{:?}", self.id(child)),
                super_state: format!("{:?}", self.id(parent)),
            });
        }
        Ok(false)
    }

    /// Designate the initial sub state; also seeds the history pointer.
    pub(crate) fn set_initial_state(
        &mut self,
        parent: StateIndex,
        initial: StateIndex,
    ) -> Result<(), BuildError> {
        if parent == initial {
            return Err(BuildError::SelfInitialState {
                state: format!("{:?}", self.id(parent)),
            });
        }
        if self.node(initial).super_state != Some(parent) {
            return Err(BuildError::InitialStateNotSubState {
                state: format!("{:?}", self.id(parent)),
                initial: format!("{:?}", self.id(initial)),
            });
        }

        let node = self.node_mut(parent);
        node.initial_state = Some(initial);
        node.last_active.set(Some(initial));
        Ok(())
    }

    /// Whether `ancestor` lies on the super-state chain of `state` (or is it).
    fn is_ancestor(&self, ancestor: StateIndex, state: StateIndex) -> bool {
        let mut current = Some(state);
        while let Some(index) = current {
            if index == ancestor {
                return true;
            }
            current = self.node(index).super_state;
        }
        false
    }

    fn set_level(&mut self, index: StateIndex, level: usize) {
        let node = self.node_mut(index);
        node.level = level;
        let sub_states = node.sub_states.clone();
        for sub_state in sub_states {
            self.set_level(sub_state, level + 1);
        }
    }
}

/// Runtime view over the graph used while executing one call.
///
/// Bundles the graph with the extensions and machine information needed
/// to report failures.
pub(crate) struct Executor<'a, S, E> {
    graph: &'a StateGraph<S, E>,
    extensions: &'a ExtensionHost<S, E>,
    info: MachineInfo<'a, S>,
}

impl<'a, S: StateId, E: EventId> Executor<'a, S, E> {
    pub(crate) fn new(
        graph: &'a StateGraph<S, E>,
        extensions: &'a ExtensionHost<S, E>,
        info: MachineInfo<'a, S>,
    ) -> Self {
        Self {
            graph,
            extensions,
            info,
        }
    }

    pub(crate) fn graph(&self) -> &'a StateGraph<S, E> {
        self.graph
    }

    /// Offer the event to `index`'s transitions, then bubble up to its ancestors.
    pub(crate) fn fire(
        &self,
        index: StateIndex,
        context: &mut TransitionContext<'_, S, E>,
    ) -> TransitionResult {
        let Some(event) = context.event_id().cloned() else {
            return TransitionResult::NotFired;
        };

        let node = self.graph.node(index);
        if let Some(candidates) = node.transitions.get(&event) {
            for transition in candidates {
                let result = transition.fire(self, index, context);
                if result.is_fired() {
                    return result;
                }
            }
        }

        match node.super_state {
            Some(super_state) => self.fire(super_state, context),
            None => TransitionResult::NotFired,
        }
    }

    pub(crate) fn entry(&self, index: StateIndex, context: &mut TransitionContext<'_, S, E>) {
        let node = self.graph.node(index);
        debug!(state = ?node.id, "Entering state");
        context.add_record(node.id.clone(), RecordKind::Enter);

        for action in &node.entry_actions {
            if let Err(error) = action.execute(context.argument()) {
                self.handle_entry_action_failure(index, context, error);
            }
        }
    }

    pub(crate) fn exit(&self, index: StateIndex, context: &mut TransitionContext<'_, S, E>) {
        let node = self.graph.node(index);
        debug!(state = ?node.id, "Exiting state");
        context.add_record(node.id.clone(), RecordKind::Exit);

        for action in &node.exit_actions {
            if let Err(error) = action.execute(context.argument()) {
                self.handle_exit_action_failure(index, context, error);
            }
        }

        if let Some(super_state) = node.super_state {
            self.graph.node(super_state).last_active.set(Some(index));
        }
    }

    /// Enter the sub hierarchy of `index` according to its history type.
    ///
    /// `index` itself is already entered. Returns the resulting leaf.
    pub(crate) fn enter_by_history(
        &self,
        index: StateIndex,
        context: &mut TransitionContext<'_, S, E>,
    ) -> StateIndex {
        let node = self.graph.node(index);
        match node.history_type {
            HistoryType::None => match node.initial_state {
                Some(initial) => self.enter_shallow(initial, context),
                None => index,
            },
            HistoryType::Shallow => match node.last_active.get() {
                Some(last_active) => self.enter_shallow(last_active, context),
                None => index,
            },
            HistoryType::Deep => match node.last_active.get() {
                Some(last_active) => self.enter_deep(last_active, context),
                None => index,
            },
        }
    }

    /// Enter `index`, then follow initial sub states down to a leaf.
    pub(crate) fn enter_shallow(
        &self,
        index: StateIndex,
        context: &mut TransitionContext<'_, S, E>,
    ) -> StateIndex {
        self.entry(index, context);
        match self.graph.node(index).initial_state {
            Some(initial) => self.enter_shallow(initial, context),
            None => index,
        }
    }

    /// Enter `index`, then follow last-active sub states down to a leaf.
    pub(crate) fn enter_deep(
        &self,
        index: StateIndex,
        context: &mut TransitionContext<'_, S, E>,
    ) -> StateIndex {
        self.entry(index, context);
        match self.graph.node(index).last_active.get() {
            Some(last_active) => self.enter_deep(last_active, context),
            None => index,
        }
    }

    fn handle_entry_action_failure(
        &self,
        index: StateIndex,
        context: &mut TransitionContext<'_, S, E>,
        mut error: BoxError,
    ) {
        let state = self.graph.id(index);
        self.extensions.for_each(|extension| {
            extension.handling_entry_action_exception(&self.info, state, context, &mut error)
        });
        context.exception_thrown(error);
        if let Some(error) = context.exceptions().last() {
            self.extensions.for_each(|extension| {
                extension.handled_entry_action_exception(&self.info, state, context, error)
            });
        }
    }

    fn handle_exit_action_failure(
        &self,
        index: StateIndex,
        context: &mut TransitionContext<'_, S, E>,
        mut error: BoxError,
    ) {
        let state = self.graph.id(index);
        self.extensions.for_each(|extension| {
            extension.handling_exit_action_exception(&self.info, state, context, &mut error)
        });
        context.exception_thrown(error);
        if let Some(error) = context.exceptions().last() {
            self.extensions.for_each(|extension| {
                extension.handled_exit_action_exception(&self.info, state, context, error)
            });
        }
    }

    pub(crate) fn handle_guard_failure(
        &self,
        source: StateIndex,
        transition: &Transition,
        context: &mut TransitionContext<'_, S, E>,
        mut error: BoxError,
    ) {
        let info = self.transition_info(source, transition);
        self.extensions.for_each(|extension| {
            extension.handling_guard_exception(&self.info, &info, context, &mut error)
        });
        context.exception_thrown(error);
        if let Some(error) = context.exceptions().last() {
            self.extensions.for_each(|extension| {
                extension.handled_guard_exception(&self.info, &info, context, error)
            });
        }
    }

    pub(crate) fn handle_transition_failure(
        &self,
        source: StateIndex,
        transition: &Transition,
        context: &mut TransitionContext<'_, S, E>,
        mut error: BoxError,
    ) {
        let info = self.transition_info(source, transition);
        self.extensions.for_each(|extension| {
            extension.handling_transition_exception(&self.info, &info, context, &mut error)
        });
        context.exception_thrown(error);
        if let Some(error) = context.exceptions().last() {
            self.extensions.for_each(|extension| {
                extension.handled_transition_exception(&self.info, &info, context, error)
            });
        }
    }

    fn transition_info<'t>(
        &'t self,
        source: StateIndex,
        transition: &'t Transition,
    ) -> TransitionInfo<'t, S> {
        let graph: &'t StateGraph<S, E> = self.graph;
        TransitionInfo::new(
            graph.id(source),
            transition.target.map(|index| graph.id(index)),
            transition.guard.as_ref().map(|guard| guard.describe()),
        )
    }
}
