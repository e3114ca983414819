//! The synchronous state machine engine.

use super::context::TransitionContext;
use super::initializer::StateMachineInitializer;
use super::notifier::{
    Notifier, TransitionCompletedEventArgs, TransitionEventArgs, TransitionExceptionEventArgs,
};
use super::state::{Executor, StateGraph, StateIndex};
use super::transition::TransitionResult;
use crate::core::{Argument, EventId, StateId};
use crate::error::StateMachineError;
use crate::extension::{Extension, ExtensionHost, MachineInfo};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of firing an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FireOutcome {
    /// A transition fired; guard and action failures are on the context.
    Completed,
    /// No transition of the current state or its ancestors accepted the event.
    Declined,
}

/// Hierarchical state machine executing transitions on the caller's thread.
///
/// Lifecycle: built, then [`initialize`](Self::initialize)d exactly once, then
/// the initial state is entered with
/// [`enter_initial_state`](Self::enter_initial_state). Only afterwards can
/// events be fired.
///
/// ```rust
/// use hsm_engine::builder::StateMachineBuilder;
/// use hsm_engine::engine::FireOutcome;
///
/// let mut builder = StateMachineBuilder::new("door");
/// builder.in_state("Closed").on("open").goto("Open").unwrap();
/// builder.in_state("Open").on("close").goto("Closed").unwrap();
/// let mut machine = builder.build().unwrap();
///
/// machine.initialize("Closed").unwrap();
/// machine.enter_initial_state().unwrap();
///
/// assert_eq!(machine.fire("open").unwrap(), FireOutcome::Completed);
/// assert_eq!(machine.current_state_id().unwrap(), &"Open");
/// assert_eq!(machine.fire("open").unwrap(), FireOutcome::Declined);
/// ```
pub struct StateMachine<S, E> {
    pub(crate) name: String,
    pub(crate) graph: StateGraph<S, E>,
    pub(crate) extensions: ExtensionHost<S, E>,
    pub(crate) notifier: Notifier<S, E>,
    pub(crate) initial_state: Option<StateIndex>,
    pub(crate) current_state: Option<StateIndex>,
}

impl<S: StateId, E: EventId> StateMachine<S, E> {
    pub(crate) fn new(name: String, graph: StateGraph<S, E>) -> Self {
        Self {
            name,
            graph,
            extensions: ExtensionHost::new(),
            notifier: Notifier::new(),
            initial_state: None,
            current_state: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `initialize` was called or a checkpoint was loaded.
    pub fn is_initialized(&self) -> bool {
        self.initial_state.is_some() || self.current_state.is_some()
    }

    pub fn has_entered_initial_state(&self) -> bool {
        self.current_state.is_some()
    }

    /// The current leaf state.
    pub fn current_state_id(&self) -> Result<&S, StateMachineError> {
        self.current_index().map(|index| self.graph.id(index))
    }

    /// All declared state ids, in declaration order.
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.graph.nodes().map(|(_, node)| &node.id)
    }

    /// Set the state the machine starts in. Can be called once.
    ///
    /// Extensions may replace the state before it is validated.
    pub fn initialize(&mut self, initial_state: S) -> Result<(), StateMachineError> {
        if self.is_initialized() {
            return Err(StateMachineError::AlreadyInitialized);
        }

        let mut initial_state = initial_state;
        let info = MachineInfo::new(&self.name, None);
        self.extensions
            .for_each(|extension| extension.initializing_state_machine(&info, &mut initial_state));

        let index = self
            .graph
            .find(&initial_state)
            .ok_or_else(|| StateMachineError::UnknownState {
                state: format!("{initial_state:?}"),
            })?;
        self.initial_state = Some(index);
        info!(machine = %self.name, state = ?initial_state, "Initialized state machine");

        self.extensions
            .for_each(|extension| extension.initialized_state_machine(&info, &initial_state));
        Ok(())
    }

    /// Enter the initial state, its ancestors and its initial sub states.
    pub fn enter_initial_state(&mut self) -> Result<(), StateMachineError> {
        if self.current_state.is_some() {
            return Err(StateMachineError::InitialStateAlreadyEntered);
        }
        let initial = self.initial_state.ok_or(StateMachineError::NotInitialized)?;
        let initial_id = self.graph.id(initial);

        let info = MachineInfo::new(&self.name, None);
        self.extensions
            .for_each(|extension| extension.entering_initial_state(&info, initial_id));

        let mut context = TransitionContext::new(None, None, Argument::none(), &self.notifier);
        let executor = Executor::new(&self.graph, &self.extensions, info);
        let leaf = StateMachineInitializer::new(initial).enter_initial_state(&executor, &mut context);
        self.current_state = Some(leaf);

        let leaf_id = self.graph.id(leaf);
        debug!(
            machine = %self.name,
            state = ?leaf_id,
            trace = %context.records_summary(),
            "Entered initial state"
        );
        let info = MachineInfo::new(&self.name, Some(leaf_id));
        self.extensions.for_each(|extension| {
            extension.switched_state(&info, None, leaf_id);
            extension.entered_initial_state(&info, initial_id, &context);
        });
        Ok(())
    }

    /// Fire an event without argument.
    pub fn fire(&mut self, event: E) -> Result<FireOutcome, StateMachineError> {
        self.fire_with_argument(event, Argument::none())
    }

    /// Fire an event and run the selected transition to completion.
    ///
    /// Guard and action failures do not surface here: they are handed to
    /// extensions and exception subscribers. An `Err` means the machine was
    /// used before its initial state was entered.
    pub fn fire_with_argument(
        &mut self,
        event: E,
        argument: Argument,
    ) -> Result<FireOutcome, StateMachineError> {
        let current = self.current_index()?;
        let current_id = self.graph.id(current);
        let info = MachineInfo::new(&self.name, Some(current_id));

        let mut event = event;
        let mut argument = argument;
        self.extensions
            .for_each(|extension| extension.firing_event(&info, &mut event, &mut argument));
        debug!(machine = %self.name, state = ?current_id, event = ?event, "Firing event");

        let mut context = TransitionContext::new(
            Some((current, current_id.clone())),
            Some(event),
            argument,
            &self.notifier,
        );
        let executor = Executor::new(&self.graph, &self.extensions, info);

        let leaf = match executor.fire(current, &mut context) {
            TransitionResult::Fired(leaf) => leaf,
            TransitionResult::NotFired => {
                debug!(machine = %self.name, state = ?current_id, "Transition declined");
                self.notifier.transition_declined(&context);
                return Ok(FireOutcome::Declined);
            }
        };

        self.current_state = Some(leaf);
        let new_id = self.graph.id(leaf);
        debug!(
            machine = %self.name,
            state = ?new_id,
            trace = %context.records_summary(),
            "Transition completed"
        );

        let info = MachineInfo::new(&self.name, Some(new_id));
        self.extensions.for_each(|extension| {
            extension.switched_state(&info, Some(current_id), new_id);
            extension.fired_event(&info, &context);
        });
        self.notifier.transition_completed(&context, new_id);
        Ok(FireOutcome::Completed)
    }

    /// Register an extension; extensions run in registration order.
    pub fn add_extension(&mut self, extension: Arc<dyn Extension<S, E>>) {
        self.extensions.add(extension);
    }

    pub fn clear_extensions(&mut self) {
        self.extensions.clear();
    }

    /// Called after a guard passed and before any state is exited.
    pub fn on_transition_begin<F>(&mut self, handler: F)
    where
        F: Fn(&TransitionEventArgs<'_, S, E>) + Send + Sync + 'static,
    {
        self.notifier.subscribe_transition_begin(Box::new(handler));
    }

    pub fn on_transition_completed<F>(&mut self, handler: F)
    where
        F: Fn(&TransitionCompletedEventArgs<'_, S, E>) + Send + Sync + 'static,
    {
        self.notifier.subscribe_transition_completed(Box::new(handler));
    }

    pub fn on_transition_declined<F>(&mut self, handler: F)
    where
        F: Fn(&TransitionEventArgs<'_, S, E>) + Send + Sync + 'static,
    {
        self.notifier.subscribe_transition_declined(Box::new(handler));
    }

    /// Failures of guards and actions while firing an event.
    pub fn on_transition_exception_thrown<F>(&mut self, handler: F)
    where
        F: Fn(&TransitionExceptionEventArgs<'_, S, E>) + Send + Sync + 'static,
    {
        self.notifier
            .subscribe_transition_exception_thrown(Box::new(handler));
    }

    /// Failures of entry actions while entering the initial state.
    pub fn on_exception_thrown<F>(&mut self, handler: F)
    where
        F: Fn(&TransitionExceptionEventArgs<'_, S, E>) + Send + Sync + 'static,
    {
        self.notifier.subscribe_exception_thrown(Box::new(handler));
    }

    pub(crate) fn info(&self) -> MachineInfo<'_, S> {
        MachineInfo::new(
            &self.name,
            self.current_state.map(|index| self.graph.id(index)),
        )
    }

    pub(crate) fn extension_host(&self) -> &ExtensionHost<S, E> {
        &self.extensions
    }

    fn current_index(&self) -> Result<StateIndex, StateMachineError> {
        match (self.current_state, self.initial_state) {
            (Some(index), _) => Ok(index),
            (None, Some(_)) => Err(StateMachineError::InitialStateNotEntered),
            (None, None) => Err(StateMachineError::NotInitialized),
        }
    }
}

impl<S: StateId, E: EventId> fmt::Debug for StateMachine<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("name", &self.name)
            .field("states", &self.graph.len())
            .field("current_state", &self.current_state.map(|index| self.graph.id(index)))
            .field("extensions", &self.extensions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> StateMachine<&'static str, &'static str> {
        let mut graph = StateGraph::new();
        graph.get_or_create("A");
        graph.get_or_create("B");
        StateMachine::new("test".to_string(), graph)
    }

    #[test]
    fn lifecycle_is_enforced() {
        let mut machine = machine();

        assert!(matches!(
            machine.fire("go"),
            Err(StateMachineError::NotInitialized)
        ));
        assert!(matches!(
            machine.enter_initial_state(),
            Err(StateMachineError::NotInitialized)
        ));

        machine.initialize("A").unwrap();
        assert!(matches!(
            machine.initialize("A"),
            Err(StateMachineError::AlreadyInitialized)
        ));
        assert!(matches!(
            machine.current_state_id(),
            Err(StateMachineError::InitialStateNotEntered)
        ));

        machine.enter_initial_state().unwrap();
        assert_eq!(machine.current_state_id().unwrap(), &"A");
        assert!(matches!(
            machine.enter_initial_state(),
            Err(StateMachineError::InitialStateAlreadyEntered)
        ));
    }

    #[test]
    fn unknown_initial_state_is_rejected() {
        let mut machine = machine();

        let result = machine.initialize("Z");

        assert!(matches!(result, Err(StateMachineError::UnknownState { .. })));
        assert!(!machine.is_initialized());
    }

    #[test]
    fn unhandled_event_is_declined() {
        let mut machine = machine();
        machine.initialize("A").unwrap();
        machine.enter_initial_state().unwrap();

        assert_eq!(machine.fire("go").unwrap(), FireOutcome::Declined);
        assert_eq!(machine.current_state_id().unwrap(), &"A");
    }
}
