//! Extension points observing and overriding a running machine.
//!
//! Extensions are invoked in registration order at every lifecycle point.
//! Hooks named `handling_*`, `initializing_*` and `firing_*` receive the
//! in-flight value mutably and may replace it; the paired `handled_*`,
//! `initialized_*` and `fired_*` hooks are informational.

use crate::core::{Argument, EventId, StateId};
use crate::engine::TransitionContext;
use crate::error::BoxError;
use std::fmt;
use std::sync::Arc;

/// Read-only view of the machine handed to extensions.
#[derive(Clone, Copy, Debug)]
pub struct MachineInfo<'a, S> {
    name: &'a str,
    current_state: Option<&'a S>,
}

impl<'a, S> MachineInfo<'a, S> {
    pub(crate) fn new(name: &'a str, current_state: Option<&'a S>) -> Self {
        Self {
            name,
            current_state,
        }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The current state, `None` before the initial state is entered.
    pub fn current_state_id(&self) -> Option<&'a S> {
        self.current_state
    }
}

/// Description of the transition whose guard or action failed.
#[derive(Clone, Copy, Debug)]
pub struct TransitionInfo<'a, S> {
    source: &'a S,
    target: Option<&'a S>,
    guard: Option<&'a str>,
}

impl<'a, S> TransitionInfo<'a, S> {
    pub(crate) fn new(source: &'a S, target: Option<&'a S>, guard: Option<&'a str>) -> Self {
        Self {
            source,
            target,
            guard,
        }
    }

    /// State declaring the transition.
    pub fn source(&self) -> &'a S {
        self.source
    }

    /// Target state; `None` for internal transitions.
    pub fn target(&self) -> Option<&'a S> {
        self.target
    }

    /// Description of the guard, if any.
    pub fn guard(&self) -> Option<&'a str> {
        self.guard
    }

    pub fn is_internal(&self) -> bool {
        self.target.is_none()
    }
}

/// Observer of machine lifecycle points.
///
/// Every method has an empty default, so implementors override only what
/// they need. Implementations needing state use interior mutability.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::Argument;
/// use hsm_engine::extension::{Extension, MachineInfo};
///
/// /// Redirects every `Ping` to `Pong`.
/// struct Redirect;
///
/// impl Extension<&'static str, &'static str> for Redirect {
///     fn firing_event(
///         &self,
///         _machine: &MachineInfo<'_, &'static str>,
///         event: &mut &'static str,
///         _argument: &mut Argument,
///     ) {
///         if *event == "Ping" {
///             *event = "Pong";
///         }
///     }
/// }
/// ```
#[allow(unused_variables)]
pub trait Extension<S, E>: Send + Sync {
    fn started_state_machine(&self, machine: &MachineInfo<'_, S>) {}

    fn stopped_state_machine(&self, machine: &MachineInfo<'_, S>) {}

    fn event_queued(&self, machine: &MachineInfo<'_, S>, event: &E, argument: &Argument) {}

    fn event_queued_with_priority(
        &self,
        machine: &MachineInfo<'_, S>,
        event: &E,
        argument: &Argument,
    ) {
    }

    /// May replace the state the machine is initialized to.
    fn initializing_state_machine(&self, machine: &MachineInfo<'_, S>, initial_state: &mut S) {}

    fn initialized_state_machine(&self, machine: &MachineInfo<'_, S>, initial_state: &S) {}

    fn entering_initial_state(&self, machine: &MachineInfo<'_, S>, state: &S) {}

    fn entered_initial_state(
        &self,
        machine: &MachineInfo<'_, S>,
        state: &S,
        context: &TransitionContext<'_, S, E>,
    ) {
    }

    /// May replace the event and its argument before dispatch.
    fn firing_event(&self, machine: &MachineInfo<'_, S>, event: &mut E, argument: &mut Argument) {}

    fn fired_event(&self, machine: &MachineInfo<'_, S>, context: &TransitionContext<'_, S, E>) {}

    /// Called after every completed transition, also when the machine ends
    /// in the state it left, and once when the initial state is entered.
    fn switched_state(&self, machine: &MachineInfo<'_, S>, old_state: Option<&S>, new_state: &S) {}

    fn handling_entry_action_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        state: &S,
        context: &TransitionContext<'_, S, E>,
        error: &mut BoxError,
    ) {
    }

    fn handled_entry_action_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        state: &S,
        context: &TransitionContext<'_, S, E>,
        error: &BoxError,
    ) {
    }

    fn handling_exit_action_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        state: &S,
        context: &TransitionContext<'_, S, E>,
        error: &mut BoxError,
    ) {
    }

    fn handled_exit_action_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        state: &S,
        context: &TransitionContext<'_, S, E>,
        error: &BoxError,
    ) {
    }

    fn handling_guard_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        transition: &TransitionInfo<'_, S>,
        context: &TransitionContext<'_, S, E>,
        error: &mut BoxError,
    ) {
    }

    fn handled_guard_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        transition: &TransitionInfo<'_, S>,
        context: &TransitionContext<'_, S, E>,
        error: &BoxError,
    ) {
    }

    fn handling_transition_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        transition: &TransitionInfo<'_, S>,
        context: &TransitionContext<'_, S, E>,
        error: &mut BoxError,
    ) {
    }

    fn handled_transition_exception(
        &self,
        machine: &MachineInfo<'_, S>,
        transition: &TransitionInfo<'_, S>,
        context: &TransitionContext<'_, S, E>,
        error: &BoxError,
    ) {
    }
}

/// Ordered collection of registered extensions.
pub struct ExtensionHost<S, E> {
    extensions: Vec<Arc<dyn Extension<S, E>>>,
}

impl<S: StateId, E: EventId> ExtensionHost<S, E> {
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
        }
    }

    pub fn add(&mut self, extension: Arc<dyn Extension<S, E>>) {
        self.extensions.push(extension);
    }

    pub fn clear(&mut self) {
        self.extensions.clear();
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Invoke `f` on every extension in registration order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&dyn Extension<S, E>),
    {
        for extension in &self.extensions {
            f(extension.as_ref());
        }
    }
}

impl<S: StateId, E: EventId> Default for ExtensionHost<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E> Clone for ExtensionHost<S, E> {
    fn clone(&self) -> Self {
        Self {
            extensions: self.extensions.clone(),
        }
    }
}

impl<S, E> fmt::Debug for ExtensionHost<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionHost")
            .field("extensions", &self.extensions.len())
            .finish()
    }
}
