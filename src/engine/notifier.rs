//! Notifications raised towards subscribers of a machine.

use super::context::TransitionContext;
use crate::core::Argument;
use crate::error::BoxError;
use std::fmt;

/// Arguments of the transition-begin and transition-declined notifications.
pub struct TransitionEventArgs<'a, S, E> {
    state: Option<&'a S>,
    event: Option<&'a E>,
    argument: &'a Argument,
}

impl<'a, S, E> TransitionEventArgs<'a, S, E> {
    fn from_context(context: &'a TransitionContext<'_, S, E>) -> Self {
        Self {
            state: context.state_id(),
            event: context.event_id(),
            argument: context.argument(),
        }
    }

    /// State the event was fired in; `None` while entering the initial state.
    pub fn state_id(&self) -> Option<&'a S> {
        self.state
    }

    pub fn event_id(&self) -> Option<&'a E> {
        self.event
    }

    pub fn argument(&self) -> &'a Argument {
        self.argument
    }
}

/// Arguments of the transition-completed notification.
pub struct TransitionCompletedEventArgs<'a, S, E> {
    transition: TransitionEventArgs<'a, S, E>,
    new_state: &'a S,
}

impl<'a, S, E> TransitionCompletedEventArgs<'a, S, E> {
    /// State the machine was in before the transition.
    pub fn state_id(&self) -> Option<&'a S> {
        self.transition.state
    }

    pub fn event_id(&self) -> Option<&'a E> {
        self.transition.event
    }

    pub fn argument(&self) -> &'a Argument {
        self.transition.argument
    }

    /// Leaf state the machine is in after the transition.
    pub fn new_state_id(&self) -> &'a S {
        self.new_state
    }
}

/// Arguments of the exception notifications.
pub struct TransitionExceptionEventArgs<'a, S, E> {
    transition: TransitionEventArgs<'a, S, E>,
    error: &'a BoxError,
}

impl<'a, S, E> TransitionExceptionEventArgs<'a, S, E> {
    pub fn state_id(&self) -> Option<&'a S> {
        self.transition.state
    }

    pub fn event_id(&self) -> Option<&'a E> {
        self.transition.event
    }

    pub fn argument(&self) -> &'a Argument {
        self.transition.argument
    }

    pub fn error(&self) -> &'a BoxError {
        self.error
    }
}

type EventHandler<S, E> = Box<dyn for<'a> Fn(&TransitionEventArgs<'a, S, E>) + Send + Sync>;
type CompletedHandler<S, E> =
    Box<dyn for<'a> Fn(&TransitionCompletedEventArgs<'a, S, E>) + Send + Sync>;
type ExceptionHandler<S, E> =
    Box<dyn for<'a> Fn(&TransitionExceptionEventArgs<'a, S, E>) + Send + Sync>;

/// Subscriber registry for the machine's notifications.
pub(crate) struct Notifier<S, E> {
    transition_begin: Vec<EventHandler<S, E>>,
    transition_completed: Vec<CompletedHandler<S, E>>,
    transition_declined: Vec<EventHandler<S, E>>,
    exception_thrown: Vec<ExceptionHandler<S, E>>,
    transition_exception_thrown: Vec<ExceptionHandler<S, E>>,
}

impl<S, E> Notifier<S, E> {
    pub(crate) fn new() -> Self {
        Self {
            transition_begin: Vec::new(),
            transition_completed: Vec::new(),
            transition_declined: Vec::new(),
            exception_thrown: Vec::new(),
            transition_exception_thrown: Vec::new(),
        }
    }

    pub(crate) fn subscribe_transition_begin(&mut self, handler: EventHandler<S, E>) {
        self.transition_begin.push(handler);
    }

    pub(crate) fn subscribe_transition_completed(&mut self, handler: CompletedHandler<S, E>) {
        self.transition_completed.push(handler);
    }

    pub(crate) fn subscribe_transition_declined(&mut self, handler: EventHandler<S, E>) {
        self.transition_declined.push(handler);
    }

    pub(crate) fn subscribe_exception_thrown(&mut self, handler: ExceptionHandler<S, E>) {
        self.exception_thrown.push(handler);
    }

    pub(crate) fn subscribe_transition_exception_thrown(&mut self, handler: ExceptionHandler<S, E>) {
        self.transition_exception_thrown.push(handler);
    }

    pub(crate) fn transition_begin(&self, context: &TransitionContext<'_, S, E>) {
        let args = TransitionEventArgs::from_context(context);
        raise(&self.transition_begin, &args);
    }

    pub(crate) fn transition_completed(&self, context: &TransitionContext<'_, S, E>, new_state: &S) {
        let args = TransitionCompletedEventArgs {
            transition: TransitionEventArgs::from_context(context),
            new_state,
        };
        raise(&self.transition_completed, &args);
    }

    pub(crate) fn transition_declined(&self, context: &TransitionContext<'_, S, E>) {
        let args = TransitionEventArgs::from_context(context);
        raise(&self.transition_declined, &args);
    }

    /// Failures during event dispatch go to transition-exception subscribers,
    /// failures while entering the initial state to general subscribers.
    pub(crate) fn exception_thrown(&self, context: &TransitionContext<'_, S, E>, error: &BoxError) {
        let args = TransitionExceptionEventArgs {
            transition: TransitionEventArgs::from_context(context),
            error,
        };
        if context.event_id().is_some() {
            raise(&self.transition_exception_thrown, &args);
        } else {
            raise(&self.exception_thrown, &args);
        }
    }

    pub(crate) fn has_exception_subscribers(&self, during_transition: bool) -> bool {
        if during_transition {
            !self.transition_exception_thrown.is_empty()
        } else {
            !self.exception_thrown.is_empty()
        }
    }
}

fn raise<T, H>(handlers: &[Box<H>], args: &T)
where
    H: Fn(&T) + ?Sized,
{
    for handler in handlers {
        handler(args);
    }
}

impl<S, E> fmt::Debug for Notifier<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("transition_begin", &self.transition_begin.len())
            .field("transition_completed", &self.transition_completed.len())
            .field("transition_declined", &self.transition_declined.len())
            .field("exception_thrown", &self.exception_thrown.len())
            .field(
                "transition_exception_thrown",
                &self.transition_exception_thrown.len(),
            )
            .finish()
    }
}
