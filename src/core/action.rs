//! Uniform wrappers around entry, exit and transition actions.
//!
//! An action may take no argument, the event argument, or a parameter fixed
//! when it was declared. All shapes are invoked the same way and describe
//! themselves for reports and diagnostics.

use super::id::Argument;
use crate::error::BoxError;
use std::any::{type_name, Any};
use std::fmt;
use thiserror::Error;

type Callable = Box<dyn Fn(&Argument) -> Result<(), BoxError> + Send + Sync>;

/// Raised when a one-argument guard or action receives an event argument
/// that is missing or of another type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Event argument of type '{found}' cannot be passed to a callable expecting '{expected}'")]
pub struct ArgumentMismatch {
    pub expected: &'static str,
    pub found: &'static str,
}

impl ArgumentMismatch {
    pub(crate) fn new<T: Any>(argument: &Argument) -> Self {
        Self {
            expected: type_name::<T>(),
            found: argument.type_name().unwrap_or("none"),
        }
    }
}

/// Human readable name of a callable: the function name for fn items,
/// `anonymous` for closures.
pub(crate) fn describe_callable<F>() -> String {
    let name = type_name::<F>();
    if name.contains("{{closure}}") {
        return "anonymous".to_string();
    }
    name.rsplit("::").next().unwrap_or(name).to_string()
}

/// An action executed on entry, on exit, or while a transition fires.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::{Action, Argument};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// let total = Arc::new(AtomicU32::new(0));
/// let sink = Arc::clone(&total);
/// let add = Action::with_argument(move |amount: &u32| {
///     sink.fetch_add(*amount, Ordering::SeqCst);
/// });
///
/// add.execute(&Argument::new(5u32)).unwrap();
/// assert_eq!(total.load(Ordering::SeqCst), 5);
/// assert!(add.execute(&Argument::none()).is_err());
/// ```
pub struct Action {
    callable: Callable,
    description: String,
}

impl Action {
    /// Wrap an action taking no argument.
    pub fn new<F>(action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            description: describe_callable::<F>(),
            callable: Box::new(move |_| {
                action();
                Ok(())
            }),
        }
    }

    /// Wrap a fallible action taking no argument.
    pub fn try_new<F, Err>(action: F) -> Self
    where
        F: Fn() -> Result<(), Err> + Send + Sync + 'static,
        Err: Into<BoxError>,
    {
        Self {
            description: describe_callable::<F>(),
            callable: Box::new(move |_| action().map_err(Into::into)),
        }
    }

    /// Wrap an action receiving the event argument as `T`.
    pub fn with_argument<T, F>(action: F) -> Self
    where
        T: Any,
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self::try_with_argument(move |value: &T| {
            action(value);
            Ok::<(), BoxError>(())
        })
        .described_as(describe_callable::<F>())
    }

    /// Wrap a fallible action receiving the event argument as `T`.
    pub fn try_with_argument<T, F, Err>(action: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> Result<(), Err> + Send + Sync + 'static,
        Err: Into<BoxError>,
    {
        Self {
            description: describe_callable::<F>(),
            callable: Box::new(move |argument| match argument.downcast_ref::<T>() {
                Some(value) => action(value).map_err(Into::into),
                None => Err(Box::new(ArgumentMismatch::new::<T>(argument))),
            }),
        }
    }

    /// Wrap an action whose parameter is fixed at declaration time.
    pub fn with_parameter<P, F>(action: F, parameter: P) -> Self
    where
        P: Send + Sync + 'static,
        F: Fn(&P) + Send + Sync + 'static,
    {
        Self {
            description: describe_callable::<F>(),
            callable: Box::new(move |_| {
                action(&parameter);
                Ok(())
            }),
        }
    }

    /// Replace the generated description.
    pub fn described_as(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn describe(&self) -> &str {
        &self.description
    }

    /// Invoke the action with the current event argument.
    pub fn execute(&self, argument: &Argument) -> Result<(), BoxError> {
        (self.callable)(argument)
    }
}

impl<F> From<F> for Action
where
    F: Fn() + Send + Sync + 'static,
{
    fn from(action: F) -> Self {
        Action::new(action)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("description", &self.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn close_door() {}

    #[test]
    fn zero_argument_action_ignores_event_argument() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let action = Action::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        action.execute(&Argument::none()).unwrap();
        action.execute(&Argument::new("ignored")).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn fallible_action_reports_its_error() {
        let action = Action::try_new(|| Err::<(), _>("door jammed"));

        let error = action.execute(&Argument::none()).unwrap_err();
        assert_eq!(error.to_string(), "door jammed");
    }

    #[test]
    fn argument_action_receives_typed_argument() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let action = Action::with_argument(move |floor: &u8| sink.lock().unwrap().push(*floor));

        action.execute(&Argument::new(3u8)).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }

    #[test]
    fn argument_action_rejects_mismatched_argument() {
        let action = Action::with_argument(|_: &u8| {});

        let error = action.execute(&Argument::new("three")).unwrap_err();
        let mismatch = error.downcast_ref::<ArgumentMismatch>().unwrap();

        assert_eq!(mismatch.expected, "u8");
        assert_eq!(mismatch.found, "&str");
        assert!(action.execute(&Argument::none()).is_err());
    }

    #[test]
    fn parametrized_action_uses_declared_parameter() {
        let seen = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&seen);
        let action = Action::with_parameter(
            move |greeting: &String| sink.lock().unwrap().push_str(greeting),
            "hello".to_string(),
        );

        action.execute(&Argument::new(99u32)).unwrap();

        assert_eq!(*seen.lock().unwrap(), "hello");
    }

    #[test]
    fn description_names_functions_and_hides_closures() {
        assert_eq!(Action::new(close_door).describe(), "close_door");
        assert_eq!(Action::new(|| {}).describe(), "anonymous");
        assert_eq!(
            Action::new(|| {}).described_as("ring bell").describe(),
            "ring bell"
        );
    }

    #[test]
    fn closures_convert_into_actions() {
        let action: Action = (|| {}).into();
        assert!(action.execute(&Argument::none()).is_ok());
    }
}
