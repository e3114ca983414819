//! Guard predicates for controlling transitions.
//!
//! A guard decides whether a candidate transition may fire. Like actions,
//! guards take no argument or the event argument, and may fail. A failing
//! guard is treated as not passing.

use super::action::{describe_callable, ArgumentMismatch};
use super::id::Argument;
use crate::error::BoxError;
use std::any::Any;
use std::fmt;

type Predicate = Box<dyn Fn(&Argument) -> Result<bool, BoxError> + Send + Sync>;

/// Predicate that determines if a transition can fire.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::{Argument, Guard};
///
/// let heavy = Guard::with_argument(|weight: &u32| *weight > 100);
///
/// assert!(heavy.execute(&Argument::new(250u32)).unwrap());
/// assert!(!heavy.execute(&Argument::new(20u32)).unwrap());
/// assert!(heavy.execute(&Argument::none()).is_err());
/// ```
pub struct Guard {
    predicate: Predicate,
    description: String,
}

impl Guard {
    /// Create a guard from a predicate taking no argument.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Guard {
            description: describe_callable::<F>(),
            predicate: Box::new(move |_| Ok(predicate())),
        }
    }

    /// Create a guard from a fallible predicate taking no argument.
    pub fn try_new<F, Err>(predicate: F) -> Self
    where
        F: Fn() -> Result<bool, Err> + Send + Sync + 'static,
        Err: Into<BoxError>,
    {
        Guard {
            description: describe_callable::<F>(),
            predicate: Box::new(move |_| predicate().map_err(Into::into)),
        }
    }

    /// Create a guard inspecting the event argument as `T`.
    pub fn with_argument<T, F>(predicate: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::try_with_argument(move |value: &T| Ok::<bool, BoxError>(predicate(value)))
            .described_as(describe_callable::<F>())
    }

    /// Create a fallible guard inspecting the event argument as `T`.
    pub fn try_with_argument<T, F, Err>(predicate: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> Result<bool, Err> + Send + Sync + 'static,
        Err: Into<BoxError>,
    {
        Guard {
            description: describe_callable::<F>(),
            predicate: Box::new(move |argument| match argument.downcast_ref::<T>() {
                Some(value) => predicate(value).map_err(Into::into),
                None => Err(Box::new(ArgumentMismatch::new::<T>(argument))),
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

    /// Evaluate the guard against the event argument.
    pub fn execute(&self, argument: &Argument) -> Result<bool, BoxError> {
        (self.predicate)(argument)
    }
}

impl<F> From<F> for Guard
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    fn from(predicate: F) -> Self {
        Guard::new(predicate)
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("description", &self.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn door_is_closed() -> bool {
        true
    }

    #[test]
    fn guard_evaluates_predicate() {
        let open = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&open);
        let guard = Guard::new(move || flag.load(Ordering::SeqCst));

        assert!(!guard.execute(&Argument::none()).unwrap());
        open.store(true, Ordering::SeqCst);
        assert!(guard.execute(&Argument::none()).unwrap());
    }

    #[test]
    fn guard_is_deterministic() {
        let guard = Guard::with_argument(|value: &i32| *value % 2 == 0);
        let argument = Argument::new(4i32);

        let result1 = guard.execute(&argument).unwrap();
        let result2 = guard.execute(&argument).unwrap();

        assert_eq!(result1, result2);
    }

    #[test]
    fn fallible_guard_reports_error() {
        let guard = Guard::try_new(|| Err::<bool, _>("sensor offline"));

        let error = guard.execute(&Argument::none()).unwrap_err();
        assert_eq!(error.to_string(), "sensor offline");
    }

    #[test]
    fn argument_guard_rejects_mismatched_argument() {
        let guard = Guard::with_argument(|_: &String| true);

        let error = guard.execute(&Argument::new(1u8)).unwrap_err();
        assert!(error.downcast_ref::<ArgumentMismatch>().is_some());
    }

    #[test]
    fn guard_describes_itself() {
        assert_eq!(Guard::new(door_is_closed).describe(), "door_is_closed");
        assert_eq!(Guard::new(|| true).describe(), "anonymous");
        assert_eq!(
            Guard::new(|| true).described_as("always").describe(),
            "always"
        );
    }
}
