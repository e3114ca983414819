//! Identifier traits for states and events, and the untyped event argument.
//!
//! States and events are identified by plain values. Any type that is
//! cloneable, hashable and debuggable can act as an identifier; most
//! machines use a field-less enum generated with [`id_enum!`](crate::id_enum).

use std::any::{type_name, Any};
use std::fmt::{self, Debug};
use std::hash::Hash;

/// Identifier of a state in the hierarchy.
///
/// Implemented for every type satisfying the bounds.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::StateId;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Door {
///     Open,
///     Closed,
/// }
///
/// fn accepts<S: StateId>(_: S) {}
/// accepts(Door::Open);
/// accepts("also a state");
/// ```
pub trait StateId: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> StateId for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Identifier of an event that can be fired on a machine.
///
/// Implemented for every type satisfying the bounds.
pub trait EventId: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> EventId for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Untyped payload travelling with a fired event.
///
/// Guards and actions declared with an argument type downcast the payload;
/// extensions may replace it before dispatch.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::Argument;
///
/// let argument = Argument::new(42u32);
/// assert_eq!(argument.downcast_ref::<u32>(), Some(&42));
/// assert!(argument.downcast_ref::<String>().is_none());
/// assert!(Argument::none().is_none());
/// ```
#[derive(Default)]
pub struct Argument {
    value: Option<Box<dyn Any + Send>>,
    type_name: Option<&'static str>,
}

impl Argument {
    /// An empty argument.
    pub fn none() -> Self {
        Self::default()
    }

    /// Wrap a value as an event argument.
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            value: Some(Box::new(value)),
            type_name: Some(type_name::<T>()),
        }
    }

    pub fn is_none(&self) -> bool {
        self.value.is_none()
    }

    pub fn is_some(&self) -> bool {
        self.value.is_some()
    }

    /// Borrow the payload as `T`, if present and of that type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.as_ref().and_then(|value| value.downcast_ref::<T>())
    }

    /// Name of the payload's type, for diagnostics.
    pub fn type_name(&self) -> Option<&'static str> {
        self.type_name
    }
}

impl Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.type_name {
            Some(name) => write!(f, "Argument({name})"),
            None => f.write_str("Argument(none)"),
        }
    }
}
