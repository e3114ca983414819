//! History policies for composite states.
//!
//! A composite state remembers which of its direct sub states was active
//! when it was last exited. The history type decides whether that memory
//! is used when the composite state is targeted again.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Policy for which sub state is entered when a composite state is targeted.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::HistoryType;
///
/// assert_eq!(HistoryType::default(), HistoryType::None);
/// assert_eq!(HistoryType::Deep.to_string(), "Deep");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryType {
    /// Always enter the designated initial sub state.
    #[default]
    None,

    /// Enter the last active sub state; its own sub states start from
    /// their initial sub state.
    Shallow,

    /// Restore the full path down to the previously active leaf.
    Deep,
}

impl fmt::Display for HistoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Shallow => "Shallow",
            Self::Deep => "Deep",
        };
        f.write_str(name)
    }
}

/// The remembered sub state of one composite state.
///
/// Used by checkpoints to persist and restore history pointers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord<S> {
    /// The composite state
    pub super_state: S,
    /// Its last active direct sub state
    pub last_active: S,
}
