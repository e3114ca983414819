//! Declaring state machines.
//!
//! States, hierarchies and transitions are declared through a
//! [`StateMachineBuilder`] using a fluent syntax whose stages narrow what
//! may follow. Declaration errors surface immediately as [`BuildError`].
//!
//! # Example
//!
//! ```
//! use hsm_engine::builder::StateMachineBuilder;
//! use hsm_engine::core::HistoryType;
//!
//! let mut builder = StateMachineBuilder::new("player");
//! builder
//!     .define_hierarchy("On", "Paused", HistoryType::Shallow, ["Paused", "Playing"])
//!     .unwrap();
//! builder.in_state("Paused").on("play").goto("Playing").unwrap();
//! builder.in_state("Playing").on("pause").goto("Paused").unwrap();
//! builder.in_state("On").on("off").goto("Off").unwrap();
//! builder.in_state("Off").on("on").goto("On").unwrap();
//!
//! let mut machine = builder.build().unwrap();
//! machine.initialize("Off").unwrap();
//! machine.enter_initial_state().unwrap();
//!
//! machine.fire("on").unwrap();
//! machine.fire("play").unwrap();
//! machine.fire("off").unwrap();
//! machine.fire("on").unwrap();
//! assert_eq!(machine.current_state_id().unwrap(), &"Playing");
//! ```

pub mod error;
pub mod hierarchy;
pub mod machine;
pub mod macros;
pub mod syntax;

pub use error::BuildError;
pub use hierarchy::{HierarchySyntax, InitialSubStateSyntax, SubStateSyntax};
pub use machine::StateMachineBuilder;
pub use syntax::{
    EventSyntax, ExitActionSyntax, GuardSyntax, OtherwiseSyntax, StateSyntax, TransitionSyntax,
};
