//! Hsm Engine: hierarchical state machines
//!
//! States nest into hierarchies. Events bubble from the current leaf state
//! up to its ancestors until a transition accepts them; the transition then
//! exits and enters the states between source and target, running entry,
//! exit and transition actions in a fixed order. Composite states re-enter
//! their sub states according to their history type.
//!
//! # Core Concepts
//!
//! - **Builder**: fluent declaration of states, hierarchies and guarded transitions
//! - **History**: None, Shallow and Deep re-entry of composite states
//! - **Extensions**: observers that can override events, states and errors in flight
//! - **Dispatch**: synchronous or worker-thread execution of queued events
//! - **Checkpoints**: save and restore the current state and history
//!
//! # Example
//!
//! ```rust
//! use hsm_engine::builder::StateMachineBuilder;
//! use hsm_engine::core::HistoryType;
//! use hsm_engine::dispatch::PassiveStateMachine;
//! use hsm_engine::id_enum;
//!
//! id_enum! {
//!     enum Floor { Ground, Moving, Up, Down }
//! }
//!
//! id_enum! {
//!     enum Command { Call, Arrive, GoUp, GoDown }
//! }
//!
//! let mut builder = StateMachineBuilder::new("elevator");
//! builder
//!     .define_hierarchy(Floor::Moving, Floor::Up, HistoryType::None, [Floor::Up, Floor::Down])
//!     .unwrap();
//! builder.in_state(Floor::Ground).on(Command::Call).goto(Floor::Moving).unwrap();
//! builder.in_state(Floor::Up).on(Command::GoDown).goto(Floor::Down).unwrap();
//! builder.in_state(Floor::Moving).on(Command::Arrive).goto(Floor::Ground).unwrap();
//!
//! let mut machine = PassiveStateMachine::new(builder.build().unwrap());
//! machine.initialize(Floor::Ground).unwrap();
//! machine.start().unwrap();
//!
//! machine.fire(Command::Call).unwrap();
//! assert_eq!(machine.current_state_id().unwrap(), &Floor::Up);
//!
//! machine.fire(Command::GoDown).unwrap();
//! machine.fire(Command::Arrive).unwrap();
//! assert_eq!(machine.current_state_id().unwrap(), &Floor::Ground);
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod extension;
pub mod report;

// Re-export commonly used types
pub use builder::{BuildError, StateMachineBuilder};
pub use checkpoint::{Checkpoint, CheckpointError};
pub use core::{Action, Argument, EventId, Guard, HistoryType, StateId};
pub use dispatch::{ActiveStateMachine, PassiveStateMachine, WorkerConfig};
pub use engine::{FireOutcome, StateMachine, TransitionContext};
pub use error::{BoxError, StateMachineError};
pub use extension::{Extension, MachineInfo, TransitionInfo};
pub use report::{StateMachineReport, TextReport};
