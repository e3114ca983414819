//! Queued event dispatch around a [`StateMachine`](crate::engine::StateMachine).
//!
//! - [`PassiveStateMachine`] executes events on the caller's thread and
//!   queues them while stopped.
//! - [`ActiveStateMachine`] owns a worker thread that drains the queue while
//!   started, one event at a time.
//!
//! Both insert priority events at the head of the queue.

mod active;
mod config;
mod passive;
mod queue;

pub use active::ActiveStateMachine;
pub use config::WorkerConfig;
pub use passive::PassiveStateMachine;
pub use queue::{EventQueue, QueuedEvent};
