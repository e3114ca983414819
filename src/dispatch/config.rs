//! Configuration of the active machine's worker.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Worker settings of an [`ActiveStateMachine`](super::ActiveStateMachine).
///
/// Missing fields fall back to their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Name of the worker thread.
    pub thread_name: String,
    /// How long dropping the machine waits for the in-flight event.
    pub stop_timeout_ms: u64,
}

impl WorkerConfig {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            thread_name: "hsm-worker".to_string(),
            stop_timeout_ms: 5000,
        }
    }
}
