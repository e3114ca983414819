//! Saving and restoring the runtime state of a state machine.
//!
//! A checkpoint holds the current state and the last-active sub state of
//! every composite state. Declarations (actions, guards, transitions) are
//! not part of it: a checkpoint is loaded into a freshly built machine with
//! the same declaration, before that machine is initialized.

use crate::core::{EventId, HistoryRecord, StateId};
use crate::engine::StateMachine;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::info;
use uuid::Uuid;

pub mod error;

pub use error::{CheckpointError, CheckpointViolation};

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a machine's runtime state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint<S> {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: Uuid,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Name of the machine the checkpoint was taken from
    pub machine: String,

    /// Current state; `None` if the initial state was not entered yet
    pub current_state: Option<S>,

    /// Last-active sub state of every composite state that has one
    pub history: Vec<HistoryRecord<S>>,
}

impl<S: Serialize> Checkpoint<S> {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }
}

impl<S: DeserializeOwned> Checkpoint<S> {
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()
    }

    fn check_version(self) -> Result<Self, CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(self)
    }
}

impl<S: StateId, E: EventId> StateMachine<S, E> {
    /// Snapshot the current state and all history pointers.
    pub fn save(&self) -> Checkpoint<S> {
        let history = self
            .graph
            .nodes()
            .filter_map(|(_, node)| {
                node.last_active.get().map(|last_active| HistoryRecord {
                    super_state: node.id.clone(),
                    last_active: self.graph.id(last_active).clone(),
                })
            })
            .collect();

        Checkpoint {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            machine: self.name.clone(),
            current_state: self.current_state.map(|index| self.graph.id(index).clone()),
            history,
        }
    }

    /// Restore a snapshot taken with [`save`](Self::save).
    ///
    /// Only allowed before the machine is initialized. Every entry is
    /// validated first and all violations are reported together; nothing is
    /// applied unless the whole checkpoint fits. A restored current state
    /// counts as initialized and entered, so no entry actions run.
    pub fn load(&mut self, checkpoint: Checkpoint<S>) -> Result<(), CheckpointError> {
        if self.is_initialized() {
            return Err(CheckpointError::AlreadyInitialized);
        }

        if let Validation::Failure(errors) = self.validate(&checkpoint) {
            return Err(CheckpointError::InvalidCheckpoint {
                violations: errors.iter().cloned().collect(),
            });
        }

        for record in &checkpoint.history {
            if let (Some(super_state), Some(last_active)) = (
                self.graph.find(&record.super_state),
                self.graph.find(&record.last_active),
            ) {
                self.graph
                    .node(super_state)
                    .last_active
                    .set(Some(last_active));
            }
        }
        self.current_state = checkpoint
            .current_state
            .as_ref()
            .and_then(|state| self.graph.find(state));

        info!(
            machine = %self.name,
            checkpoint = %checkpoint.id,
            state = ?checkpoint.current_state,
            "Loaded checkpoint"
        );
        Ok(())
    }

    fn validate(&self, checkpoint: &Checkpoint<S>) -> Validation<(), NonEmptyVec<CheckpointViolation>> {
        let mut checks = Vec::new();

        if let Some(current) = &checkpoint.current_state {
            checks.push(self.check_known(current));
        }
        for record in &checkpoint.history {
            checks.push(self.check_known(&record.super_state));
            checks.push(self.check_known(&record.last_active));
            checks.push(self.check_direct_sub_state(record));
        }

        Validation::all_vec(checks).map(|_| ())
    }

    fn check_known(&self, state: &S) -> Validation<(), NonEmptyVec<CheckpointViolation>> {
        match self.graph.find(state) {
            Some(_) => Validation::success(()),
            None => Validation::fail(CheckpointViolation::UnknownState {
                state: format!("{state:?}"),
            }),
        }
    }

    fn check_direct_sub_state(
        &self,
        record: &HistoryRecord<S>,
    ) -> Validation<(), NonEmptyVec<CheckpointViolation>> {
        let (Some(super_state), Some(last_active)) = (
            self.graph.find(&record.super_state),
            self.graph.find(&record.last_active),
        ) else {
            // unknown states are reported by check_known
            return Validation::success(());
        };

        if self.graph.node(last_active).super_state == Some(super_state) {
            Validation::success(())
        } else {
            Validation::fail(CheckpointViolation::NotADirectSubState {
                state: format!("{:?}", record.last_active),
                super_state: format!("{:?}", record.super_state),
            })
        }
    }
}
