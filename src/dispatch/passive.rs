//! Synchronous dispatch on the caller's thread.

use super::queue::EventQueue;
use crate::core::{Argument, EventId, StateId};
use crate::engine::StateMachine;
use crate::error::StateMachineError;
use crate::extension::Extension;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs events on the calling thread.
///
/// Events fired while stopped are queued and executed in order once the
/// machine is started; while running, `fire` executes the event before it
/// returns.
pub struct PassiveStateMachine<S, E> {
    machine: StateMachine<S, E>,
    queue: EventQueue<E>,
    running: bool,
}

impl<S: StateId, E: EventId> PassiveStateMachine<S, E> {
    pub fn new(machine: StateMachine<S, E>) -> Self {
        Self {
            machine,
            queue: EventQueue::new(),
            running: false,
        }
    }

    pub fn initialize(&mut self, initial_state: S) -> Result<(), StateMachineError> {
        self.machine.initialize(initial_state)
    }

    /// Enter the initial state if needed and execute all queued events.
    ///
    /// Starting a running machine does nothing.
    pub fn start(&mut self) -> Result<(), StateMachineError> {
        if !self.machine.is_initialized() {
            return Err(StateMachineError::NotInitialized);
        }
        if self.running {
            debug!(machine = %self.machine.name(), "State machine already running");
            return Ok(());
        }
        if !self.machine.has_entered_initial_state() {
            self.machine.enter_initial_state()?;
        }

        self.running = true;
        info!(machine = %self.machine.name(), "Started state machine");
        let info = self.machine.info();
        self.machine
            .extension_host()
            .for_each(|extension| extension.started_state_machine(&info));

        self.execute_queued_events()
    }

    /// Stop executing events; later events stay queued until the next start.
    pub fn stop(&mut self) {
        if !self.running {
            debug!(machine = %self.machine.name(), "State machine already stopped");
            return;
        }

        self.running = false;
        info!(machine = %self.machine.name(), "Stopped state machine");
        let info = self.machine.info();
        self.machine
            .extension_host()
            .for_each(|extension| extension.stopped_state_machine(&info));
    }

    pub fn fire(&mut self, event: E) -> Result<(), StateMachineError> {
        self.fire_with_argument(event, Argument::none())
    }

    /// Queue the event behind pending events and execute if running.
    pub fn fire_with_argument(
        &mut self,
        event: E,
        argument: Argument,
    ) -> Result<(), StateMachineError> {
        self.ensure_initialized()?;
        let info = self.machine.info();
        self.machine
            .extension_host()
            .for_each(|extension| extension.event_queued(&info, &event, &argument));
        debug!(machine = %self.machine.name(), event = ?event, "Queued event");

        self.queue.push_back(event, argument);
        self.execute_queued_events()
    }

    pub fn fire_priority(&mut self, event: E) -> Result<(), StateMachineError> {
        self.fire_priority_with_argument(event, Argument::none())
    }

    /// Queue the event ahead of pending events and execute if running.
    pub fn fire_priority_with_argument(
        &mut self,
        event: E,
        argument: Argument,
    ) -> Result<(), StateMachineError> {
        self.ensure_initialized()?;
        let info = self.machine.info();
        self.machine
            .extension_host()
            .for_each(|extension| extension.event_queued_with_priority(&info, &event, &argument));
        debug!(machine = %self.machine.name(), event = ?event, "Queued priority event");

        self.queue.push_front(event, argument);
        self.execute_queued_events()
    }

    pub fn current_state_id(&self) -> Result<&S, StateMachineError> {
        self.machine.current_state_id()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of events waiting for the machine to be started.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn add_extension(&mut self, extension: Arc<dyn Extension<S, E>>) {
        self.machine.add_extension(extension);
    }

    pub fn machine(&self) -> &StateMachine<S, E> {
        &self.machine
    }

    /// Access to the machine, e.g. to subscribe to notifications.
    pub fn machine_mut(&mut self) -> &mut StateMachine<S, E> {
        &mut self.machine
    }

    pub fn into_inner(self) -> StateMachine<S, E> {
        self.machine
    }

    fn ensure_initialized(&self) -> Result<(), StateMachineError> {
        if self.machine.is_initialized() {
            Ok(())
        } else {
            Err(StateMachineError::NotInitialized)
        }
    }

    fn execute_queued_events(&mut self) -> Result<(), StateMachineError> {
        while self.running {
            let Some(queued) = self.queue.pop() else {
                break;
            };
            self.machine
                .fire_with_argument(queued.event, queued.argument)?;
        }
        Ok(())
    }
}
