//! Queued dispatch on a dedicated worker thread.

use super::config::WorkerConfig;
use super::queue::{EventQueue, QueuedEvent};
use crate::core::{Argument, EventId, StateId};
use crate::engine::StateMachine;
use crate::error::StateMachineError;
use crate::extension::{Extension, ExtensionHost, MachineInfo};
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Queue and lifecycle flags; guarded by one mutex shared with the worker.
struct WorkerState<S, E> {
    queue: EventQueue<E>,
    running: bool,
    processing: bool,
    /// A timed out stop whose stopped hook is still owed.
    stop_pending: bool,
    shutdown: bool,
    initialized: bool,
    current: Option<S>,
}

struct Shared<S, E> {
    machine: Mutex<StateMachine<S, E>>,
    state: Mutex<WorkerState<S, E>>,
    signal: Condvar,
}

/// Runs events on a dedicated worker thread, one at a time.
///
/// `fire` only queues the event. While started, the worker executes queued
/// events in order; `fire_priority` events are queued ahead of pending
/// events but never interrupt the event being processed. Stopping waits
/// for the in-flight event; queued events stay queued.
///
/// Extensions must be added through [`add_extension`](Self::add_extension)
/// so that queueing hooks see them too.
pub struct ActiveStateMachine<S, E> {
    name: String,
    config: WorkerConfig,
    shared: Arc<Shared<S, E>>,
    extensions: RwLock<ExtensionHost<S, E>>,
    worker: Option<JoinHandle<()>>,
}

impl<S: StateId, E: EventId> ActiveStateMachine<S, E> {
    /// Take ownership of `machine` and spawn its worker.
    pub fn new(machine: StateMachine<S, E>, config: WorkerConfig) -> Result<Self, StateMachineError> {
        let name = machine.name().to_string();
        let extensions = machine.extension_host().clone();
        let state = WorkerState {
            queue: EventQueue::new(),
            running: false,
            processing: false,
            stop_pending: false,
            shutdown: false,
            initialized: machine.is_initialized(),
            current: machine.current_state_id().ok().cloned(),
        };
        let shared = Arc::new(Shared {
            machine: Mutex::new(machine),
            state: Mutex::new(state),
            signal: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || run_worker(worker_shared))?;
        debug!(machine = %name, thread = %config.thread_name, "Spawned state machine worker");

        Ok(Self {
            name,
            config,
            shared,
            extensions: RwLock::new(extensions),
            worker: Some(worker),
        })
    }

    pub fn initialize(&self, initial_state: S) -> Result<(), StateMachineError> {
        self.shared.machine.lock().initialize(initial_state)?;
        self.shared.state.lock().initialized = true;
        Ok(())
    }

    /// Enter the initial state if needed and let the worker drain the queue.
    ///
    /// Starting a running machine does nothing.
    pub fn start(&self) -> Result<(), StateMachineError> {
        {
            let state = self.shared.state.lock();
            if state.shutdown {
                return Err(StateMachineError::WorkerShutDown);
            }
            if !state.initialized {
                return Err(StateMachineError::NotInitialized);
            }
        }

        // Held until `running` is set so concurrent starts notify once.
        let mut machine = self.shared.machine.lock();
        {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return Err(StateMachineError::WorkerShutDown);
            }
            if state.running {
                debug!(machine = %self.name, "State machine already running");
                return Ok(());
            }
            let stop_pending = std::mem::take(&mut state.stop_pending);
            drop(state);
            if stop_pending {
                notify_stopped(&machine);
            }
        }

        if !machine.has_entered_initial_state() {
            machine.enter_initial_state()?;
        }
        let info = machine.info();
        machine
            .extension_host()
            .for_each(|extension| extension.started_state_machine(&info));

        let mut state = self.shared.state.lock();
        state.current = machine.current_state_id().ok().cloned();
        state.running = true;
        self.shared.signal.notify_all();
        info!(machine = %self.name, "Started state machine");
        Ok(())
    }

    /// Stop draining the queue and wait for the in-flight event.
    pub fn stop(&self) {
        let mut state = self.shared.state.lock();
        if !state.running {
            debug!(machine = %self.name, "State machine already stopped");
            return;
        }
        state.running = false;
        self.shared.signal.notify_all();
        while state.processing {
            self.shared.signal.wait(&mut state);
        }
        drop(state);
        self.stopped();
    }

    /// Like [`stop`](Self::stop), but waits at most `timeout`.
    ///
    /// Returns whether the in-flight event finished in time. The worker
    /// stops after it either way; on timeout the stopped hook is raised once
    /// the event completes.
    pub fn stop_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        if !state.running {
            debug!(machine = %self.name, "State machine already stopped");
            return true;
        }
        state.running = false;
        self.shared.signal.notify_all();
        while state.processing {
            let timed_out = self
                .shared
                .signal
                .wait_until(&mut state, deadline)
                .timed_out();
            if timed_out && state.processing {
                state.stop_pending = true;
                warn!(machine = %self.name, ?timeout, "Timed out waiting for in-flight event");
                return false;
            }
        }
        drop(state);
        self.stopped();
        true
    }

    pub fn fire(&self, event: E) -> Result<(), StateMachineError> {
        self.fire_with_argument(event, Argument::none())
    }

    /// Queue the event behind all pending events.
    pub fn fire_with_argument(&self, event: E, argument: Argument) -> Result<(), StateMachineError> {
        self.enqueue(event, argument, false)
    }

    pub fn fire_priority(&self, event: E) -> Result<(), StateMachineError> {
        self.fire_priority_with_argument(event, Argument::none())
    }

    /// Queue the event ahead of all pending events.
    pub fn fire_priority_with_argument(
        &self,
        event: E,
        argument: Argument,
    ) -> Result<(), StateMachineError> {
        self.enqueue(event, argument, true)
    }

    /// The state after the last processed event.
    pub fn current_state_id(&self) -> Result<S, StateMachineError> {
        let state = self.shared.state.lock();
        match (&state.current, state.initialized) {
            (Some(current), _) => Ok(current.clone()),
            (None, true) => Err(StateMachineError::InitialStateNotEntered),
            (None, false) => Err(StateMachineError::NotInitialized),
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    /// Number of queued events not yet picked up by the worker.
    pub fn pending_events(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    pub fn add_extension(&self, extension: Arc<dyn Extension<S, E>>) {
        self.shared.machine.lock().add_extension(Arc::clone(&extension));
        self.extensions.write().add(extension);
    }

    /// Inspect the machine; blocks while an event is being processed.
    pub fn with_machine<R>(&self, f: impl FnOnce(&StateMachine<S, E>) -> R) -> R {
        f(&self.shared.machine.lock())
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Stop the worker for good; later calls fail with `WorkerShutDown`.
    ///
    /// Waits up to the configured stop timeout for the in-flight event.
    pub fn shutdown(&mut self) {
        if self.terminate() {
            self.stopped();
        }
        info!(machine = %self.name, "Shut down state machine worker");
    }

    fn enqueue(&self, event: E, argument: Argument, priority: bool) -> Result<(), StateMachineError> {
        let current = {
            let state = self.shared.state.lock();
            if state.shutdown {
                return Err(StateMachineError::WorkerShutDown);
            }
            if !state.initialized {
                return Err(StateMachineError::NotInitialized);
            }
            state.current.clone()
        };

        let info = MachineInfo::new(&self.name, current.as_ref());
        self.extensions.read().for_each(|extension| {
            if priority {
                extension.event_queued_with_priority(&info, &event, &argument)
            } else {
                extension.event_queued(&info, &event, &argument)
            }
        });

        let mut state = self.shared.state.lock();
        if state.shutdown {
            return Err(StateMachineError::WorkerShutDown);
        }
        debug!(machine = %self.name, event = ?event, priority, "Queued event");
        if priority {
            state.queue.push_front(event, argument);
        } else {
            state.queue.push_back(event, argument);
        }
        self.shared.signal.notify_all();
        Ok(())
    }

    fn stopped(&self) {
        notify_stopped(&self.shared.machine.lock());
    }
}

impl<S, E> ActiveStateMachine<S, E> {
    /// Signal shutdown, wait for the in-flight event and join the worker.
    ///
    /// Returns whether the machine was running and stopped cleanly.
    fn terminate(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            return false;
        };
        let was_running = {
            let mut state = self.shared.state.lock();
            let was_running = state.running;
            state.running = false;
            state.shutdown = true;
            self.shared.signal.notify_all();
            was_running
        };

        let deadline = Instant::now() + self.config.stop_timeout();
        let mut state = self.shared.state.lock();
        while state.processing {
            if self
                .shared
                .signal
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                break;
            }
        }
        if state.processing {
            warn!(machine = %self.name, "Detaching worker still processing an event");
            return false;
        }
        drop(state);

        if worker.join().is_err() {
            warn!(machine = %self.name, "State machine worker panicked");
            return false;
        }
        was_running
    }
}

impl<S, E> Drop for ActiveStateMachine<S, E> {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn run_worker<S: StateId, E: EventId>(shared: Arc<Shared<S, E>>) {
    loop {
        let QueuedEvent { event, argument } = {
            let mut state = shared.state.lock();
            loop {
                if state.shutdown {
                    debug!("State machine worker exiting");
                    return;
                }
                if state.running {
                    if let Some(queued) = state.queue.pop() {
                        state.processing = true;
                        break queued;
                    }
                }
                shared.signal.wait(&mut state);
            }
        };

        let mut machine = shared.machine.lock();
        if let Err(error) = machine.fire_with_argument(event, argument) {
            warn!(machine = %machine.name(), %error, "Failed to fire queued event");
        }

        let stop_pending = {
            let mut state = shared.state.lock();
            state.processing = false;
            state.current = machine.current_state_id().ok().cloned();
            shared.signal.notify_all();
            std::mem::take(&mut state.stop_pending)
        };
        if stop_pending {
            notify_stopped(&machine);
        }
    }
}

fn notify_stopped<S: StateId, E: EventId>(machine: &StateMachine<S, E>) {
    let info = machine.info();
    machine
        .extension_host()
        .for_each(|extension| extension.stopped_state_machine(&info));
    info!(machine = %machine.name(), "Stopped state machine");
}
