//! Queued execution on the worker thread.

use hsm_engine::builder::StateMachineBuilder;
use hsm_engine::core::{Action, HistoryType};
use hsm_engine::dispatch::{ActiveStateMachine, WorkerConfig};
use hsm_engine::engine::StateMachine;
use hsm_engine::error::StateMachineError;
use hsm_engine::extension::{Extension, MachineInfo};
use hsm_engine::id_enum;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

id_enum! {
    enum S { Root, Idle, Held, B, C, D }
}

id_enum! {
    enum E { Hold, GoB, GoC, GoD }
}

const WAIT: Duration = Duration::from_secs(5);

/// Machine whose `Hold` transition blocks until released.
struct Fixture {
    machine: StateMachine<S, E>,
    /// Signalled once the blocking action runs.
    held: Receiver<()>,
    release: Sender<()>,
    /// Every state reached by a completed transition.
    completed: Receiver<S>,
}

fn fixture() -> Fixture {
    let (held_tx, held) = mpsc::channel();
    let (release, release_rx) = mpsc::channel();
    let (completed_tx, completed) = mpsc::channel();
    let held_tx = Mutex::new(held_tx);
    let release_rx = Mutex::new(release_rx);

    let mut builder = StateMachineBuilder::new("worker");
    builder
        .define_hierarchy(S::Root, S::Idle, HistoryType::None, [S::Idle, S::Held, S::B, S::C, S::D])
        .unwrap();
    builder
        .in_state(S::Root)
        .on(E::GoB)
        .goto(S::B)
        .and_then(|syntax| syntax.on(E::GoC).goto(S::C))
        .and_then(|syntax| syntax.on(E::GoD).goto(S::D))
        .unwrap();
    builder
        .in_state(S::Idle)
        .on(E::Hold)
        .goto(S::Held)
        .map(|syntax| {
            syntax.execute(Action::new(move || {
                held_tx.lock().unwrap().send(()).unwrap();
                let _ = release_rx.lock().unwrap().recv();
            }))
        })
        .unwrap();
    let mut machine = builder.build().unwrap();

    let completed_tx = Mutex::new(completed_tx);
    machine.on_transition_completed(move |args| {
        let _ = completed_tx.lock().unwrap().send(*args.new_state_id());
    });
    machine.initialize(S::Root).unwrap();

    Fixture {
        machine,
        held,
        release,
        completed,
    }
}

fn config() -> WorkerConfig {
    WorkerConfig {
        thread_name: "worker-test".to_string(),
        stop_timeout_ms: 1000,
    }
}

#[test]
fn priority_events_overtake_queued_events_but_not_the_running_one() {
    let fixture = fixture();
    let machine = ActiveStateMachine::new(fixture.machine, config()).unwrap();
    machine.start().unwrap();

    machine.fire(E::Hold).unwrap();
    fixture.held.recv_timeout(WAIT).unwrap();

    machine.fire(E::GoC).unwrap();
    machine.fire_priority(E::GoD).unwrap();
    machine.fire_priority(E::GoB).unwrap();
    assert_eq!(machine.pending_events(), 3);
    fixture.release.send(()).unwrap();

    let order: Vec<S> = (0..4)
        .map(|_| fixture.completed.recv_timeout(WAIT).unwrap())
        .collect();
    assert_eq!(order, vec![S::Held, S::B, S::D, S::C]);
}

#[test]
fn events_fired_before_start_run_once_started() {
    let fixture = fixture();
    let machine = ActiveStateMachine::new(fixture.machine, config()).unwrap();

    machine.fire(E::GoB).unwrap();
    machine.fire(E::GoC).unwrap();
    assert_eq!(machine.pending_events(), 2);
    assert!(matches!(
        machine.current_state_id(),
        Err(StateMachineError::InitialStateNotEntered)
    ));

    machine.start().unwrap();
    assert_eq!(fixture.completed.recv_timeout(WAIT).unwrap(), S::B);
    assert_eq!(fixture.completed.recv_timeout(WAIT).unwrap(), S::C);
    machine.stop();

    assert_eq!(machine.current_state_id().unwrap(), S::C);
}

#[test]
fn stop_waits_for_the_running_event_and_keeps_the_queue() {
    let fixture = fixture();
    let machine = Arc::new(ActiveStateMachine::new(fixture.machine, config()).unwrap());
    machine.start().unwrap();
    machine.fire(E::Hold).unwrap();
    fixture.held.recv_timeout(WAIT).unwrap();
    machine.fire(E::GoB).unwrap();

    let stopper = {
        let machine = Arc::clone(&machine);
        thread::spawn(move || machine.stop())
    };
    thread::sleep(Duration::from_millis(50));
    fixture.release.send(()).unwrap();
    stopper.join().unwrap();

    assert!(!machine.is_running());
    assert_eq!(machine.current_state_id().unwrap(), S::Held);
    assert_eq!(machine.pending_events(), 1);

    machine.start().unwrap();
    assert_eq!(fixture.completed.recv_timeout(WAIT).unwrap(), S::Held);
    assert_eq!(fixture.completed.recv_timeout(WAIT).unwrap(), S::B);
}

#[test]
fn stop_timeout_reports_an_unfinished_event() {
    let fixture = fixture();
    let machine = ActiveStateMachine::new(fixture.machine, config()).unwrap();
    machine.start().unwrap();
    machine.fire(E::Hold).unwrap();
    fixture.held.recv_timeout(WAIT).unwrap();

    assert!(!machine.stop_timeout(Duration::from_millis(20)));

    fixture.release.send(()).unwrap();
    assert_eq!(fixture.completed.recv_timeout(WAIT).unwrap(), S::Held);
}

#[test]
fn uninitialized_machine_rejects_events() {
    let mut builder: StateMachineBuilder<S, E> = StateMachineBuilder::new("empty");
    builder.in_state(S::Idle).on(E::GoB).goto(S::B).unwrap();
    let machine = ActiveStateMachine::new(builder.build().unwrap(), config()).unwrap();

    assert!(matches!(
        machine.fire(E::GoB),
        Err(StateMachineError::NotInitialized)
    ));
    assert!(matches!(machine.start(), Err(StateMachineError::NotInitialized)));
    assert!(matches!(
        machine.current_state_id(),
        Err(StateMachineError::NotInitialized)
    ));

    machine.initialize(S::Idle).unwrap();
    machine.start().unwrap();
    assert_eq!(machine.current_state_id().unwrap(), S::Idle);
}

#[test]
fn shut_down_machine_rejects_everything() {
    let fixture = fixture();
    let mut machine = ActiveStateMachine::new(fixture.machine, config()).unwrap();
    machine.start().unwrap();

    machine.shutdown();

    assert!(!machine.is_running());
    assert!(matches!(
        machine.fire(E::GoB),
        Err(StateMachineError::WorkerShutDown)
    ));
    assert!(matches!(
        machine.fire_priority(E::GoB),
        Err(StateMachineError::WorkerShutDown)
    ));
    assert!(matches!(machine.start(), Err(StateMachineError::WorkerShutDown)));
}

#[derive(Default)]
struct Threads {
    seen: Mutex<Vec<String>>,
}

impl Extension<S, E> for Threads {
    fn event_queued(&self, _machine: &MachineInfo<'_, S>, event: &E, _argument: &hsm_engine::Argument) {
        self.seen.lock().unwrap().push(format!("queued {event}"));
    }

    fn fired_event(
        &self,
        _machine: &MachineInfo<'_, S>,
        context: &hsm_engine::TransitionContext<'_, S, E>,
    ) {
        let thread = thread::current().name().unwrap_or("unnamed").to_string();
        let event = context.event_id().map(ToString::to_string).unwrap_or_default();
        self.seen.lock().unwrap().push(format!("fired {event} on {thread}"));
    }
}

#[test]
fn events_run_on_the_configured_worker_thread() {
    let fixture = fixture();
    let threads = Arc::new(Threads::default());
    let machine = ActiveStateMachine::new(fixture.machine, config()).unwrap();
    machine.add_extension(threads.clone());
    machine.start().unwrap();

    machine.fire(E::GoD).unwrap();
    fixture.completed.recv_timeout(WAIT).unwrap();
    machine.stop();

    assert_eq!(
        *threads.seen.lock().unwrap(),
        vec!["queued GoD".to_string(), "fired GoD on worker-test".to_string()]
    );
    assert_eq!(machine.with_machine(|inner| inner.name().to_string()), "worker");
}

#[derive(Default)]
struct Lifecycle {
    hooks: Mutex<Vec<&'static str>>,
}

impl Lifecycle {
    fn hooks(&self) -> Vec<&'static str> {
        self.hooks.lock().unwrap().clone()
    }
}

impl Extension<S, E> for Lifecycle {
    fn started_state_machine(&self, _machine: &MachineInfo<'_, S>) {
        self.hooks.lock().unwrap().push("started");
    }

    fn stopped_state_machine(&self, _machine: &MachineInfo<'_, S>) {
        self.hooks.lock().unwrap().push("stopped");
    }
}

#[test]
fn timed_out_stop_is_reported_once_the_event_finishes() {
    let fixture = fixture();
    let lifecycle = Arc::new(Lifecycle::default());
    let machine = ActiveStateMachine::new(fixture.machine, config()).unwrap();
    machine.add_extension(lifecycle.clone());
    machine.start().unwrap();
    machine.fire(E::Hold).unwrap();
    fixture.held.recv_timeout(WAIT).unwrap();

    assert!(!machine.stop_timeout(Duration::from_millis(20)));
    assert_eq!(lifecycle.hooks(), vec!["started"]);

    fixture.release.send(()).unwrap();
    assert_eq!(fixture.completed.recv_timeout(WAIT).unwrap(), S::Held);
    machine.with_machine(|_| ());
    assert_eq!(lifecycle.hooks(), vec!["started", "stopped"]);

    machine.start().unwrap();
    assert_eq!(lifecycle.hooks(), vec!["started", "stopped", "started"]);
}

#[test]
fn restart_after_timed_out_stop_reports_stopped_first() {
    let fixture = fixture();
    let lifecycle = Arc::new(Lifecycle::default());
    let machine = ActiveStateMachine::new(fixture.machine, config()).unwrap();
    machine.add_extension(lifecycle.clone());
    machine.start().unwrap();
    machine.fire(E::Hold).unwrap();
    fixture.held.recv_timeout(WAIT).unwrap();
    assert!(!machine.stop_timeout(Duration::from_millis(20)));

    let release = fixture.release.clone();
    let releaser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        release.send(()).unwrap();
    });
    machine.start().unwrap();
    releaser.join().unwrap();

    assert_eq!(lifecycle.hooks(), vec!["started", "stopped", "started"]);
    assert!(machine.is_running());
}

#[test]
fn concurrent_starts_notify_once() {
    let fixture = fixture();
    let lifecycle = Arc::new(Lifecycle::default());
    let machine = Arc::new(ActiveStateMachine::new(fixture.machine, config()).unwrap());
    machine.add_extension(lifecycle.clone());

    let starters: Vec<_> = (0..8)
        .map(|_| {
            let machine = Arc::clone(&machine);
            thread::spawn(move || machine.start().unwrap())
        })
        .collect();
    for starter in starters {
        starter.join().unwrap();
    }

    assert_eq!(lifecycle.hooks(), vec!["started"]);
    assert_eq!(machine.current_state_id().unwrap(), S::Idle);
}
