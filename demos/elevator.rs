//! Elevator
//!
//! This example drives an elevator through a nested state hierarchy.
//!
//! Key concepts:
//! - Composite states with shallow and no history
//! - Guarded transitions with an `otherwise` fallback
//! - Entry and exit actions, internal transitions
//! - An extension printing what the machine does
//! - Saving a checkpoint and resuming a fresh machine from it
//!
//! Run with: cargo run --example elevator

use hsm_engine::builder::StateMachineBuilder;
use hsm_engine::checkpoint::Checkpoint;
use hsm_engine::core::{Action, Guard, HistoryType};
use hsm_engine::dispatch::PassiveStateMachine;
use hsm_engine::engine::{StateMachine, TransitionContext};
use hsm_engine::extension::{Extension, MachineInfo};
use hsm_engine::id_enum;
use hsm_engine::report::TextReport;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

id_enum! {
    enum Elevator {
        Healthy,
        OnFloor,
        DoorOpen,
        DoorClosed,
        Moving,
        MovingUp,
        MovingDown,
        Error,
    }
}

id_enum! {
    enum Command {
        OpenDoor,
        CloseDoor,
        GoUp,
        GoDown,
        Stop,
        ErrorOccurred,
        Reset,
        Load,
    }
}

const MAX_LOAD_KG: u32 = 600;

// Actions
fn announce_floor() {
    println!("  *ding* floor reached");
}

fn beep() {
    println!("  *beep*");
}

fn announce_overload() {
    println!("  overload, please leave the cabin");
}

/// Prints switched states and completed events.
struct Console;

impl Extension<Elevator, Command> for Console {
    fn switched_state(
        &self,
        _machine: &MachineInfo<'_, Elevator>,
        old_state: Option<&Elevator>,
        new_state: &Elevator,
    ) {
        match old_state {
            Some(old) => println!("  state: {old} -> {new_state}"),
            None => println!("  state: {new_state}"),
        }
    }

    fn fired_event(
        &self,
        _machine: &MachineInfo<'_, Elevator>,
        context: &TransitionContext<'_, Elevator, Command>,
    ) {
        println!("  trace: {}", context.records_summary());
    }
}

fn build(load_kg: Arc<AtomicU32>) -> StateMachine<Elevator, Command> {
    let mut builder = StateMachineBuilder::new("elevator");

    builder
        .define_hierarchy(
            Elevator::Healthy,
            Elevator::OnFloor,
            HistoryType::Shallow,
            [Elevator::OnFloor, Elevator::Moving],
        )
        .expect("healthy hierarchy");
    builder
        .define_hierarchy(
            Elevator::OnFloor,
            Elevator::DoorClosed,
            HistoryType::None,
            [Elevator::DoorClosed, Elevator::DoorOpen],
        )
        .expect("floor hierarchy");
    builder
        .define_hierarchy(
            Elevator::Moving,
            Elevator::MovingUp,
            HistoryType::Shallow,
            [Elevator::MovingUp, Elevator::MovingDown],
        )
        .expect("moving hierarchy");

    builder
        .in_state(Elevator::Healthy)
        .on(Command::ErrorOccurred)
        .goto(Elevator::Error)
        .expect("healthy transitions");

    builder
        .in_state(Elevator::Error)
        .on(Command::Reset)
        .goto(Elevator::Healthy)
        .and_then(|syntax| syntax.on(Command::ErrorOccurred).execute(beep))
        .expect("error transitions");

    let up_load = Arc::clone(&load_kg);
    let down_load = Arc::clone(&load_kg);
    builder
        .in_state(Elevator::OnFloor)
        .execute_on_entry(announce_floor)
        .execute_on_exit(beep)
        .on(Command::CloseDoor)
        .goto(Elevator::DoorClosed)
        .and_then(|syntax| syntax.on(Command::OpenDoor).goto(Elevator::DoorOpen))
        .and_then(|syntax| {
            syntax
                .on(Command::GoUp)
                .when(
                    Guard::new(move || up_load.load(Ordering::SeqCst) <= MAX_LOAD_KG)
                        .described_as("within_capacity"),
                )
                .goto(Elevator::MovingUp)
        })
        .and_then(|syntax| syntax.otherwise().execute(announce_overload))
        .and_then(|syntax| {
            syntax
                .on(Command::GoDown)
                .when(
                    Guard::new(move || down_load.load(Ordering::SeqCst) <= MAX_LOAD_KG)
                        .described_as("within_capacity"),
                )
                .goto(Elevator::MovingDown)
        })
        .and_then(|syntax| syntax.otherwise().execute(announce_overload))
        .expect("floor transitions");

    builder
        .in_state(Elevator::DoorOpen)
        .on(Command::Load)
        .execute(Action::with_argument(move |kg: &u32| {
            load_kg.store(*kg, Ordering::SeqCst);
            println!("  cabin load is now {kg} kg");
        }))
        .expect("door transitions");

    builder
        .in_state(Elevator::Moving)
        .on(Command::Stop)
        .goto(Elevator::OnFloor)
        .expect("moving transitions");

    builder.build().expect("valid elevator")
}

fn main() {
    println!("=== Elevator ===\n");

    let load_kg = Arc::new(AtomicU32::new(0));
    let mut machine = build(Arc::clone(&load_kg));
    println!("{}", machine.report(&TextReport::new()));

    machine.add_extension(Arc::new(Console));
    let mut elevator = PassiveStateMachine::new(machine);
    elevator.initialize(Elevator::OnFloor).expect("initialize");

    println!("Events queued before start run on start:");
    elevator.fire(Command::OpenDoor).expect("fire");
    elevator.start().expect("start");

    println!("\nOverloaded cabin:");
    elevator
        .fire_with_argument(Command::Load, hsm_engine::Argument::new(750u32))
        .expect("fire");
    elevator.fire(Command::GoUp).expect("fire");

    println!("\nLighter cabin:");
    elevator
        .fire_with_argument(Command::Load, hsm_engine::Argument::new(320u32))
        .expect("fire");
    elevator.fire(Command::CloseDoor).expect("fire");
    elevator.fire(Command::GoDown).expect("fire");

    println!("\nFailure while moving:");
    elevator.fire(Command::ErrorOccurred).expect("fire");
    elevator.fire(Command::Reset).expect("fire");
    println!(
        "  back in {} thanks to shallow history",
        elevator.current_state_id().expect("current state")
    );

    println!("\nCheckpoint:");
    let json = elevator.machine().save().to_json().expect("serialize");
    println!("  {json}");

    let checkpoint = Checkpoint::<Elevator>::from_json(&json).expect("deserialize");
    let mut resumed = build(Arc::new(AtomicU32::new(0)));
    resumed.load(checkpoint).expect("load");
    println!(
        "  resumed machine is in {}",
        resumed.current_state_id().expect("current state")
    );

    println!("\n=== Example Complete ===");
}
