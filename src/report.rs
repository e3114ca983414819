//! Textual descriptions of a machine's declaration.
//!
//! [`StateMachine::describe`] flattens the declaration into plain data;
//! a [`StateMachineReport`] turns that into a document.

use crate::core::{EventId, HistoryType, StateId};
use crate::engine::state::{StateGraph, StateIndex};
use crate::engine::StateMachine;
use std::fmt::{Debug, Write};

/// One transition of a state.
#[derive(Clone, Debug)]
pub struct TransitionDescription<'a, S, E> {
    pub event: &'a E,
    pub guard: Option<&'a str>,
    /// `None` for internal transitions.
    pub target: Option<&'a S>,
    pub actions: Vec<&'a str>,
}

/// One state with everything declared on it.
#[derive(Clone, Debug)]
pub struct StateDescription<'a, S, E> {
    pub id: &'a S,
    pub super_state: Option<&'a S>,
    pub sub_states: Vec<&'a S>,
    pub initial_state: Option<&'a S>,
    pub history_type: HistoryType,
    pub level: usize,
    pub entry_actions: Vec<&'a str>,
    pub exit_actions: Vec<&'a str>,
    pub transitions: Vec<TransitionDescription<'a, S, E>>,
}

/// Declaration of a whole machine, states in declaration order.
#[derive(Clone, Debug)]
pub struct MachineDescription<'a, S, E> {
    pub name: &'a str,
    pub initial_state: Option<&'a S>,
    pub states: Vec<StateDescription<'a, S, E>>,
}

impl<'a, S: PartialEq, E> MachineDescription<'a, S, E> {
    pub fn state(&self, id: &S) -> Option<&StateDescription<'a, S, E>> {
        self.states.iter().find(|state| state.id == id)
    }

    /// States without a super state.
    pub fn roots(&self) -> impl Iterator<Item = &StateDescription<'a, S, E>> {
        self.states.iter().filter(|state| state.super_state.is_none())
    }
}

/// Renders a machine description.
pub trait StateMachineReport<S, E> {
    fn report(&self, machine: &MachineDescription<'_, S, E>) -> String;
}

/// Indented tree of states with their actions and transitions.
///
/// ```text
/// player: initial state = Off
///     On: initial state = Stopped, history type = Deep
///         off -> Off
///         Stopped:
///             play -> Playing
/// ```
#[derive(Clone, Debug)]
pub struct TextReport {
    indent: usize,
}

impl TextReport {
    pub fn new() -> Self {
        Self { indent: 4 }
    }

    /// Number of spaces per hierarchy level.
    pub fn with_indent(indent: usize) -> Self {
        Self { indent }
    }

    fn write_state<S: Debug + PartialEq, E: Debug>(
        &self,
        out: &mut String,
        machine: &MachineDescription<'_, S, E>,
        state: &StateDescription<'_, S, E>,
        depth: usize,
    ) {
        let pad = " ".repeat(self.indent * depth);
        let inner = " ".repeat(self.indent * (depth + 1));

        let _ = write!(out, "{pad}{:?}:", state.id);
        if let Some(initial) = state.initial_state {
            let _ = write!(out, " initial state = {initial:?}, history type = {}", state.history_type);
        }
        out.push('\n');

        for action in &state.entry_actions {
            let _ = writeln!(out, "{inner}entry action: {action}");
        }
        for action in &state.exit_actions {
            let _ = writeln!(out, "{inner}exit action: {action}");
        }
        for transition in &state.transitions {
            let _ = write!(out, "{inner}{:?} -> ", transition.event);
            match transition.target {
                Some(target) => {
                    let _ = write!(out, "{target:?}");
                }
                None => out.push_str("internal"),
            }
            if let Some(guard) = transition.guard {
                let _ = write!(out, " if {guard}");
            }
            if !transition.actions.is_empty() {
                let _ = write!(out, " execute {}", transition.actions.join(", "));
            }
            out.push('\n');
        }

        for sub_state in &state.sub_states {
            if let Some(sub_state) = machine.state(sub_state) {
                self.write_state(out, machine, sub_state, depth + 1);
            }
        }
    }
}

impl Default for TextReport {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Debug + PartialEq, E: Debug> StateMachineReport<S, E> for TextReport {
    fn report(&self, machine: &MachineDescription<'_, S, E>) -> String {
        let mut out = String::new();
        let _ = write!(out, "{}:", machine.name);
        if let Some(initial) = machine.initial_state {
            let _ = write!(out, " initial state = {initial:?}");
        }
        out.push('\n');

        for root in machine.roots() {
            self.write_state(&mut out, machine, root, 1);
        }
        out
    }
}

impl<S: StateId, E: EventId> StateMachine<S, E> {
    /// Flatten the declaration for reporting.
    pub fn describe(&self) -> MachineDescription<'_, S, E> {
        let graph = &self.graph;
        MachineDescription {
            name: &self.name,
            initial_state: self.initial_state.map(|index| graph.id(index)),
            states: graph
                .nodes()
                .map(|(index, _)| describe_state(graph, index))
                .collect(),
        }
    }

    /// Render the declaration with `report`.
    pub fn report(&self, report: &dyn StateMachineReport<S, E>) -> String {
        report.report(&self.describe())
    }
}

fn describe_state<S: StateId, E: EventId>(
    graph: &StateGraph<S, E>,
    index: StateIndex,
) -> StateDescription<'_, S, E> {
    let node = graph.node(index);
    let transitions = node
        .transitions
        .iter()
        .flat_map(|(event, candidates)| {
            candidates.iter().map(move |transition| TransitionDescription {
                event,
                guard: transition.guard.as_ref().map(|guard| guard.describe()),
                target: transition.target.map(|target| graph.id(target)),
                actions: transition
                    .actions
                    .iter()
                    .map(|action| action.describe())
                    .collect(),
            })
        })
        .collect();

    StateDescription {
        id: &node.id,
        super_state: node.super_state.map(|parent| graph.id(parent)),
        sub_states: node.sub_states.iter().map(|&sub| graph.id(sub)).collect(),
        initial_state: node.initial_state.map(|initial| graph.id(initial)),
        history_type: node.history_type,
        level: node.level,
        entry_actions: node.entry_actions.iter().map(|action| action.describe()).collect(),
        exit_actions: node.exit_actions.iter().map(|action| action.describe()).collect(),
        transitions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StateMachineBuilder;
    use crate::core::{Action, Guard};

    fn log_power() {}

    #[test]
    fn text_report_renders_the_hierarchy() {
        let mut builder = StateMachineBuilder::new("player");
        builder
            .define_hierarchy("On", "Stopped", HistoryType::Deep, ["Stopped", "Playing"])
            .unwrap();
        builder
            .in_state("On")
            .execute_on_entry(log_power)
            .on("off")
            .goto("Off")
            .unwrap();
        builder
            .in_state("Stopped")
            .on("play")
            .when(Guard::new(|| true).described_as("has_disc"))
            .goto("Playing")
            .map(|syntax| syntax.execute(Action::new(|| {}).described_as("spin_up")))
            .unwrap();
        builder.in_state("Playing").on("tick").execute(|| {}).unwrap();
        let mut machine = builder.build().unwrap();
        machine.initialize("Off").unwrap();

        let report = machine.report(&TextReport::new());

        let expected = "\
player: initial state = \"Off\"
    \"On\": initial state = \"Stopped\", history type = Deep
        entry action: log_power
        \"off\" -> \"Off\"
        \"Stopped\":
            \"play\" -> \"Playing\" if has_disc execute spin_up
        \"Playing\":
            \"tick\" -> internal execute anonymous
    \"Off\":
";
        assert_eq!(report, expected);
    }

    #[test]
    fn description_exposes_levels_and_parents() {
        let mut builder: StateMachineBuilder<&str, &str> = StateMachineBuilder::new("test");
        builder
            .define_hierarchy("A", "A1", HistoryType::None, ["A1"])
            .unwrap();
        let machine = builder.build().unwrap();

        let description = machine.describe();
        let a1 = description.state(&"A1").unwrap();

        assert_eq!(a1.level, 2);
        assert_eq!(a1.super_state, Some(&"A"));
        assert_eq!(description.roots().count(), 1);
    }
}
