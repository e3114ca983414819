//! Property-based tests over randomly shaped hierarchies.
//!
//! States are `u8` indices into a random forest; event `t` always means
//! "go to state `t`" and is declared on every state.

use hsm_engine::builder::StateMachineBuilder;
use hsm_engine::core::HistoryType;
use hsm_engine::engine::StateMachine;
use proptest::prelude::*;
use proptest::sample::Index;
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

/// Parent of every node; nodes 0 and 1 are always roots.
#[derive(Clone, Debug)]
struct Forest {
    parents: Vec<Option<usize>>,
}

impl Forest {
    fn len(&self) -> usize {
        self.parents.len()
    }

    fn children(&self, node: usize) -> Vec<usize> {
        (0..self.len())
            .filter(|&child| self.parents[child] == Some(node))
            .collect()
    }

    /// Root first, `node` last.
    fn path(&self, node: usize) -> Vec<usize> {
        let mut path = vec![node];
        let mut current = node;
        while let Some(parent) = self.parents[current] {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Initial sub states below `node`, down to a leaf.
    fn initial_chain(&self, node: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut current = node;
        while let Some(&first) = self.children(current).first() {
            chain.push(first);
            current = first;
        }
        chain
    }

    fn initial_leaf(&self, node: usize) -> usize {
        self.initial_chain(node).last().copied().unwrap_or(node)
    }
}

prop_compose! {
    fn arbitrary_forest()(
        len in 2usize..9,
        picks in prop::collection::vec(any::<Index>(), 9),
    ) -> Forest {
        let parents = (0..len)
            .map(|node| {
                if node < 2 {
                    return None;
                }
                let pick = picks[node].index(node + 1);
                (pick < node).then_some(pick)
            })
            .collect();
        Forest { parents }
    }
}

fn build(forest: &Forest, history_type: HistoryType, log: &Log) -> StateMachine<u8, u8> {
    let mut builder = StateMachineBuilder::new("forest");
    for node in 0..forest.len() {
        let state = node as u8;
        let on_entry = Arc::clone(log);
        let on_exit = Arc::clone(log);
        builder
            .in_state(state)
            .execute_on_entry(move || on_entry.lock().unwrap().push(format!("enter {state}")))
            .execute_on_exit(move || on_exit.lock().unwrap().push(format!("exit {state}")));
        for target in 0..forest.len() {
            builder
                .in_state(state)
                .on(target as u8)
                .goto(target as u8)
                .unwrap();
        }
    }
    for node in 0..forest.len() {
        let children = forest.children(node);
        if let Some(&initial) = children.first() {
            builder
                .define_hierarchy(
                    node as u8,
                    initial as u8,
                    history_type,
                    children.iter().map(|&child| child as u8),
                )
                .unwrap();
        }
    }
    builder.build().unwrap()
}

fn entries(states: impl IntoIterator<Item = usize>) -> Vec<String> {
    states.into_iter().map(|state| format!("enter {state}")).collect()
}

fn exits(states: impl IntoIterator<Item = usize>) -> Vec<String> {
    states.into_iter().map(|state| format!("exit {state}")).collect()
}

proptest! {
    #[test]
    fn levels_count_ancestors(forest in arbitrary_forest()) {
        let log = Log::default();
        let machine = build(&forest, HistoryType::None, &log);
        let description = machine.describe();

        for node in 0..forest.len() {
            let state = description.state(&(node as u8)).unwrap();
            prop_assert_eq!(state.level, forest.path(node).len());
            prop_assert_eq!(state.super_state.copied(), forest.parents[node].map(|p| p as u8));
        }
        let roots = forest.parents.iter().filter(|parent| parent.is_none()).count();
        prop_assert_eq!(description.roots().count(), roots);
    }

    #[test]
    fn initial_entry_runs_root_to_leaf(forest in arbitrary_forest(), pick in any::<Index>()) {
        let log = Log::default();
        let mut machine = build(&forest, HistoryType::None, &log);
        let initial = pick.index(forest.len());

        machine.initialize(initial as u8).unwrap();
        machine.enter_initial_state().unwrap();

        let mut expected = forest.path(initial);
        expected.extend(forest.initial_chain(initial));
        prop_assert_eq!(log.lock().unwrap().clone(), entries(expected));
        prop_assert_eq!(
            *machine.current_state_id().unwrap(),
            forest.initial_leaf(initial) as u8
        );
    }

    #[test]
    fn transitions_exit_up_and_enter_down(
        forest in arbitrary_forest(),
        start in any::<Index>(),
        target in any::<Index>(),
    ) {
        let log = Log::default();
        let mut machine = build(&forest, HistoryType::None, &log);
        let leaf = forest.initial_leaf(start.index(forest.len()));
        let target = target.index(forest.len());
        machine.initialize(leaf as u8).unwrap();
        machine.enter_initial_state().unwrap();
        log.lock().unwrap().clear();

        machine.fire(target as u8).unwrap();

        let from = forest.path(leaf);
        let to = forest.path(target);
        let mut expected = match from.iter().position(|&state| state == target) {
            Some(position) => {
                let mut expected = exits(from[position..].iter().rev().copied());
                expected.extend(entries([target]));
                expected
            }
            None => {
                let common = from
                    .iter()
                    .zip(&to)
                    .take_while(|(left, right)| left == right)
                    .count();
                let mut expected = exits(from[common..].iter().rev().copied());
                expected.extend(entries(to[common..].iter().copied()));
                expected
            }
        };
        expected.extend(entries(forest.initial_chain(target)));

        prop_assert_eq!(log.lock().unwrap().clone(), expected);
        prop_assert_eq!(
            *machine.current_state_id().unwrap(),
            forest.initial_leaf(target) as u8
        );
    }

    #[test]
    fn deep_history_returns_to_the_last_leaf(
        forest in arbitrary_forest(),
        start in any::<Index>(),
    ) {
        let log = Log::default();
        let mut machine = build(&forest, HistoryType::Deep, &log);
        let descendants: Vec<usize> = (0..forest.len())
            .filter(|&node| forest.path(node)[0] == 0)
            .collect();
        let leaf = forest.initial_leaf(*start.get(&descendants));
        machine.initialize(leaf as u8).unwrap();
        machine.enter_initial_state().unwrap();

        machine.fire(1).unwrap();
        machine.fire(0).unwrap();

        prop_assert_eq!(*machine.current_state_id().unwrap(), leaf as u8);
    }
}
