//! Per-state mapping from events to candidate transitions.

use super::state::StateIndex;
use super::transition::Transition;
use crate::builder::BuildError;
use crate::core::{Action, EventId, StateId};

/// Event to ordered candidate transitions.
///
/// Candidates are kept in declaration order. A guard-less transition is a
/// catch-all and must be the last and only guard-less candidate of its event.
pub(crate) struct TransitionDictionary<E> {
    entries: Vec<(E, Vec<Transition>)>,
}

impl<E: EventId> TransitionDictionary<E> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `transition` for `event` with `source` as its declaring state.
    ///
    /// Returns the position of the transition among the event's candidates.
    pub(crate) fn add<S: StateId>(
        &mut self,
        event: E,
        mut transition: Transition,
        source: StateIndex,
        state_id: &S,
    ) -> Result<usize, BuildError> {
        if transition.source.is_some() {
            return Err(BuildError::TransitionAlreadyAdded {
                state: format!("{state_id:?}"),
                event: format!("{event:?}"),
            });
        }

        let position = match self.entries.iter().position(|(known, _)| *known == event) {
            Some(position) => position,
            None => {
                self.entries.push((event.clone(), Vec::new()));
                self.entries.len() - 1
            }
        };
        let candidates = &mut self.entries[position].1;

        if candidates.iter().any(|existing| existing.guard.is_none()) {
            return Err(if transition.guard.is_none() {
                BuildError::MultipleTransitionsWithoutGuard {
                    state: format!("{state_id:?}"),
                    event: format!("{event:?}"),
                }
            } else {
                BuildError::TransitionWithoutGuardHasToBeLast {
                    state: format!("{state_id:?}"),
                    event: format!("{event:?}"),
                }
            });
        }

        transition.source = Some(source);
        candidates.push(transition);
        Ok(candidates.len() - 1)
    }

    /// Append an action to an already registered transition.
    pub(crate) fn add_action(&mut self, event: &E, position: usize, action: Action) {
        if let Some(transition) = self
            .entries
            .iter_mut()
            .find(|(known, _)| known == event)
            .and_then(|(_, candidates)| candidates.get_mut(position))
        {
            transition.actions.push(action);
        }
    }

    pub(crate) fn get(&self, event: &E) -> Option<&[Transition]> {
        self.entries
            .iter()
            .find(|(known, _)| known == event)
            .map(|(_, candidates)| candidates.as_slice())
    }

    /// All events with their candidates, in declaration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&E, &[Transition])> {
        self.entries
            .iter()
            .map(|(event, candidates)| (event, candidates.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Guard;

    fn guarded() -> Transition {
        Transition::new(None, Some(Guard::new(|| true)))
    }

    fn unguarded() -> Transition {
        Transition::new(None, None)
    }

    #[test]
    fn candidates_keep_declaration_order() {
        let mut dictionary = TransitionDictionary::new();
        let source = StateIndex(0);

        assert_eq!(dictionary.add("go", guarded(), source, &"A"), Ok(0));
        assert_eq!(dictionary.add("go", guarded(), source, &"A"), Ok(1));
        assert_eq!(dictionary.add("go", unguarded(), source, &"A"), Ok(2));
        assert_eq!(dictionary.add("stop", unguarded(), source, &"A"), Ok(0));

        let candidates = dictionary.get(&"go").unwrap();
        assert_eq!(candidates.len(), 3);
        assert!(candidates.iter().all(|t| t.source == Some(source)));
        assert!(dictionary.get(&"other").is_none());
    }

    #[test]
    fn only_one_guardless_transition_per_event() {
        let mut dictionary = TransitionDictionary::new();
        dictionary.add("go", unguarded(), StateIndex(0), &"A").unwrap();

        let result = dictionary.add("go", unguarded(), StateIndex(0), &"A");

        assert!(matches!(
            result,
            Err(BuildError::MultipleTransitionsWithoutGuard { .. })
        ));
    }

    #[test]
    fn guardless_transition_has_to_be_last() {
        let mut dictionary = TransitionDictionary::new();
        dictionary.add("go", unguarded(), StateIndex(0), &"A").unwrap();

        let result = dictionary.add("go", guarded(), StateIndex(0), &"A");

        assert!(matches!(
            result,
            Err(BuildError::TransitionWithoutGuardHasToBeLast { .. })
        ));
    }

    #[test]
    fn source_is_set_once() {
        let mut dictionary = TransitionDictionary::new();
        let mut transition = unguarded();
        transition.source = Some(StateIndex(3));

        let result = dictionary.add("go", transition, StateIndex(0), &"A");

        assert!(matches!(result, Err(BuildError::TransitionAlreadyAdded { .. })));
    }

    #[test]
    fn actions_are_appended_to_the_addressed_transition() {
        let mut dictionary = TransitionDictionary::new();
        dictionary.add("go", guarded(), StateIndex(0), &"A").unwrap();
        let position = dictionary.add("go", unguarded(), StateIndex(0), &"A").unwrap();

        dictionary.add_action(&"go", position, Action::new(|| {}));
        dictionary.add_action(&"go", position, Action::new(|| {}));

        let candidates = dictionary.get(&"go").unwrap();
        assert!(candidates[0].actions.is_empty());
        assert_eq!(candidates[1].actions.len(), 2);
    }
}
