//! FIFO queue of pending events with head insertion for priority events.

use crate::core::Argument;
use std::collections::VecDeque;

/// An event waiting to be fired.
#[derive(Debug)]
pub struct QueuedEvent<E> {
    pub event: E,
    pub argument: Argument,
}

/// Pending events in processing order.
#[derive(Debug)]
pub struct EventQueue<E> {
    events: VecDeque<QueuedEvent<E>>,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }

    /// Queue behind all pending events.
    pub fn push_back(&mut self, event: E, argument: Argument) {
        self.events.push_back(QueuedEvent { event, argument });
    }

    /// Queue ahead of all pending events.
    pub fn push_front(&mut self, event: E, argument: Argument) {
        self.events.push_front(QueuedEvent { event, argument });
    }

    pub fn pop(&mut self) -> Option<QueuedEvent<E>> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(queue: &mut EventQueue<&'static str>) -> Vec<&'static str> {
        std::iter::from_fn(|| queue.pop().map(|queued| queued.event)).collect()
    }

    #[test]
    fn priority_events_jump_ahead_of_pending_events() {
        let mut queue = EventQueue::new();
        queue.push_back("B", Argument::none());
        queue.push_back("C", Argument::none());
        queue.push_front("D", Argument::none());

        assert_eq!(queue.len(), 3);
        assert_eq!(drain(&mut queue), vec!["D", "B", "C"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn later_priority_events_run_first() {
        let mut queue = EventQueue::new();
        queue.push_front("P1", Argument::none());
        queue.push_front("P2", Argument::none());

        assert_eq!(drain(&mut queue), vec!["P2", "P1"]);
    }

    #[test]
    fn arguments_travel_with_their_event() {
        let mut queue = EventQueue::new();
        queue.push_back("move", Argument::new(3i32));

        let queued = queue.pop().unwrap();
        assert_eq!(queued.argument.downcast_ref::<i32>(), Some(&3));
    }
}
