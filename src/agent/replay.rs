use std::collections::VecDeque;

use super::ReplayStorage;
use crate::sim::record::{Outcome, Transition};

/// Bounded FIFO of transitions. The oldest transition is dropped once the
/// buffer is full.
#[derive(Debug, Clone)]
pub struct TransitionBuffer {
    capacity: usize,
    items: VecDeque<Transition>,
    episodes: usize,
}

impl TransitionBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, items: VecDeque::with_capacity(capacity.min(4096)), episodes: 0 }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Training episodes that have finished since construction.
    pub fn episodes(&self) -> usize {
        self.episodes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.items.iter()
    }

    /// Transitions whose episode ended with `outcome` on that transition.
    pub fn with_outcome(&self, outcome: Outcome) -> impl Iterator<Item = &Transition> {
        self.items.iter().filter(move |t| t.outcome == outcome)
    }
}

impl ReplayStorage for TransitionBuffer {
    fn push(&mut self, transition: Transition) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(transition);
    }

    fn finish_episode(&mut self) {
        self.episodes += 1;
        log::debug!("replay buffer holds {} transitions after {} episodes", self.items.len(), self.episodes);
    }
}
