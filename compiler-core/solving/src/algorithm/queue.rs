use std::collections::VecDeque;
use std::sync::Arc;

use crate::algorithm::constraint::Constraint;

/// The order in which constraints are drained.
///
/// Constraints that merge points run before constraints that pin concrete
/// types, instantiation runs before bound resolution, and defaults run last
/// so they only fill slots nothing else determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Group,
    Type,
    Instantiate,
    Bound,
    Default,
}

impl Stage {
    pub const ALL: [Stage; 5] =
        [Stage::Group, Stage::Type, Stage::Instantiate, Stage::Bound, Stage::Default];
}

/// Constraints waiting to run, one FIFO per [`Stage`].
///
/// Each stage is shared between clones until one of them changes it, so a
/// fork that only touches the early stages leaves the rest shared.
#[derive(Debug, Clone, Default)]
pub struct ConstraintQueue {
    stages: [Arc<VecDeque<Constraint>>; 5],
}

impl ConstraintQueue {
    pub fn push(&mut self, constraint: Constraint) {
        let stage = constraint.stage();
        Arc::make_mut(&mut self.stages[stage as usize]).push_back(constraint);
    }

    /// Takes the oldest constraint of the earliest non-empty stage.
    pub fn pop(&mut self) -> Option<Constraint> {
        self.pop_before(None)
    }

    /// Like [`ConstraintQueue::pop`], but leaves `limit` and later stages untouched.
    pub fn pop_before(&mut self, limit: Option<Stage>) -> Option<Constraint> {
        let stage = Stage::ALL
            .into_iter()
            .take_while(|&stage| limit.is_none_or(|limit| stage < limit))
            .find(|&stage| !self.stages[stage as usize].is_empty())?;
        Arc::make_mut(&mut self.stages[stage as usize]).pop_front()
    }

    pub fn len(&self) -> usize {
        self.stages.iter().map(|stage| stage.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.iter().all(|stage| stage.is_empty())
    }
}

impl Extend<Constraint> for ConstraintQueue {
    fn extend<T: IntoIterator<Item = Constraint>>(&mut self, iter: T) {
        iter.into_iter().for_each(|constraint| self.push(constraint));
    }
}
