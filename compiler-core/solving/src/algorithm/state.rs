//! Implements the solver's core state structures.

use std::sync::Arc;

use points::{PointId, Points};

use crate::Program;
use crate::algorithm::equivalence::{DeferredId, Equivalence};
use crate::algorithm::queue::{ConstraintQueue, Stage};
use crate::core::{Bound, Instance};

/// The external collaborators that the solver reads from.
pub struct SolveContext<'a> {
    pub points: &'a mut Points,
    pub program: &'a Program,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Resolved { instance: PointId, error: bool },
    Unresolved,
}

/// The result of running a bound, pending normalisation of its substitutions.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub bound: Bound,
    pub deferred: DeferredId,
    pub outcome: Outcome,
}

/// The mutable state of one solving session.
///
/// Cloning produces an independent branch; see [`SolveState::fork`].
#[derive(Debug, Clone, Default)]
pub struct SolveState {
    pub equivalence: Equivalence,
    pub queue: ConstraintQueue,
    /// Instances assumed to hold in this session, such as `where` clauses.
    pub implied: Arc<[Instance]>,
    pub resolutions: Arc<Vec<Resolution>>,
}

impl SolveState {
    pub fn new(implied: Arc<[Instance]>) -> SolveState {
        SolveState { implied, ..SolveState::default() }
    }

    /// Creates a speculative branch whose error flag reports only its own failures.
    ///
    /// Every table is shared with the live state until the branch writes to it.
    pub fn fork(&self) -> SolveState {
        SolveState {
            equivalence: self.equivalence.fork(),
            queue: self.queue.clone(),
            implied: Arc::clone(&self.implied),
            resolutions: Arc::clone(&self.resolutions),
        }
    }

    /// Replaces the live state with a speculative branch.
    pub fn commit(&mut self, fork: SolveState) {
        let SolveState { equivalence, queue, implied, resolutions } = fork;
        self.equivalence.commit(equivalence);
        self.queue = queue;
        self.implied = implied;
        self.resolutions = resolutions;
    }

    /// Drains the queue to exhaustion.
    pub fn run(&mut self, context: &mut SolveContext<'_>) {
        self.run_before(context, None);
    }

    /// Drains every stage that comes before `limit`.
    pub fn run_before(&mut self, context: &mut SolveContext<'_>, limit: Option<Stage>) {
        while let Some(constraint) = self.queue.pop_before(limit) {
            tracing::trace!(stage = ?constraint.stage(), remaining = self.queue.len(), "run");
            constraint.run(self, context);
        }
    }
}
